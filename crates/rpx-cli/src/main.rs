#![deny(clippy::all, warnings)]

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use rpx_core::{ExitOutcome, RpxError};
use rpx_domain::{parse_specifier, Environment, InvocationRequest};

/// Runs a package's binary without a permanent install: resolves the
/// command against the project and the search path, installs it into a
/// private per-invocation prefix when nothing satisfies it, and propagates
/// the command's exit status.
#[derive(Debug, Parser)]
#[command(name = "rpx", version, about)]
struct RpxCli {
    /// Command to resolve and run; may carry a version (`name@range`).
    command: String,

    /// Arguments forwarded verbatim to the resolved command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    /// Package(s) to install if the command is not already available.
    #[arg(short, long = "package")]
    package: Vec<String>,

    /// Fail with exit code 127 instead of installing on demand.
    #[arg(long = "no-install", action = clap::ArgAction::SetTrue)]
    no_install: bool,

    /// Skip binaries already on the search path or in the project.
    #[arg(long)]
    ignore_existing: bool,

    /// Treat the command as a local file path, not a name to look up.
    #[arg(long)]
    local: bool,

    /// Never take over the current process; always spawn a child.
    #[arg(long)]
    always_spawn: bool,

    /// Suppress diagnostics and the install summary note.
    #[arg(short, long)]
    quiet: bool,

    /// Package-manager invocation path.
    #[arg(long, env = "RPX_NPM")]
    npm: Option<String>,

    /// User config file forwarded to the install.
    #[arg(long)]
    userconfig: Option<PathBuf>,

    /// Cache/staging directory for the private install prefix.
    #[arg(long, env = "RPX_CACHE")]
    cache: Option<PathBuf>,

    /// Run with the package manager's resolved lifecycle environment.
    #[arg(long)]
    npm_env: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Enable trace-level logging.
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = RpxCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let quiet = cli.quiet;
    let request = build_request(cli)?;
    let env = Environment::capture();

    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(rpx_core::run(&request, env)) {
        Ok(ExitOutcome::Success) => Ok(()),
        Ok(ExitOutcome::Operational { code }) => {
            // The resolved command's own result; no extra diagnostics.
            std::process::exit(code);
        }
        Err(err) => {
            if !quiet {
                eprintln!("rpx: {err}");
            }
            std::process::exit(err.exit_code());
        }
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("rpx_core={level},rpx_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn build_request(cli: RpxCli) -> Result<InvocationRequest, RpxError> {
    let cwd = rpx_core::paths::current_dir()?;
    let parsed = parse_specifier(&cli.command);

    let mut request = InvocationRequest::new(cwd);
    request.package_requested = !cli.package.is_empty();
    request.cmd_had_version = !request.package_requested && parsed.had_version;
    request.packages = if cli.package.is_empty() {
        vec![cli.command.clone()]
    } else {
        cli.package
    };
    request.command = Some(if cli.local {
        cli.command
    } else {
        parsed.name
    });
    request.install = !cli.no_install;
    request.ignore_existing = cli.ignore_existing;
    request.is_local = cli.local;
    request.always_spawn = cli.always_spawn;
    request.quiet = cli.quiet;
    request.npm = cli.npm;
    request.userconfig = cli.userconfig;
    request.npm_env = cli.npm_env;
    request.cache = cli.cache;
    request.cmd_opts = cli.args;
    Ok(request)
}
