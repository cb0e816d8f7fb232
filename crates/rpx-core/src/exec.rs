//! Runs the resolved target: in-process takeover or child spawn.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use rpx_domain::{Environment, InvocationRequest};
use tokio::process::Command;

use crate::outcome::{ExecutionTarget, ExitOutcome, RpxError};

/// How the resolved target will be executed. Decided purely from the
/// classification and the request so both branches are testable without
/// replacing the running process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Replace the current process with the runtime loading `script`.
    /// Performance optimization only; observable behavior must match the
    /// spawn branch (same arguments, working directory, environment).
    Takeover { script: PathBuf },
    /// Spawn a child for the resolved path, or the literal requested
    /// command for pure search-path passthrough.
    Spawn { program: OsString },
    /// Nothing resolved and nothing was requested.
    Nothing,
}

/// Chooses the strategy. Takeover requires a loadable target, no forced
/// spawn, and a target distinct from the entry point currently running.
#[must_use]
pub fn decide_strategy(
    target: Option<&ExecutionTarget>,
    request: &InvocationRequest,
    current_entry: Option<&Path>,
) -> ExecutionStrategy {
    match target {
        Some(target) => {
            let takeover = target.loadable
                && !request.always_spawn
                && current_entry != Some(target.path.as_path());
            if takeover {
                ExecutionStrategy::Takeover {
                    script: target.path.clone(),
                }
            } else {
                ExecutionStrategy::Spawn {
                    program: target.path.clone().into_os_string(),
                }
            }
        }
        None => match &request.command {
            Some(command) => ExecutionStrategy::Spawn {
                program: OsString::from(command),
            },
            None => ExecutionStrategy::Nothing,
        },
    }
}

/// Executes the chosen strategy and maps the child's exit status onto this
/// invocation's outcome.
pub async fn execute(
    strategy: ExecutionStrategy,
    request: &InvocationRequest,
    env: &Environment,
) -> Result<ExitOutcome, RpxError> {
    match strategy {
        ExecutionStrategy::Nothing => Ok(ExitOutcome::Success),
        ExecutionStrategy::Takeover { script } => takeover(&script, request, env).await,
        ExecutionStrategy::Spawn { program } => spawn(&program, request, env).await,
    }
}

#[cfg(unix)]
async fn takeover(
    script: &Path,
    request: &InvocationRequest,
    env: &Environment,
) -> Result<ExitOutcome, RpxError> {
    use std::os::unix::process::CommandExt;

    tracing::debug!(script = %script.display(), "taking over process");
    let mut command = std::process::Command::new("node");
    command
        .arg(script)
        .args(&request.cmd_opts)
        .env_clear()
        .envs(env.iter())
        .current_dir(&request.cwd);
    // exec only returns on failure.
    let err = command.exec();
    Err(RpxError::Unexpected(anyhow::Error::new(err).context(
        format!("replacing process with node {}", script.display()),
    )))
}

#[cfg(not(unix))]
async fn takeover(
    script: &Path,
    request: &InvocationRequest,
    env: &Environment,
) -> Result<ExitOutcome, RpxError> {
    // No exec-style replacement; degrade to spawning the runtime.
    let mut command = Command::new("node");
    command.arg(script).args(&request.cmd_opts);
    spawn_with(&mut command, request, env, &OsString::from("node")).await
}

async fn spawn(
    program: &OsString,
    request: &InvocationRequest,
    env: &Environment,
) -> Result<ExitOutcome, RpxError> {
    let mut command = Command::new(program);
    command.args(&request.cmd_opts);
    spawn_with(&mut command, request, env, program).await
}

async fn spawn_with(
    command: &mut Command,
    request: &InvocationRequest,
    env: &Environment,
    program: &OsString,
) -> Result<ExitOutcome, RpxError> {
    command
        .env_clear()
        .envs(env.iter())
        .current_dir(&request.cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit());
    if request.quiet {
        command.stderr(Stdio::null());
    } else {
        command.stderr(Stdio::inherit());
    }

    let name = program.to_string_lossy().into_owned();
    let status = match command.status().await {
        Ok(status) => status,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(RpxError::not_found(name));
        }
        Err(err) => {
            return Err(RpxError::Unexpected(
                anyhow::Error::new(err).context(format!("failed to spawn {name}")),
            ));
        }
    };

    let code = status.code().unwrap_or_else(|| exit_code_for_signal(&status));
    tracing::debug!(program = %name, code, "child finished");
    Ok(ExitOutcome::from_code(code))
}

#[cfg(unix)]
fn exit_code_for_signal(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or(1, |signal| 128 + signal)
}

#[cfg(not(unix))]
fn exit_code_for_signal(_status: &std::process::ExitStatus) -> i32 {
    1
}
