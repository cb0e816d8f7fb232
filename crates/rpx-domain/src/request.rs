use std::path::PathBuf;

/// Immutable description of one rpx invocation.
///
/// Built once by the caller and passed by reference through the whole
/// resolution pipeline; no stage mutates it. Mutable invocation state lives
/// in [`crate::Environment`] instead.
#[derive(Clone, Debug)]
pub struct InvocationRequest {
    /// Command name to resolve and run, if any.
    pub command: Option<String>,
    /// Package specifiers to install when nothing satisfies the command.
    pub packages: Vec<String>,
    /// Whether falling back to installation is allowed. When false, a
    /// search-path miss escalates with exit code 127.
    pub install: bool,
    /// Skip anything already on the search path or in the project.
    pub ignore_existing: bool,
    /// The caller named packages explicitly (`--package`).
    pub package_requested: bool,
    /// The command specifier carried a version pin (`name@range`).
    pub cmd_had_version: bool,
    /// The command is an explicitly local path, not a name to look up.
    pub is_local: bool,
    /// Never take over the current process; always spawn a child.
    pub always_spawn: bool,
    /// Suppress diagnostics and the install summary note.
    pub quiet: bool,
    /// Custom package-manager invocation path (defaults to `npm`).
    pub npm: Option<String>,
    /// Custom user config file forwarded to the install.
    pub userconfig: Option<PathBuf>,
    /// Capture the package manager's resolved lifecycle environment.
    pub npm_env: bool,
    /// Custom cache/staging directory for the private install prefix.
    pub cache: Option<PathBuf>,
    /// Arguments forwarded verbatim to the resolved command.
    pub cmd_opts: Vec<String>,
    /// Working directory the invocation resolves against.
    pub cwd: PathBuf,
}

impl InvocationRequest {
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            command: None,
            packages: Vec::new(),
            install: true,
            ignore_existing: false,
            package_requested: false,
            cmd_had_version: false,
            is_local: false,
            always_spawn: false,
            quiet: false,
            npm: None,
            userconfig: None,
            npm_env: false,
            cache: None,
            cmd_opts: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// The package-manager program to invoke.
    #[must_use]
    pub fn npm_program(&self) -> String {
        self.npm.clone().unwrap_or_else(|| {
            if cfg!(windows) {
                "npm.cmd".to_string()
            } else {
                "npm".to_string()
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedSpecifier {
    /// Bare command name (scope and version range stripped).
    pub name: String,
    /// Whether the specifier pinned a version.
    pub had_version: bool,
}

/// Splits a package specifier into the command name it implies and whether
/// it carried a version pin. Handles scoped specifiers (`@scope/name@range`).
#[must_use]
pub fn parse_specifier(spec: &str) -> ParsedSpecifier {
    let rest = match spec.strip_prefix('@') {
        Some(stripped) => stripped.split_once('/').map_or(spec, |(_, rest)| rest),
        None => spec,
    };
    match rest.split_once('@') {
        Some((name, range)) if !name.is_empty() && !range.is_empty() => ParsedSpecifier {
            name: name.to_string(),
            had_version: true,
        },
        _ => ParsedSpecifier {
            name: rest.to_string(),
            had_version: false,
        },
    }
}
