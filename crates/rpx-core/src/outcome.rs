use std::path::{Path, PathBuf};

/// Exit code used for "command not found", matching shell convention.
pub const NOT_FOUND_EXIT_CODE: i32 = 127;

/// A found filesystem location for a command, tagged with provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedPath {
    /// Nothing satisfies the command yet.
    None,
    /// Already resolvable through the ambient search path.
    OnSearchPath(PathBuf),
    /// The project's own binary, or an explicitly local target.
    ProjectLocal(PathBuf),
    /// Produced by the just-completed install.
    Installed(PathBuf),
}

impl ResolvedPath {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolvedPath::None => None,
            ResolvedPath::OnSearchPath(path)
            | ResolvedPath::ProjectLocal(path)
            | ResolvedPath::Installed(path) => Some(path),
        }
    }

    /// Provenances that short-circuit the installer.
    #[must_use]
    pub fn satisfies(&self) -> bool {
        !matches!(self, ResolvedPath::None)
    }
}

/// Result of the package-manager install operation.
#[derive(Clone, Debug)]
pub struct InstallOutcome {
    /// Private installation root, unique per process identity.
    pub prefix: PathBuf,
    /// Directory holding the freshly installed binaries.
    pub bin_dir: PathBuf,
    /// Summary counts parsed tolerantly from the structured output.
    /// Presentation only; never drives decision logic.
    pub added: Option<u64>,
    pub updated: Option<u64>,
}

/// Final classification of what to execute and how it may be executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionTarget {
    pub path: PathBuf,
    /// Whether the target can be loaded by the runtime in-process, which
    /// permits taking over the current process instead of spawning.
    pub loadable: bool,
    /// Whether classification went through a directory-style package.
    pub is_package_dir: bool,
}

/// Terminal result of an invocation that ran (or deliberately ran nothing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// The resolved command itself exited non-zero. Expected, not a defect
    /// of this system; surfaced as our exit code with no extra diagnostics.
    Operational { code: i32 },
}

impl ExitOutcome {
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            ExitOutcome::Success
        } else {
            ExitOutcome::Operational { code }
        }
    }

    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Operational { code } => code,
        }
    }
}

/// Failure kinds of the resolution pipeline itself.
#[derive(Debug, thiserror::Error)]
pub enum RpxError {
    #[error("command not found: {command}")]
    NotFound { command: String },
    #[error("install of {} failed with exit code {code}", specs.join(", "))]
    InstallFailure { specs: Vec<String>, code: i32 },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl RpxError {
    pub(crate) fn not_found(command: impl Into<String>) -> Self {
        RpxError::NotFound {
            command: command.into(),
        }
    }

    /// Exit code this failure maps to when it escalates.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            RpxError::NotFound { .. } => NOT_FOUND_EXIT_CODE,
            RpxError::InstallFailure { code, .. } => *code,
            RpxError::Unexpected(_) => 1,
        }
    }
}
