use std::collections::BTreeMap;
use std::path::Path;

/// Search-path separator for the current platform.
pub const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Name of the search-path variable.
pub const PATH_VAR: &str = "PATH";

/// Explicit process environment threaded through the resolution pipeline.
///
/// Replaces ambient `std::env` mutation: stages read from this value, and
/// only two write sites exist: wholesale replacement by lifecycle capture
/// and search-path prefixing by the path resolver and the installer.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Snapshot of the ambient process environment.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    #[must_use]
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Replaces the whole environment. Write site for lifecycle capture.
    pub fn replace_all(&mut self, vars: BTreeMap<String, String>) {
        self.vars = vars;
    }

    /// Prepends `dir` to the search path. Write site for the project-local
    /// prefix and, later, the private install prefix; the later call wins
    /// for subsequent lookups.
    pub fn prepend_path(&mut self, dir: &Path) {
        let dir = dir.display().to_string();
        let value = match self.vars.get(PATH_VAR) {
            Some(rest) if !rest.is_empty() => format!("{dir}{PATH_SEPARATOR}{rest}"),
            _ => dir,
        };
        self.vars.insert(PATH_VAR.to_string(), value);
    }

    #[must_use]
    pub fn search_path(&self) -> Option<&str> {
        self.get(PATH_VAR)
    }

    /// Pairs suitable for `Command::envs` after `env_clear`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
