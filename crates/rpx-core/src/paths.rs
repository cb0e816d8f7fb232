//! Project-local binary directory discovery and search-path lookup.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rpx_domain::{Environment, InvocationRequest};

use crate::outcome::{ResolvedPath, RpxError};

/// Directory that would hold project-local executables for the project
/// enclosing `cwd`: `<root>/node_modules/.bin` for the nearest ancestor
/// carrying a `package.json` or a `node_modules` directory. Nothing is
/// verified to live there yet.
pub async fn local_bin_dir(cwd: &Path) -> Option<PathBuf> {
    let mut dir = Some(cwd);
    while let Some(current) = dir {
        let has_manifest = tokio::fs::try_exists(current.join("package.json"))
            .await
            .unwrap_or(false);
        let has_modules = tokio::fs::try_exists(current.join("node_modules"))
            .await
            .unwrap_or(false);
        if has_manifest || has_modules {
            return Some(current.join("node_modules").join(".bin"));
        }
        dir = current.parent();
    }
    None
}

/// Resolves the requested command against what already exists.
///
/// Explicitly local commands resolve to themselves. A version pin, an
/// explicit package request, or `ignore_existing` all report `None`
/// immediately so the installer runs. Otherwise the search path decides; a
/// miss is an ordinary `None` unless fallback installation was disabled, in
/// which case it escalates as a 127 not-found failure.
pub async fn existing_path(
    request: &InvocationRequest,
    env: &Environment,
    local_bin: Option<&Path>,
) -> Result<ResolvedPath, RpxError> {
    let Some(command) = request.command.as_deref() else {
        return Ok(ResolvedPath::None);
    };
    if request.is_local {
        return Ok(ResolvedPath::ProjectLocal(PathBuf::from(command)));
    }
    if request.cmd_had_version || request.package_requested || request.ignore_existing {
        return Ok(ResolvedPath::None);
    }

    let search_path = env.search_path().unwrap_or_default();
    match which::which_in(command, Some(search_path), &request.cwd) {
        Ok(path) => {
            tracing::debug!(command, path = %path.display(), "command already resolvable");
            if local_bin.is_some_and(|bin| path.starts_with(bin)) {
                Ok(ResolvedPath::ProjectLocal(path))
            } else {
                Ok(ResolvedPath::OnSearchPath(path))
            }
        }
        Err(which::Error::CannotFindBinaryPath) if request.install => Ok(ResolvedPath::None),
        Err(which::Error::CannotFindBinaryPath) => Err(RpxError::not_found(command)),
        Err(err) => Err(RpxError::Unexpected(
            anyhow::Error::new(err).context(format!("search-path lookup of {command} failed")),
        )),
    }
}

/// Canonical current working directory for a fresh request.
pub fn current_dir() -> Result<PathBuf, RpxError> {
    std::env::current_dir()
        .context("working directory is not accessible")
        .map_err(RpxError::Unexpected)
}
