//! On-demand installation into a private, invocation-scoped prefix.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rpx_domain::{Environment, InvocationRequest};
use serde_json::Value;

use crate::npm;
use crate::outcome::{InstallOutcome, RpxError};

/// Scoped handle to the private install root.
///
/// Acquired before any install work touches the filesystem so the root is
/// released on every exit path of the invocation, success or failure.
/// Cleanup is idempotent, swallows removal errors, and has a synchronous
/// `Drop` backstop.
#[derive(Debug)]
pub struct InstallRoot {
    prefix: PathBuf,
    cleaned: bool,
}

impl InstallRoot {
    /// Derives and creates the private prefix: `<cache>/_rpx/<pid>`, with
    /// the binary directory beneath it. Any stale contents of the binary
    /// directory from a reused root are removed up front.
    pub async fn acquire(
        request: &InvocationRequest,
        env: &Environment,
    ) -> Result<Self, RpxError> {
        let cache = staging_dir(request, env).await?;
        let prefix = cache.join("_rpx").join(std::process::id().to_string());
        let root = Self {
            prefix,
            cleaned: false,
        };
        let bin_dir = root.bin_dir();
        // Defensive idempotence against a reused pid-scoped root.
        let _ = tokio::fs::remove_dir_all(&bin_dir).await;
        tokio::fs::create_dir_all(&bin_dir)
            .await
            .with_context(|| format!("creating install prefix {}", root.prefix.display()))?;
        tracing::debug!(prefix = %root.prefix.display(), "acquired private install root");
        Ok(root)
    }

    #[must_use]
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Binary directory for the prefix. Global installs land in a nested
    /// `bin` on POSIX; on Windows the prefix itself holds the wrappers.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.prefix.clone()
        } else {
            self.prefix.join("bin")
        }
    }

    /// Recursively deletes the private root. Runs at most once; tolerates
    /// the directory already being partially or fully removed.
    pub async fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        if let Err(err) = tokio::fs::remove_dir_all(&self.prefix).await {
            tracing::debug!(prefix = %self.prefix.display(), %err, "install root removal skipped");
        }
    }
}

impl Drop for InstallRoot {
    fn drop(&mut self) {
        if !self.cleaned {
            let _ = std::fs::remove_dir_all(&self.prefix);
        }
    }
}

/// Installs the requested specifiers under the private prefix and, on
/// success, prepends the prefix's binary directory to the search path so
/// fresh binaries outrank both the project-local and ambient entries.
pub async fn install_packages(
    request: &InvocationRequest,
    env: &mut Environment,
    root: &InstallRoot,
) -> Result<InstallOutcome, RpxError> {
    let mut args = vec!["install".to_string()];
    args.extend(request.packages.iter().cloned());
    args.push("--global".to_string());
    args.push("--prefix".to_string());
    args.push(root.prefix().display().to_string());
    args.push("--loglevel".to_string());
    args.push("error".to_string());
    args.push("--json".to_string());
    if let Some(userconfig) = &request.userconfig {
        args.push("--userconfig".to_string());
        args.push(userconfig.display().to_string());
    }
    if let Some(cache) = &request.cache {
        args.push("--cache".to_string());
        args.push(cache.display().to_string());
    }

    let output = npm::run_npm(request, env, &args).await?;
    if output.code != 0 {
        return Err(RpxError::InstallFailure {
            specs: request.packages.clone(),
            code: output.code,
        });
    }

    let (added, updated) = parse_install_summary(&output.stdout);
    let bin_dir = root.bin_dir();
    env.prepend_path(&bin_dir);
    tracing::info!(
        prefix = %root.prefix().display(),
        ?added,
        "installed packages into private prefix"
    );
    Ok(InstallOutcome {
        prefix: root.prefix().to_path_buf(),
        bin_dir,
        added,
        updated,
    })
}

/// Staging directory the private prefix hangs off: the request's override,
/// else the package manager's configured cache, else a home-based default.
async fn staging_dir(
    request: &InvocationRequest,
    env: &Environment,
) -> Result<PathBuf, RpxError> {
    if let Some(cache) = &request.cache {
        return Ok(cache.clone());
    }
    if let Some(cache) = npm::config_get_cache(request, env).await? {
        return Ok(PathBuf::from(cache));
    }
    let home = dirs_next::home_dir()
        .ok_or_else(|| anyhow::anyhow!("home directory not found"))?;
    Ok(home.join(".npm"))
}

/// Tolerant parse of the install's structured output. Empty or non-JSON
/// stdout means "no summary available", never a failure.
fn parse_install_summary(stdout: &str) -> (Option<u64>, Option<u64>) {
    let Ok(value) = serde_json::from_str::<Value>(stdout) else {
        return (None, None);
    };
    let added = value.get("added").and_then(Value::as_u64);
    let updated = value.get("updated").and_then(Value::as_u64);
    (added, updated)
}
