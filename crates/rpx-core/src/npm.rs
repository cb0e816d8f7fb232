//! Subprocess boundary to the external package manager.
//!
//! Three invocations exist: `config get cache`, `install … --json`, and
//! `run-script env`. All are read-only or idempotent; nothing else of the
//! package manager's behavior is relied on.

use std::process::Stdio;

use anyhow::{Context, Result};
use rpx_domain::{Environment, InvocationRequest};
use tokio::process::Command;

#[derive(Debug)]
pub struct NpmOutput {
    pub code: i32,
    pub stdout: String,
}

/// Runs the package manager with `args`, capturing stdout. Stderr is
/// inherited so the package manager's own diagnostics stay visible, unless
/// the request asked for quiet operation.
pub async fn run_npm(
    request: &InvocationRequest,
    env: &Environment,
    args: &[String],
) -> Result<NpmOutput> {
    let program = request.npm_program();
    let mut command = Command::new(&program);
    command
        .args(args)
        .env_clear()
        .envs(env.iter())
        .current_dir(&request.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped());
    if request.quiet {
        command.stderr(Stdio::null());
    } else {
        command.stderr(Stdio::inherit());
    }

    let output = command
        .output()
        .await
        .with_context(|| format!("failed to start {program}"))?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let code = output.status.code().unwrap_or(-1);
    tracing::debug!(%program, code, "package manager finished");
    Ok(NpmOutput { code, stdout })
}

/// Asks the package manager for its configured cache directory.
pub async fn config_get_cache(
    request: &InvocationRequest,
    env: &Environment,
) -> Result<Option<String>> {
    let args = vec![
        "config".to_string(),
        "get".to_string(),
        "cache".to_string(),
        "--loglevel".to_string(),
        "error".to_string(),
    ];
    let output = run_npm(request, env, &args).await?;
    if output.code != 0 {
        anyhow::bail!("`npm config get cache` exited with code {}", output.code);
    }
    let cache = output.stdout.trim();
    if cache.is_empty() || cache == "undefined" {
        Ok(None)
    } else {
        Ok(Some(cache.to_string()))
    }
}
