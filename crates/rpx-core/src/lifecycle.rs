//! Lifecycle-environment capture through the package manager.

use std::collections::BTreeMap;

use rpx_domain::{Environment, InvocationRequest};

use crate::npm;
use crate::outcome::RpxError;

/// When the request opts in, asks the package manager for its fully
/// resolved lifecycle environment (`run-script env`, `key=value` lines).
/// The returned mapping replaces the invocation environment wholesale; it
/// already contains the search-path additions the caller would otherwise
/// prepend manually.
pub async fn capture(
    request: &InvocationRequest,
    env: &Environment,
) -> Result<Option<BTreeMap<String, String>>, RpxError> {
    if !request.npm_env {
        return Ok(None);
    }
    let args = vec![
        "run-script".to_string(),
        "env".to_string(),
        "--loglevel".to_string(),
        "error".to_string(),
    ];
    let output = npm::run_npm(request, env, &args).await?;
    if output.code != 0 {
        return Err(RpxError::Unexpected(anyhow::anyhow!(
            "`npm run-script env` exited with code {}",
            output.code
        )));
    }
    let vars = parse_env_lines(&output.stdout);
    tracing::debug!(count = vars.len(), "captured lifecycle environment");
    Ok(Some(vars))
}

/// Parses `key=value` lines, skipping the script banner and anything that
/// is not an assignment. Values keep any `=` they contain.
fn parse_env_lines(stdout: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in stdout.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('>') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.is_empty() {
                continue;
            }
            vars.insert(key.to_string(), value.to_string());
        }
    }
    vars
}
