//! Decides whether a resolved target can be loaded in-process or must be
//! spawned, recursing into directory-style packages.

use std::path::Path;

use anyhow::Context;
use rpx_domain::{InvocationRequest, PackageManifest};
use tokio::io::AsyncReadExt;

use crate::outcome::{ExecutionTarget, ResolvedPath, RpxError};

/// Interpreter line that marks a script as loadable by the runtime. The
/// sniff compares exactly this many leading bytes, nothing looser.
const NODE_SHEBANG: &[u8] = b"#!/usr/bin/env node\n";

/// Script extensions an explicitly local target may carry.
const SCRIPT_EXTENSIONS: [&str; 3] = ["js", "cjs", "mjs"];

/// Manifest chains longer than this are treated as unresolvable rather
/// than followed further (a manifest may point back at its own directory).
const MAX_PACKAGE_DEPTH: u32 = 16;

/// Classifies the resolved path into an [`ExecutionTarget`]. An absent
/// path yields no target (run nothing, or pass the literal command
/// through).
pub async fn classify(
    resolved: &ResolvedPath,
    request: &InvocationRequest,
) -> Result<Option<ExecutionTarget>, RpxError> {
    let Some(path) = resolved.path() else {
        return Ok(None);
    };
    classify_path(path, request, 0).await.map(Some)
}

async fn classify_path(
    path: &Path,
    request: &InvocationRequest,
    depth: u32,
) -> Result<ExecutionTarget, RpxError> {
    if request.is_local && has_script_extension(path) {
        return Ok(ExecutionTarget {
            path: path.to_path_buf(),
            loadable: true,
            is_package_dir: depth > 0,
        });
    }

    let metadata = tokio::fs::metadata(path).await.ok();
    if request.is_local && metadata.as_ref().is_some_and(std::fs::Metadata::is_dir) {
        return classify_package_dir(path, request, depth).await;
    }

    let loadable = if cfg!(windows) {
        // No POSIX shebang semantics; always spawn.
        false
    } else if metadata.is_some() {
        sniff_shebang(path).await?
    } else {
        false
    };

    Ok(ExecutionTarget {
        path: path.to_path_buf(),
        loadable,
        is_package_dir: depth > 0,
    })
}

/// A local directory target is a package: its manifest names the entry
/// point, which is classified recursively. An unreadable or malformed
/// manifest escalates as command-not-found naming the original directory.
async fn classify_package_dir(
    dir: &Path,
    request: &InvocationRequest,
    depth: u32,
) -> Result<ExecutionTarget, RpxError> {
    if depth >= MAX_PACKAGE_DEPTH {
        return Err(RpxError::not_found(dir.display().to_string()));
    }
    let manifest_path = dir.join("package.json");
    let contents = match tokio::fs::read_to_string(&manifest_path).await {
        Ok(contents) => contents,
        Err(_) => return Err(RpxError::not_found(dir.display().to_string())),
    };
    let Ok(manifest) = PackageManifest::parse(&contents) else {
        return Err(RpxError::not_found(dir.display().to_string()));
    };
    let entry = manifest.entry_point(dir);
    tracing::debug!(dir = %dir.display(), entry = %entry.display(), "package directory entry");
    let target = Box::pin(classify_path(&entry, request, depth + 1)).await?;
    Ok(ExecutionTarget {
        is_package_dir: true,
        ..target
    })
}

fn has_script_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SCRIPT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Reads exactly the shebang's byte length from the start of the file and
/// demands byte equality. Short files are simply not loadable; open and
/// read failures propagate (the handle closes on drop either way).
async fn sniff_shebang(path: &Path) -> Result<bool, RpxError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {} for shebang sniff", path.display()))
        .map_err(RpxError::Unexpected)?;
    let mut head = [0u8; NODE_SHEBANG.len()];
    let mut filled = 0;
    while filled < head.len() {
        let read = file
            .read(&mut head[filled..])
            .await
            .with_context(|| format!("reading {} for shebang sniff", path.display()))
            .map_err(RpxError::Unexpected)?;
        if read == 0 {
            return Ok(false);
        }
        filled += read;
    }
    Ok(head == NODE_SHEBANG)
}
