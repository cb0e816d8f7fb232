//! Picks the installed binary matching the requested command.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::outcome::RpxError;

/// Wrapper extensions a platform's installer may append to a command name.
/// Accepted on every platform so matching behaves identically everywhere.
const WRAPPER_EXTENSIONS: [&str; 4] = [".cmd", ".exe", ".bat", ".ps1"];

/// Finds the freshly installed binary for `command` in `bin_dir`.
///
/// A missing directory means the install produced nothing for this command
/// and is reported as command-not-found; any other listing error propagates
/// unchanged. Matching is case-insensitive and tolerates a wrapper
/// extension. When nothing matches, the first listed entry is returned as
/// a best-effort fallback.
pub async fn find_installed(bin_dir: &Path, command: &str) -> Result<PathBuf, RpxError> {
    let mut reader = match tokio::fs::read_dir(bin_dir).await {
        Ok(reader) => reader,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(RpxError::not_found(command));
        }
        Err(err) => {
            return Err(RpxError::Unexpected(anyhow::Error::new(err).context(
                format!("listing install bin directory {}", bin_dir.display()),
            )));
        }
    };

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .with_context(|| format!("listing install bin directory {}", bin_dir.display()))
        .map_err(RpxError::Unexpected)?
    {
        entries.push(entry.file_name().to_string_lossy().into_owned());
    }
    entries.sort();

    match match_binary(&entries, command) {
        Some(name) => Ok(bin_dir.join(name)),
        None => Err(RpxError::not_found(command)),
    }
}

/// Pure matching rule. Exposed separately so the heuristic is testable
/// without a filesystem.
#[must_use]
pub fn match_binary<'a>(entries: &'a [String], command: &str) -> Option<&'a str> {
    let wanted = command.to_lowercase();
    for entry in entries {
        let lowered = entry.to_lowercase();
        if lowered == wanted {
            return Some(entry);
        }
        if WRAPPER_EXTENSIONS
            .iter()
            .any(|ext| lowered == format!("{wanted}{ext}"))
        {
            return Some(entry);
        }
    }
    // Best-effort fallback: take whatever the install produced first.
    entries.first().map(String::as_str)
}
