//! The resolution-and-execution pipeline.

use rpx_domain::{Environment, InvocationRequest};

use crate::installer::{self, InstallRoot};
use crate::outcome::{ExitOutcome, ResolvedPath, RpxError};
use crate::{classify, exec, lifecycle, locator, paths};

/// Resolves the request to an executable, installing on demand, runs it,
/// and reports the terminal outcome. The private install root (if one was
/// created) is released on every exit path before this returns.
pub async fn run(
    request: &InvocationRequest,
    mut env: Environment,
) -> Result<ExitOutcome, RpxError> {
    let local_bin = paths::local_bin_dir(&request.cwd).await;
    if let Some(dir) = &local_bin {
        env.prepend_path(dir);
    }

    // The two lookups are independent; both settle before the install
    // decision is made.
    let (existing, lifecycle_env) = tokio::join!(
        paths::existing_path(request, &env, local_bin.as_deref()),
        lifecycle::capture(request, &env),
    );
    let existing = existing?;
    if let Some(vars) = lifecycle_env? {
        env.replace_all(vars);
    }

    let mut root = None;
    let result = resolve_and_execute(request, &mut env, existing, &mut root).await;
    if let Some(root) = root.as_mut() {
        root.cleanup().await;
    }
    result
}

async fn resolve_and_execute(
    request: &InvocationRequest,
    env: &mut Environment,
    existing: ResolvedPath,
    root_slot: &mut Option<InstallRoot>,
) -> Result<ExitOutcome, RpxError> {
    let mut resolved = existing;

    if !resolved.satisfies() && !request.packages.is_empty() {
        let root = root_slot.insert(InstallRoot::acquire(request, env).await?);
        let outcome = installer::install_packages(request, env, root).await?;
        if let Some(added) = outcome.added.filter(|_| !request.quiet) {
            eprintln!("rpx: installed {added} package(s)");
        }
        let locate = request.command.is_some()
            && request.packages.len() == 1
            && !request.package_requested;
        if locate {
            if let Some(command) = request.command.as_deref() {
                let path = locator::find_installed(&outcome.bin_dir, command).await?;
                resolved = ResolvedPath::Installed(path);
            }
        }
    }

    if request.command.is_none() && !resolved.satisfies() {
        return Ok(ExitOutcome::Success);
    }

    let target = classify::classify(&resolved, request).await?;
    let current_entry = std::env::current_exe().ok();
    let strategy = exec::decide_strategy(target.as_ref(), request, current_entry.as_deref());
    tracing::debug!(?strategy, "execution strategy chosen");
    exec::execute(strategy, request, env).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpx_domain::PATH_VAR;
    use std::path::Path;
    use tempfile::tempdir;

    fn env_with_path(dir: &Path) -> Environment {
        let mut env = Environment::default();
        env.set(PATH_VAR, dir.display().to_string());
        env
    }

    /// Search path that still reaches the coreutils the stub scripts use.
    #[cfg(unix)]
    fn env_with_system_path(dir: &Path) -> Environment {
        let mut env = Environment::default();
        env.set(PATH_VAR, format!("{}:/usr/bin:/bin", dir.display()));
        env
    }

    #[cfg(unix)]
    fn write_tool(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;
        std::fs::create_dir_all(dir).expect("dir");
        let path = dir.join(name);
        std::fs::write(&path, body).expect("write");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn existing_command_never_triggers_the_installer() {
        let temp = tempdir().expect("tempdir");
        let bin = temp.path().join("bin");
        write_tool(&bin, "tool", "#!/bin/sh\nexit 0\n");

        let mut request = InvocationRequest::new(temp.path());
        request.command = Some("tool".to_string());
        // A package list is present, but the satisfied lookup must
        // short-circuit the installer; a broken npm would fail loudly.
        request.packages = vec!["tool".to_string()];
        request.npm = Some(temp.path().join("missing-npm").display().to_string());

        let outcome = run(&request, env_with_path(&bin)).await.expect("run");
        assert_eq!(outcome, ExitOutcome::Success);
        // Resolving a second time behaves identically.
        let outcome = run(&request, env_with_path(&bin)).await.expect("run");
        assert_eq!(outcome, ExitOutcome::Success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn operational_exit_codes_pass_through() {
        let temp = tempdir().expect("tempdir");
        let bin = temp.path().join("bin");
        write_tool(&bin, "tool", "#!/bin/sh\nexit 3\n");

        let mut request = InvocationRequest::new(temp.path());
        request.command = Some("tool".to_string());

        let outcome = run(&request, env_with_path(&bin)).await.expect("run");
        assert_eq!(outcome, ExitOutcome::Operational { code: 3 });
    }

    #[tokio::test]
    async fn missing_command_without_install_escalates_127() {
        let temp = tempdir().expect("tempdir");
        let mut request = InvocationRequest::new(temp.path());
        request.command = Some("absent-tool".to_string());
        request.install = false;

        let err = run(&request, env_with_path(temp.path()))
            .await
            .expect_err("no fallback install");
        assert_eq!(err.exit_code(), 127);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn install_flow_resolves_locates_and_cleans_up() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().expect("tempdir");
        let cache = temp.path().join("cache");
        std::fs::create_dir_all(&cache).expect("cache dir");

        // Stub package manager: `install` populates the private prefix
        // named by --prefix with a binary that exits 5.
        let npm = temp.path().join("npm-stub");
        std::fs::write(
            &npm,
            concat!(
                "#!/bin/sh\n",
                "prefix=\"\"\n",
                "grab=0\n",
                "for arg in \"$@\"; do\n",
                "  if [ \"$grab\" = 1 ]; then prefix=\"$arg\"; grab=0; fi\n",
                "  if [ \"$arg\" = \"--prefix\" ]; then grab=1; fi\n",
                "done\n",
                "mkdir -p \"$prefix/bin\"\n",
                "printf '#!/bin/sh\\nexit 5\\n' > \"$prefix/bin/demo-tool\"\n",
                "chmod 755 \"$prefix/bin/demo-tool\"\n",
                "printf '{\"added\":1}\\n'\n",
            ),
        )
        .expect("write stub");
        std::fs::set_permissions(&npm, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let mut request = InvocationRequest::new(temp.path());
        request.command = Some("demo-tool".to_string());
        request.packages = vec!["demo-tool".to_string()];
        request.npm = Some(npm.display().to_string());
        request.cache = Some(cache.clone());
        request.quiet = true;

        let outcome = run(&request, env_with_system_path(temp.path()))
            .await
            .expect("run");
        assert_eq!(outcome, ExitOutcome::Operational { code: 5 });

        // The private root scoped to this process is gone.
        let private = cache.join("_rpx").join(std::process::id().to_string());
        assert!(!private.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn install_failure_carries_specs_and_exit_code() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().expect("tempdir");
        let cache = temp.path().join("cache");
        std::fs::create_dir_all(&cache).expect("cache dir");
        let npm = temp.path().join("npm-stub");
        std::fs::write(&npm, "#!/bin/sh\nexit 9\n").expect("write stub");
        std::fs::set_permissions(&npm, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let mut request = InvocationRequest::new(temp.path());
        request.command = Some("demo-tool".to_string());
        request.packages = vec!["demo-tool@1.0.0".to_string()];
        request.npm = Some(npm.display().to_string());
        request.cache = Some(cache.clone());
        request.quiet = true;

        let err = run(&request, env_with_path(temp.path()))
            .await
            .expect_err("install fails");
        let RpxError::InstallFailure { specs, code } = &err else {
            panic!("expected InstallFailure, got {err:?}");
        };
        assert_eq!(specs, &vec!["demo-tool@1.0.0".to_string()]);
        assert_eq!(*code, 9);
        assert_eq!(err.exit_code(), 9);

        // Cleanup ran on the failure path too.
        let private = cache.join("_rpx").join(std::process::id().to_string());
        assert!(!private.exists());
    }
}
