#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;

mod common;

use common::{search_path_with, write_script};

#[test]
fn existing_command_runs_without_install_and_propagates_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    write_script(&bin, "demo-tool", "#!/bin/sh\nexit 3\n");

    let assert = cargo_bin_cmd!("rpx")
        .current_dir(temp.path())
        .env_clear()
        .env("PATH", search_path_with(&bin))
        // A broken npm path proves the installer never runs.
        .env("RPX_NPM", temp.path().join("missing-npm"))
        .args(["demo-tool"])
        .assert()
        .code(3);

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(
        !stderr.contains("rpx:"),
        "operational failure must stay silent, got: {stderr}"
    );
}

#[test]
fn forwarded_arguments_reach_the_command() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    write_script(&bin, "demo-tool", "#!/bin/sh\necho \"$1:$2\"\n");

    cargo_bin_cmd!("rpx")
        .current_dir(temp.path())
        .env_clear()
        .env("PATH", search_path_with(&bin))
        .args(["demo-tool", "--flag", "value"])
        .assert()
        .success()
        .stdout("--flag:value\n");
}

#[test]
fn project_local_binary_satisfies_the_command() {
    let temp = tempfile::tempdir().expect("tempdir");
    let project = temp.path().join("project");
    std::fs::create_dir_all(&project).expect("project dir");
    std::fs::write(project.join("package.json"), "{}").expect("manifest");
    let local_bin = project.join("node_modules").join(".bin");
    write_script(&local_bin, "demo-tool", "#!/bin/sh\nexit 4\n");

    cargo_bin_cmd!("rpx")
        .current_dir(&project)
        .env_clear()
        .env("PATH", "/usr/bin:/bin")
        .env("RPX_NPM", temp.path().join("missing-npm"))
        .args(["demo-tool"])
        .assert()
        .code(4);
}
