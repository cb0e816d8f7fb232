#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Writes an executable shell script and returns its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("script dir");
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}

/// Stub package manager. `config get cache` reports the directory named by
/// `RPX_STUB_CACHE`; `install` populates the `--prefix` bin directory with
/// a `demo-tool` that exits 5 and prints a JSON summary; `run-script env`
/// prints key=value lines.
#[cfg(unix)]
pub fn write_stub_npm(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "npm-stub",
        concat!(
            "#!/bin/sh\n",
            "case \"$1\" in\n",
            "  config)\n",
            "    echo \"$RPX_STUB_CACHE\"\n",
            "    ;;\n",
            "  install)\n",
            "    prefix=\"\"\n",
            "    grab=0\n",
            "    for arg in \"$@\"; do\n",
            "      if [ \"$grab\" = 1 ]; then prefix=\"$arg\"; grab=0; fi\n",
            "      if [ \"$arg\" = \"--prefix\" ]; then grab=1; fi\n",
            "    done\n",
            "    mkdir -p \"$prefix/bin\"\n",
            "    printf '#!/bin/sh\\nexit 5\\n' > \"$prefix/bin/demo-tool\"\n",
            "    chmod 755 \"$prefix/bin/demo-tool\"\n",
            "    printf '{\"added\":1}\\n'\n",
            "    ;;\n",
            "  run-script)\n",
            "    printf 'PATH=%s\\nRPX_LIFECYCLE=1\\n' \"$PATH\"\n",
            "    ;;\n",
            "  *)\n",
            "    exit 64\n",
            "    ;;\n",
            "esac\n",
        ),
    )
}

/// Search path reaching `dir` plus the coreutils the stubs rely on.
pub fn search_path_with(dir: &Path) -> String {
    format!("{}:/usr/bin:/bin", dir.display())
}
