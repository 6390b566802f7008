//! Test fixtures for common bind scenarios.
//!
//! Pre-built generator output, `go list` samples and fake tool scripts.

use std::path::{Path, PathBuf};

use crate::core::arch::Arch;
use crate::core::bind_config::{BindConfig, ToolCommand, Tools};
use crate::core::package::{file_base_names, PackageDescriptor, UNIVERSE_BASE};

use super::MockFileSystem;

/// `go list -m -json all` for a module with one versioned and one local
/// replaced dependency.
pub const GO_LIST_MODULES: &str = r#"{
	"Path": "example.com/hello",
	"Main": true,
	"Dir": "/src/hello",
	"GoMod": "/src/hello/go.mod",
	"GoVersion": "1.21"
}
{
	"Path": "golang.org/x/mobile",
	"Version": "v0.0.0-20240404231514-09dbf07665ed",
	"Dir": "/gopath/pkg/mod/golang.org/x/mobile@v0.0.0-20240404231514-09dbf07665ed"
}
{
	"Path": "example.com/util",
	"Version": "v1.2.0",
	"Replace": {
		"Path": "../util",
		"Dir": "/src/util"
	},
	"Dir": "/src/util"
}
"#;

/// `go list -m -json all` outside any module.
pub const GO_LIST_NO_MODULE: &str = r#"{
	"Path": "command-line-arguments",
	"Main": true
}
"#;

/// Build packages `example.com/<name>` for each name.
pub fn packages(names: &[&str]) -> Vec<PackageDescriptor> {
    names
        .iter()
        .filter_map(|n| PackageDescriptor::new(format!("example.com/{}", n), *n).ok())
        .collect()
}

/// Populate `fs` with what the generator would write for `config`.
///
/// Package headers include `ref.h` and `Universe.objc.h` the way the
/// generator's output does.
pub fn add_generated_output(fs: &mut MockFileSystem, config: &BindConfig) {
    let dir = config.generated_dir();
    for base in file_base_names(&config.packages, &config.prefix) {
        let mut header = format!("// {} header\n#include \"ref.h\"\n", base);
        if base != UNIVERSE_BASE {
            header.push_str("#include \"Universe.objc.h\"\n");
        }
        fs.add_file(dir.join(format!("{}.objc.h", base)), header);
        fs.add_file(dir.join(format!("{}.m", base)), "");
    }
    fs.add_file(dir.join("ref.h"), "// ref\n");
    fs.add_file(dir.join("go_main.go"), "package main\n");
}

/// Populate `fs` with one archive per configured architecture.
pub fn add_archives(fs: &mut MockFileSystem, config: &BindConfig) {
    for target in &config.targets {
        add_archive(fs, config, target.arch);
    }
}

/// Populate `fs` with the archive for one architecture.
pub fn add_archive(fs: &mut MockFileSystem, config: &BindConfig, arch: Arch) {
    fs.add_file(config.archive_path(arch), format!("!<arch>\n{}", arch.tag()));
}

/// Shell scripts standing in for gobind, go and lipo.
///
/// Each appends its argv to `<dir>/calls.log`. The fake generator writes
/// headers for every package named by `FAKE_PKGS` (comma separated Title
/// names), the fake go writes the `-o` archive and answers `go list -f` with
/// the last import path element, the fake lipo writes `-o`.
#[cfg(unix)]
pub fn write_fake_tools(dir: &Path) -> std::io::Result<Tools> {
    use std::os::unix::fs::PermissionsExt;

    let log = dir.join("calls.log");
    let scripts = [
        (
            "gobind",
            format!(
                r#"#!/bin/sh
echo "gobind $*" >> "{log}"
out=""
for a in "$@"; do
  case "$a" in -outdir=*) out="${{a#-outdir=}}" ;; esac
done
mkdir -p "$out/src/gobind"
echo "// ref" > "$out/src/gobind/ref.h"
for t in $(echo "$FAKE_PKGS,Universe" | tr ',' ' '); do
  echo "// $t" > "$out/src/gobind/$t.objc.h"
done
"#,
                log = log.display()
            ),
        ),
        (
            "go",
            format!(
                r#"#!/bin/sh
echo "go $* GOARCH=$GOARCH" >> "{log}"
if [ "$1" = "list" ] && [ "$2" = "-f" ]; then
  shift 4
  for p in "$@"; do basename "$p"; done
  exit 0
fi
if [ "$1" = "list" ]; then
  echo '{{"Path":"example.com/hello","Main":true,"GoVersion":"1.21"}}'
  exit 0
fi
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then echo "archive $GOARCH" > "$a"; fi
  prev="$a"
done
"#,
                log = log.display()
            ),
        ),
        (
            "lipo",
            format!(
                r#"#!/bin/sh
echo "lipo $*" >> "{log}"
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then echo "fat" > "$a"; fi
  prev="$a"
done
"#,
                log = log.display()
            ),
        ),
    ];

    for (name, body) in &scripts {
        let path = dir.join(name);
        std::fs::write(&path, body)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(Tools {
        gobind: ToolCommand::new(dir.join("gobind")),
        go: ToolCommand::new(dir.join("go")),
        lipo: ToolCommand::new(dir.join("lipo")),
    })
}

/// Path of the call log written by [`write_fake_tools`].
pub fn fake_tool_log(dir: &Path) -> PathBuf {
    dir.join("calls.log")
}
