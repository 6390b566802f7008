//! Text emitted into the framework: module map, umbrella header, Info.plist.
//!
//! Output depends only on the arguments. No timestamps, no hash ordering.

use std::fmt::Write;

use crate::core::package::PackageDescriptor;

/// Header the generator emits with the shared reference-tracking declarations.
pub const REF_HEADER: &str = "ref.h";

/// Fixed resource manifest for a static framework.
pub const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
    <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
    <plist version="1.0">
      <dict>
      </dict>
    </plist>
"#;

/// Render `module.modulemap`.
///
/// `ref.h` always comes first, then `headers` in order. The `ref.h` line is
/// tab indented and the closing brace has no trailing newline, matching
/// what gomobile writes byte for byte.
pub fn module_map(module: &str, headers: &[String]) -> String {
    let mut out = String::new();
    writeln!(out, "framework module \"{}\" {{", module).unwrap();
    writeln!(out, "\theader \"{}\"", REF_HEADER).unwrap();
    for header in headers {
        writeln!(out, "    header \"{}\"", header).unwrap();
    }
    writeln!(out).unwrap();
    writeln!(out, "    export *").unwrap();
    write!(out, "}}").unwrap();
    out
}

/// Render the umbrella header that includes every per-package header.
///
/// `bases` is the file base name list; each entry becomes
/// `#include "<base>.objc.h"` in order.
pub fn umbrella_header(title: &str, pkgs: &[PackageDescriptor], bases: &[String]) -> String {
    let mut out = String::new();
    writeln!(out).unwrap();
    writeln!(out, "// Objective-C API for talking to the following Go packages").unwrap();
    writeln!(out, "//").unwrap();
    for pkg in pkgs {
        writeln!(out, "//\t{}", pkg.import_path()).unwrap();
    }
    writeln!(out, "//").unwrap();
    writeln!(out, "// File is generated by macbind. Do not edit.").unwrap();
    writeln!(out, "#ifndef __{}_FRAMEWORK_H__", title).unwrap();
    writeln!(out, "#define __{}_FRAMEWORK_H__", title).unwrap();
    writeln!(out).unwrap();
    for base in bases {
        writeln!(out, "#include \"{}.objc.h\"", base).unwrap();
    }
    writeln!(out).unwrap();
    writeln!(out, "#endif").unwrap();
    out
}
