//! Static framework bundle layout.
//!
//! ```text
//! <Name>.framework/
//!   Versions/A/{<Title>, Headers/, Resources/, Modules/}
//!   Versions/Current -> A
//!   Headers -> Versions/Current/Headers
//!   Resources -> Versions/Current/Resources
//!   Modules -> Versions/Current/Modules
//!   <Title> -> Versions/Current/<Title>
//! ```
//!
//! Everything here goes through [`Filesystem`] and never spawns a process,
//! so the layout can be rendered against an in-memory tree.

use std::path::{Path, PathBuf};

use crate::builder::errors::BindError;
use crate::builder::templates::{self, REF_HEADER};
use crate::core::package::{file_base_names, PackageDescriptor, UNIVERSE_BASE};
use crate::util::fs::Filesystem;

/// The single real version directory.
pub const VERSION: &str = "A";

/// Paths inside one framework bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkLayout {
    root: PathBuf,
    title: String,
}

impl FrameworkLayout {
    pub fn new(root: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        FrameworkLayout {
            root: root.into(),
            title: title.into(),
        }
    }

    /// `<Name>.framework`
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Module and binary name.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// `Versions/A`
    pub fn version_dir(&self) -> PathBuf {
        self.root.join("Versions").join(VERSION)
    }

    pub fn headers_dir(&self) -> PathBuf {
        self.version_dir().join("Headers")
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.version_dir().join("Resources")
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.version_dir().join("Modules")
    }

    /// `Versions/A/<Title>`, where the fat archive is written.
    pub fn binary_path(&self) -> PathBuf {
        self.version_dir().join(&self.title)
    }

    pub fn module_map_path(&self) -> PathBuf {
        self.modules_dir().join("module.modulemap")
    }

    pub fn info_plist_path(&self) -> PathBuf {
        self.resources_dir().join("Info.plist")
    }

    /// Top-level symlinks as `(link, target)`, `Versions/Current` first.
    pub fn symlinks(&self) -> Vec<(PathBuf, PathBuf)> {
        let current = Path::new("Versions").join("Current");
        vec![
            (current.clone(), PathBuf::from(VERSION)),
            (PathBuf::from("Headers"), current.join("Headers")),
            (PathBuf::from("Resources"), current.join("Resources")),
            (PathBuf::from("Modules"), current.join("Modules")),
            (PathBuf::from(&self.title), current.join(&self.title)),
        ]
    }
}

/// One generated header to copy into `Headers/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCopy {
    pub from: PathBuf,
    pub name: String,
}

/// What goes into `Headers/` and what the module map declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPlan {
    pub copies: Vec<HeaderCopy>,
    /// `<Title>.h` contents when several packages are bound
    pub umbrella: Option<String>,
    /// Headers declared in the module map after `ref.h`
    pub manifest: Vec<String>,
}

impl HeaderPlan {
    /// Plan headers for `pkgs` from the generator output in `generated_dir`.
    ///
    /// A single package's header is renamed to `<Title>.h`. Several packages
    /// keep their `<base>.objc.h` names and get an umbrella `<Title>.h`.
    /// `ref.h` and `Universe.objc.h` are copied in both shapes; only the
    /// manifest differs.
    pub fn new(
        title: &str,
        pkgs: &[PackageDescriptor],
        prefix: &str,
        generated_dir: &Path,
    ) -> Self {
        let ref_copy = HeaderCopy {
            from: generated_dir.join(REF_HEADER),
            name: REF_HEADER.to_string(),
        };

        if pkgs.len() == 1 {
            let name = format!("{}.h", title);
            // The package header includes the shared glue header.
            let universe = format!("{}.objc.h", UNIVERSE_BASE);
            return HeaderPlan {
                copies: vec![
                    HeaderCopy {
                        from: generated_dir.join(format!("{}{}.objc.h", prefix, title)),
                        name: name.clone(),
                    },
                    HeaderCopy {
                        from: generated_dir.join(&universe),
                        name: universe,
                    },
                    ref_copy,
                ],
                umbrella: None,
                manifest: vec![name],
            };
        }

        let bases = file_base_names(pkgs, prefix);
        let manifest: Vec<String> = bases.iter().map(|b| format!("{}.objc.h", b)).collect();
        let mut copies: Vec<HeaderCopy> = manifest
            .iter()
            .map(|name| HeaderCopy {
                from: generated_dir.join(name),
                name: name.clone(),
            })
            .collect();
        copies.push(ref_copy);

        HeaderPlan {
            copies,
            umbrella: Some(templates::umbrella_header(title, pkgs, &bases)),
            manifest,
        }
    }
}

/// Remove whatever is at the bundle path and lay out the empty skeleton.
pub fn render_skeleton(fs: &mut dyn Filesystem, layout: &FrameworkLayout) -> Result<(), BindError> {
    let root = layout.root();
    fs.remove_all(root)
        .map_err(|e| BindError::assembly(root, e))?;

    for dir in [
        layout.headers_dir(),
        layout.resources_dir(),
        layout.modules_dir(),
    ] {
        fs.create_dir_all(&dir)
            .map_err(|e| BindError::assembly(&dir, e))?;
    }

    for (link, target) in layout.symlinks() {
        let link = root.join(link);
        fs.symlink(&target, &link)
            .map_err(|e| BindError::assembly(&link, e))?;
    }

    tracing::debug!("rendered framework skeleton at {}", root.display());
    Ok(())
}

/// Copy headers, write the umbrella header, resources and module map.
///
/// Runs after the fat archive is in place. Stops at the first failure and
/// leaves the partial bundle behind.
pub fn install_contents(
    fs: &mut dyn Filesystem,
    layout: &FrameworkLayout,
    plan: &HeaderPlan,
) -> Result<(), BindError> {
    let headers = layout.headers_dir();
    for copy in &plan.copies {
        let to = headers.join(&copy.name);
        fs.copy_file(&copy.from, &to)
            .map_err(|e| BindError::assembly(&copy.from, e))?;
    }

    if let Some(umbrella) = &plan.umbrella {
        let path = headers.join(format!("{}.h", layout.title()));
        write(fs, &path, umbrella)?;
    }

    write(fs, &layout.info_plist_path(), templates::INFO_PLIST)?;
    write(
        fs,
        &layout.module_map_path(),
        &templates::module_map(layout.title(), &plan.manifest),
    )?;
    Ok(())
}

fn write(fs: &mut dyn Filesystem, path: &Path, contents: &str) -> Result<(), BindError> {
    fs.write(path, contents.as_bytes())
        .map_err(|e| BindError::assembly(path, e))
}
