//! Package descriptors for the Go packages being bound.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Name of the synthetic file base holding cross-package glue.
pub const UNIVERSE_BASE: &str = "Universe";

static IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// One Go package to expose through the framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Full import path (e.g. `github.com/acme/hello`)
    import_path: String,
    /// Package clause name (e.g. `hello`)
    name: String,
    /// Name guessed from the import path, pending `go list`
    inferred: bool,
}

impl PackageDescriptor {
    /// Create a descriptor, validating the short name.
    pub fn new(import_path: impl Into<String>, name: impl Into<String>) -> Result<Self, String> {
        let import_path = import_path.into();
        let name = name.into();

        if import_path.trim().is_empty() {
            return Err("package import path is empty".to_string());
        }
        if !IDENT.is_match(&name) {
            return Err(format!(
                "package name `{}` for `{}` is not a valid identifier",
                name, import_path
            ));
        }

        Ok(PackageDescriptor {
            import_path,
            name,
            inferred: false,
        })
    }

    /// Create a descriptor whose name is guessed from the import path.
    ///
    /// The guess is replaced by the package clause name before any file
    /// names are derived from it; see [`PackageDescriptor::with_name`].
    pub fn inferred(import_path: impl Into<String>) -> Result<Self, String> {
        let import_path = import_path.into();
        if import_path.trim().is_empty() {
            return Err("package import path is empty".to_string());
        }
        let name = default_name(&import_path);
        Ok(PackageDescriptor {
            import_path,
            name,
            inferred: true,
        })
    }

    /// The same package under its resolved clause name.
    pub fn with_name(&self, name: impl Into<String>) -> Result<Self, String> {
        PackageDescriptor::new(self.import_path.clone(), name)
    }

    /// Whether the name is still a guess.
    pub fn is_name_inferred(&self) -> bool {
        self.inferred
    }

    /// The import path passed to the generator.
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// The package's short name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The short name, title-cased (`hello` -> `Hello`).
    pub fn title(&self) -> String {
        title_case(&self.name)
    }
}

impl FromStr for PackageDescriptor {
    type Err = String;

    /// Parse `import/path` or `import/path=name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((path, name)) => PackageDescriptor::new(path.trim(), name.trim()),
            None => PackageDescriptor::inferred(s.trim()),
        }
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.import_path)
    }
}

/// Guess a package's short name from its import path.
///
/// Only a placeholder until the real clause name is known.
///
/// Skips a trailing major-version element (`example.com/lib/v2` -> `lib`)
/// and maps `-` and `.` to `_`.
pub fn default_name(import_path: &str) -> String {
    let mut elems = import_path.trim_end_matches('/').rsplit('/');
    let last = elems.next().unwrap_or_default();
    let last = if is_major_version(last) {
        elems.next().unwrap_or(last)
    } else {
        last
    };
    last.replace(['-', '.'], "_")
}

fn is_major_version(elem: &str) -> bool {
    elem.len() > 1
        && elem.starts_with('v')
        && elem[1..].chars().all(|c| c.is_ascii_digit())
}

/// Upper-case the first character.
pub fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Header file bases the generator emits, in generator order.
///
/// One `prefix + Title(name)` entry per package, then [`UNIVERSE_BASE`].
pub fn file_base_names(pkgs: &[PackageDescriptor], prefix: &str) -> Vec<String> {
    pkgs.iter()
        .map(|p| format!("{}{}", prefix, p.title()))
        .chain(std::iter::once(UNIVERSE_BASE.to_string()))
        .collect()
}
