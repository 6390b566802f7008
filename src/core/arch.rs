//! Target CPU architectures and their build environments.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A darwin CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    Arm64,
    X86_64,
    I386,
    Armv7,
}

impl Arch {
    /// Architectures built when none are requested.
    pub const DEFAULT: [Arch; 2] = [Arch::Arm64, Arch::X86_64];

    /// Canonical tag, as understood by clang and `lipo -arch`.
    pub fn tag(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "x86_64",
            Arch::I386 => "i386",
            Arch::Armv7 => "armv7",
        }
    }

    /// Name used for `GOARCH`.
    pub fn go_arch(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "amd64",
            Arch::I386 => "386",
            Arch::Armv7 => "arm",
        }
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "i386" | "386" => Ok(Arch::I386),
            "armv7" | "arm" => Ok(Arch::Armv7),
            _ => Err(format!(
                "unknown architecture '{}'; expected one of arm64, x86_64, i386, armv7",
                s
            )),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One architecture to build, with the environment its build runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchTarget {
    pub arch: Arch,
    /// Variables layered over the ambient environment.
    pub env: BTreeMap<String, String>,
}

impl ArchTarget {
    /// Target with the default darwin cgo environment.
    pub fn new(arch: Arch) -> Self {
        let mut env = BTreeMap::new();
        env.insert("GOOS".to_string(), "darwin".to_string());
        env.insert("GOARCH".to_string(), arch.go_arch().to_string());
        env.insert("CGO_ENABLED".to_string(), "1".to_string());
        env.insert("CGO_CFLAGS".to_string(), format!("-arch {}", arch.tag()));
        env.insert("CGO_LDFLAGS".to_string(), format!("-arch {}", arch.tag()));
        ArchTarget { arch, env }
    }

    /// Override environment variables; later calls win.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    pub fn tag(&self) -> &'static str {
        self.arch.tag()
    }

    /// Value of `GOARCH` in this target's environment.
    pub fn go_arch(&self) -> &str {
        self.env
            .get("GOARCH")
            .map(String::as_str)
            .unwrap_or_else(|| self.arch.go_arch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!("x86_64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!("ARM64".parse::<Arch>().unwrap(), Arch::Arm64);
        assert_eq!("386".parse::<Arch>().unwrap(), Arch::I386);
        assert!("sparc".parse::<Arch>().is_err());
    }

    #[test]
    fn test_default_env() {
        let target = ArchTarget::new(Arch::X86_64);
        assert_eq!(target.env["GOOS"], "darwin");
        assert_eq!(target.env["GOARCH"], "amd64");
        assert_eq!(target.env["CGO_ENABLED"], "1");
        assert_eq!(target.env["CGO_CFLAGS"], "-arch x86_64");
        assert_eq!(target.tag(), "x86_64");
    }

    #[test]
    fn test_env_override() {
        let target = ArchTarget::new(Arch::Arm64)
            .with_env([("CGO_CFLAGS", "-arch arm64 -mmacosx-version-min=11.0")]);
        assert_eq!(
            target.env["CGO_CFLAGS"],
            "-arch arm64 -mmacosx-version-min=11.0"
        );
        assert_eq!(target.go_arch(), "arm64");
    }
}
