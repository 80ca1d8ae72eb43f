use serde::{Deserialize, Serialize};
use std::fmt;

/// An operating system / architecture pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this process runs on
    pub fn host() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Host platform with either part overridden
    pub fn host_with(os: Option<String>, arch: Option<String>) -> Self {
        let host = Self::host();
        Self {
            os: os.unwrap_or(host.os),
            arch: arch.unwrap_or(host.arch),
        }
    }

    /// Whether binaries built for `self` execute on `host`
    ///
    /// Architectures are compared by family, so package-manager names such as
    /// `armv8` match the toolchain's `aarch64`.
    pub fn can_run_on(&self, host: &Self) -> bool {
        self.os.eq_ignore_ascii_case(&host.os) && arch_family(&self.arch) == arch_family(&host.arch)
    }
}

/// Canonical name of an architecture, lowercased when unknown
fn arch_family(arch: &str) -> String {
    let arch = arch.to_ascii_lowercase();
    let family = match arch.as_str() {
        "armv8" | "arm64" | "aarch64" => "aarch64",
        "x86_64" | "amd64" => "x86_64",
        "x86" | "i386" | "i586" | "i686" => "x86",
        "armv7" | "armv7hf" | "arm" => "arm",
        _ => return arch,
    };
    family.to_string()
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
