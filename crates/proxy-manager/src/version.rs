//! Build fingerprint: the dependency-version set this crate was compiled against.
//!
//! The set is captured by `build.rs` from the workspace `Cargo.lock`. Any
//! change to a locked dependency changes the fingerprint digest, and with it
//! every identifier and proxy class name derived from it.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Raw JSON dependency list recorded at build time.
pub const DEPENDENCY_VERSIONS: &str = env!("PROXY_MANAGER_DEPENDENCY_VERSIONS");

/// A single locked package.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageVersion {
    pub name: String,
    pub version: String,
}

impl PackageVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Sorted, deduplicated set of package versions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFingerprint {
    packages: Vec<PackageVersion>,
}

impl BuildFingerprint {
    pub fn new(packages: impl IntoIterator<Item = PackageVersion>) -> Self {
        let mut packages: Vec<PackageVersion> = packages.into_iter().collect();
        packages.sort();
        packages.dedup();
        Self { packages }
    }

    /// Fingerprint of the running build.
    pub fn current() -> &'static BuildFingerprint {
        static CURRENT: OnceLock<BuildFingerprint> = OnceLock::new();
        CURRENT.get_or_init(|| {
            let packages: Vec<PackageVersion> = serde_json::from_str(DEPENDENCY_VERSIONS)
                .unwrap_or_else(|_| {
                    vec![PackageVersion::new(
                        env!("CARGO_PKG_NAME"),
                        env!("CARGO_PKG_VERSION"),
                    )]
                });
            Self::new(packages)
        })
    }

    pub fn packages(&self) -> &[PackageVersion] {
        &self.packages
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Hex BLAKE3 digest of the canonical JSON encoding of the package set.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_vec(&self.packages).unwrap_or_default();
        blake3::hash(&canonical).to_hex().to_string()
    }
}

/// Version string of this library, qualified by the build fingerprint.
///
/// Format: `{crate version}@{first 12 hex chars of the fingerprint digest}`.
pub fn version() -> String {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION
        .get_or_init(|| {
            let digest = BuildFingerprint::current().digest();
            format!("{}@{}", env!("CARGO_PKG_VERSION"), &digest[..12])
        })
        .clone()
}
