//! Records the dependency-version set of the build.
//!
//! The resolved `Cargo.lock` of the workspace is flattened into a sorted JSON
//! list of `{name, version}` entries and exposed to the crate as
//! `PROXY_MANAGER_DEPENDENCY_VERSIONS`. Identifiers derived from it change
//! whenever any locked dependency changes.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
struct LockedPackage {
    name: String,
    version: String,
}

fn find_lockfile(manifest_dir: &Path) -> Option<PathBuf> {
    manifest_dir
        .ancestors()
        .map(|dir| dir.join("Cargo.lock"))
        .find(|candidate| candidate.is_file())
}

fn locked_packages(lockfile: &Path) -> Vec<LockedPackage> {
    fs::read_to_string(lockfile)
        .ok()
        .and_then(|contents| toml::from_str::<Lockfile>(&contents).ok())
        .map(|lock| lock.package)
        .unwrap_or_default()
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());

    let mut packages = match find_lockfile(&manifest_dir) {
        Some(lockfile) => {
            println!("cargo:rerun-if-changed={}", lockfile.display());
            locked_packages(&lockfile)
        }
        None => Vec::new(),
    };

    // Without a lockfile the crate itself is the whole fingerprint.
    if packages.is_empty() {
        packages.push(LockedPackage {
            name: env::var("CARGO_PKG_NAME").unwrap_or_default(),
            version: env::var("CARGO_PKG_VERSION").unwrap_or_default(),
        });
    }
    packages.sort();
    packages.dedup();

    let encoded = serde_json::to_string(&packages).unwrap_or_else(|_| "[]".to_string());
    println!("cargo:rustc-env=PROXY_MANAGER_DEPENDENCY_VERSIONS={}", encoded);
    println!("cargo:rerun-if-changed=build.rs");
}
