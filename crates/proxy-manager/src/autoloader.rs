//! Autoloading of generated proxy classes.
//!
//! An [`Autoloader`] is invoked with a class name the registry does not know
//! yet and is expected to define it. [`ProxyAutoloader`] loads class files
//! written by the file-writer generator strategy, as located by
//! [`FileLocator`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::descriptor::ClassDescriptor;
use crate::error::{ProxyError, ProxyResult};
use crate::identifier::NAMESPACE_SEPARATOR;
use crate::inflector::ClassNameInflector;
use crate::registry::ClassRegistry;

/// Extension of generated class files.
pub const PROXY_FILE_EXTENSION: &str = "json";

/// Hook invoked when a referenced class is not defined.
///
/// Returns `Ok(true)` when the class is now defined, `Ok(false)` when this
/// autoloader does not handle the name.
pub trait Autoloader: Send + Sync {
    fn load(&self, class_name: &str) -> ProxyResult<bool>;
}

impl<F> Autoloader for F
where
    F: Fn(&str) -> ProxyResult<bool> + Send + Sync,
{
    fn load(&self, class_name: &str) -> ProxyResult<bool> {
        self(class_name)
    }
}

// ── File Locator ───────────────────────────────────────────────────────

/// Maps class names to files inside a proxies directory.
#[derive(Clone, Debug)]
pub struct FileLocator {
    proxies_directory: PathBuf,
}

impl FileLocator {
    /// Locator over an existing directory.
    pub fn new(proxies_directory: impl AsRef<Path>) -> ProxyResult<Self> {
        let dir = proxies_directory.as_ref();
        let proxies_directory = dir
            .canonicalize()
            .ok()
            .filter(|path| path.is_dir())
            .ok_or_else(|| ProxyError::InvalidProxyDirectory(dir.display().to_string()))?;
        Ok(Self { proxies_directory })
    }

    /// Locator over `proxies_directory` without checking that it exists.
    pub(crate) fn unchecked(proxies_directory: PathBuf) -> Self {
        Self { proxies_directory }
    }

    pub fn proxies_directory(&self) -> &Path {
        &self.proxies_directory
    }

    /// `{dir}/{class name without separators}.json`
    pub fn get_proxy_file_name(&self, class_name: &str) -> PathBuf {
        let file_stem: String = class_name
            .chars()
            .filter(|c| *c != NAMESPACE_SEPARATOR)
            .collect();
        self.proxies_directory
            .join(format!("{}.{}", file_stem, PROXY_FILE_EXTENSION))
    }
}

// ── Proxy Autoloader ───────────────────────────────────────────────────

/// Loads proxy class files into a registry.
pub struct ProxyAutoloader {
    locator: FileLocator,
    inflector: Arc<dyn ClassNameInflector>,
    registry: Arc<ClassRegistry>,
}

impl ProxyAutoloader {
    pub fn new(
        locator: FileLocator,
        inflector: Arc<dyn ClassNameInflector>,
        registry: Arc<ClassRegistry>,
    ) -> Self {
        Self {
            locator,
            inflector,
            registry,
        }
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }
}

impl Autoloader for ProxyAutoloader {
    fn load(&self, class_name: &str) -> ProxyResult<bool> {
        let class_name = class_name.trim_start_matches(NAMESPACE_SEPARATOR);

        if self.registry.contains(class_name) {
            return Ok(true);
        }

        if !self.inflector.is_proxy_class_name(class_name) {
            debug!(class = %class_name, "Not a proxy class, skipping");
            return Ok(false);
        }

        let file = self.locator.get_proxy_file_name(class_name);
        if !file.is_file() {
            debug!(class = %class_name, file = %file.display(), "Proxy file not found");
            return Ok(false);
        }

        let contents = std::fs::read_to_string(&file)?;
        let class: ClassDescriptor = serde_json::from_str(&contents)?;
        if class.name() != class_name {
            warn!(
                class = %class_name,
                found = class.name(),
                file = %file.display(),
                "Proxy file defines a different class"
            );
            return Ok(false);
        }

        self.registry.define(class);
        info!(class = %class_name, file = %file.display(), "Autoloaded proxy class");
        Ok(true)
    }
}
