//! Generator strategies: turn a class descriptor into a loadable artifact.
//!
//! - [`BaseGeneratorStrategy`] renders the class source only.
//! - [`EvaluatingGeneratorStrategy`] defines the class in a registry at once.
//! - [`FileWriterGeneratorStrategy`] persists the descriptor where a
//!   [`ProxyAutoloader`](crate::autoloader::ProxyAutoloader) can find it,
//!   then defines it like the evaluating strategy.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info};

use crate::autoloader::FileLocator;
use crate::config::Configuration;
use crate::descriptor::ClassDescriptor;
use crate::error::{ProxyError, ProxyResult};
use crate::registry::ClassRegistry;

/// Strategy producing loadable artifacts from class descriptors.
pub trait GeneratorStrategy: Send + Sync {
    /// Generate the artifact for `class`; returns the rendered source.
    fn generate(&self, class: &ClassDescriptor) -> ProxyResult<String>;

    /// Whether `class_name` is defined, or can be autoloaded, under `configuration`.
    ///
    /// Autoloader errors (an unreadable or corrupt class file) are returned,
    /// not treated as a missing class.
    fn class_exists(&self, class_name: &str, configuration: &Configuration) -> ProxyResult<bool> {
        if configuration.class_registry().contains(class_name) {
            return Ok(true);
        }
        let loaded = configuration.proxy_autoloader().load(class_name)?;
        Ok(loaded && configuration.class_registry().contains(class_name))
    }

    /// Name of this strategy for logging.
    fn name(&self) -> &str;
}

// ── Base ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default)]
pub struct BaseGeneratorStrategy;

impl GeneratorStrategy for BaseGeneratorStrategy {
    fn generate(&self, class: &ClassDescriptor) -> ProxyResult<String> {
        Ok(class.to_source())
    }

    fn name(&self) -> &str {
        "base"
    }
}

// ── Evaluating ─────────────────────────────────────────────────────────

/// Defines generated classes directly in a registry.
pub struct EvaluatingGeneratorStrategy {
    registry: Arc<ClassRegistry>,
}

impl EvaluatingGeneratorStrategy {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }
}

impl GeneratorStrategy for EvaluatingGeneratorStrategy {
    fn generate(&self, class: &ClassDescriptor) -> ProxyResult<String> {
        let source = class.to_source();
        self.registry.define(class.clone());
        debug!(class = class.name(), "Evaluated generated class");
        Ok(source)
    }

    fn name(&self) -> &str {
        "evaluating"
    }
}

// ── File Writer ────────────────────────────────────────────────────────

/// Writes serialized descriptors into the proxies directory and defines
/// them in a registry.
///
/// Files are written to a temporary file in the same directory and then
/// renamed over the target, so readers never observe a partial file.
pub struct FileWriterGeneratorStrategy {
    locator: FileLocator,
    registry: Arc<ClassRegistry>,
}

impl FileWriterGeneratorStrategy {
    pub fn new(locator: FileLocator, registry: Arc<ClassRegistry>) -> Self {
        Self { locator, registry }
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    fn write_atomically(&self, class: &ClassDescriptor) -> ProxyResult<std::path::PathBuf> {
        let target = self.locator.get_proxy_file_name(class.name());
        let contents = serde_json::to_vec_pretty(class)?;

        let mut tmp = tempfile::NamedTempFile::new_in(self.locator.proxies_directory())?;
        tmp.write_all(&contents)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| ProxyError::Io(e.error))?;
        Ok(target)
    }
}

impl GeneratorStrategy for FileWriterGeneratorStrategy {
    fn generate(&self, class: &ClassDescriptor) -> ProxyResult<String> {
        let source = class.to_source();
        let target = self
            .write_atomically(class)
            .map_err(|e| ProxyError::GenerationFailed {
                class_name: class.name().to_string(),
                reason: e.to_string(),
            })?;
        self.registry.define(class.clone());
        info!(class = class.name(), file = %target.display(), "Wrote proxy class file");
        Ok(source)
    }

    fn name(&self) -> &str {
        "file-writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class() -> ClassDescriptor {
        ClassDescriptor::new("Gen\\__PM__\\Foo\\Generated01").with_parent("Foo")
    }

    #[test]
    fn base_strategy_renders_only() {
        let strategy = BaseGeneratorStrategy;
        let source = strategy.generate(&class()).unwrap();
        assert!(source.contains("class Generated01 extends \\Foo"));
        assert_eq!(strategy.name(), "base");
    }

    #[test]
    fn evaluating_strategy_defines_class() {
        let registry = Arc::new(ClassRegistry::new());
        let strategy = EvaluatingGeneratorStrategy::new(Arc::clone(&registry));
        strategy.generate(&class()).unwrap();
        assert!(registry.contains(class().name()));
    }

    #[test]
    fn class_exists_consults_configuration_registry() {
        let config = Configuration::default();
        let strategy = BaseGeneratorStrategy;
        assert!(!strategy.class_exists(class().name(), &config).unwrap());
        config.class_registry().define(class());
        assert!(strategy.class_exists(class().name(), &config).unwrap());
    }

    #[test]
    fn class_exists_autoloads_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = crate::config::ProxySettings {
            proxies_namespace: "Gen".into(),
            proxies_target_dir: Some(dir.path().to_path_buf()),
            generator: crate::config::GeneratorKind::FileWriter,
            autoload_proxies: true,
        };
        let writer = Configuration::from_settings(&settings).unwrap();
        writer.generator_strategy().generate(&class()).unwrap();

        let reader = Configuration::from_settings(&settings).unwrap();
        assert!(!reader.class_registry().contains(class().name()));
        assert!(reader
            .generator_strategy()
            .class_exists(class().name(), &reader)
            .unwrap());
        assert!(reader.class_registry().contains(class().name()));
    }

    #[test]
    fn class_exists_reports_corrupt_class_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = crate::config::ProxySettings {
            proxies_namespace: "Gen".into(),
            proxies_target_dir: Some(dir.path().to_path_buf()),
            generator: crate::config::GeneratorKind::FileWriter,
            autoload_proxies: true,
        };
        let config = Configuration::from_settings(&settings).unwrap();
        let file = FileLocator::new(dir.path())
            .unwrap()
            .get_proxy_file_name(class().name());
        std::fs::write(file, "{truncated").unwrap();

        assert!(matches!(
            config.generator_strategy().class_exists(class().name(), &config),
            Err(ProxyError::Serialization(_))
        ));
    }

    fn file_writer(dir: &std::path::Path) -> (FileWriterGeneratorStrategy, Arc<ClassRegistry>) {
        let registry = Arc::new(ClassRegistry::new());
        let strategy =
            FileWriterGeneratorStrategy::new(FileLocator::new(dir).unwrap(), Arc::clone(&registry));
        (strategy, registry)
    }

    #[test]
    fn file_writer_persists_and_defines_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let (strategy, registry) = file_writer(dir.path());
        strategy.generate(&class()).unwrap();

        let file = strategy.locator().get_proxy_file_name(class().name());
        let stored: ClassDescriptor =
            serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(stored, class());
        assert_eq!(registry.get(class().name()).as_deref(), Some(&class()));
    }

    #[test]
    fn file_writer_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (strategy, _) = file_writer(dir.path());
        strategy.generate(&class()).unwrap();
        strategy.generate(&class().with_interface("Lazy")).unwrap();

        let file = strategy.locator().get_proxy_file_name(class().name());
        let stored: ClassDescriptor =
            serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(stored.interfaces(), ["Lazy".to_string()]);
    }

    #[test]
    fn file_writer_reports_generation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (strategy, registry) = file_writer(dir.path());
        drop(dir);

        assert!(matches!(
            strategy.generate(&class()),
            Err(ProxyError::GenerationFailed { .. })
        ));
        assert!(!registry.contains(class().name()));
    }
}
