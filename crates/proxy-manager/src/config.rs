//! Configuration for proxy factories
//!
//! [`Configuration`] wires together the collaborators a factory uses.
//! [`ProxySettings`] is the file/environment-facing subset, loaded with the
//! `config` crate and turned into a [`Configuration`] by
//! [`Configuration::from_settings`].

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::autoloader::{Autoloader, FileLocator, ProxyAutoloader};
use crate::error::ProxyResult;
use crate::generator_strategy::{
    EvaluatingGeneratorStrategy, FileWriterGeneratorStrategy, GeneratorStrategy,
};
use crate::inflector::{ClassNameInflector, DefaultClassNameInflector};
use crate::registry::ClassRegistry;
use crate::signature::{
    ClassSignatureGenerator, DefaultClassSignatureGenerator, DefaultSignatureChecker,
    SignatureChecker, SignatureGenerator,
};

/// Namespace generated proxies live under unless configured otherwise.
pub const DEFAULT_PROXIES_NAMESPACE: &str = "ProxyManagerGeneratedProxy";

/// Prefix of environment variables read by [`ProxySettings::load`].
pub const ENV_PREFIX: &str = "PROXY_MANAGER";

// ── Configuration ──────────────────────────────────────────────────────

/// Collaborators shared by proxy factories. Read-only once built.
#[derive(Clone)]
pub struct Configuration {
    proxies_namespace: String,
    class_name_inflector: Arc<dyn ClassNameInflector>,
    generator_strategy: Arc<dyn GeneratorStrategy>,
    proxy_autoloader: Arc<dyn Autoloader>,
    signature_checker: Arc<dyn SignatureChecker>,
    class_signature_generator: Arc<dyn ClassSignatureGenerator>,
    class_registry: Arc<ClassRegistry>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Build a configuration from loaded settings.
    pub fn from_settings(settings: &ProxySettings) -> ProxyResult<Self> {
        let mut builder = Self::builder().with_proxies_namespace(settings.proxies_namespace.clone());

        let locator = match &settings.proxies_target_dir {
            Some(dir) => FileLocator::new(dir)?,
            None => FileLocator::unchecked(std::env::temp_dir()),
        };

        let registry = Arc::new(ClassRegistry::new());
        builder = builder.with_class_registry(Arc::clone(&registry));

        if settings.generator == GeneratorKind::FileWriter {
            builder = builder.with_generator_strategy(Arc::new(FileWriterGeneratorStrategy::new(
                locator.clone(),
                Arc::clone(&registry),
            )));
        }

        if settings.autoload_proxies {
            let inflector = DefaultClassNameInflector::new(settings.proxies_namespace.clone());
            builder = builder.with_proxy_autoloader(Arc::new(ProxyAutoloader::new(
                locator,
                Arc::new(inflector),
                registry,
            )));
        } else {
            let known = registry;
            builder = builder
                .with_proxy_autoloader(Arc::new(move |name: &str| -> ProxyResult<bool> {
                    Ok(known.contains(name))
                }));
        }

        debug!(
            namespace = %settings.proxies_namespace,
            generator = ?settings.generator,
            autoload = settings.autoload_proxies,
            "Built configuration from settings"
        );
        Ok(builder.build())
    }

    pub fn proxies_namespace(&self) -> &str {
        &self.proxies_namespace
    }

    pub fn class_name_inflector(&self) -> &Arc<dyn ClassNameInflector> {
        &self.class_name_inflector
    }

    pub fn generator_strategy(&self) -> &Arc<dyn GeneratorStrategy> {
        &self.generator_strategy
    }

    pub fn proxy_autoloader(&self) -> &Arc<dyn Autoloader> {
        &self.proxy_autoloader
    }

    pub fn signature_checker(&self) -> &Arc<dyn SignatureChecker> {
        &self.signature_checker
    }

    pub fn class_signature_generator(&self) -> &Arc<dyn ClassSignatureGenerator> {
        &self.class_signature_generator
    }

    pub fn class_registry(&self) -> &Arc<ClassRegistry> {
        &self.class_registry
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("proxies_namespace", &self.proxies_namespace)
            .field("generator_strategy", &self.generator_strategy.name())
            .field("classes", &self.class_registry.len())
            .finish_non_exhaustive()
    }
}

// ── Builder ────────────────────────────────────────────────────────────

/// Builder for [`Configuration`]. Unset collaborators get defaults.
#[derive(Default)]
pub struct ConfigurationBuilder {
    proxies_namespace: Option<String>,
    proxies_target_dir: Option<PathBuf>,
    class_name_inflector: Option<Arc<dyn ClassNameInflector>>,
    generator_strategy: Option<Arc<dyn GeneratorStrategy>>,
    proxy_autoloader: Option<Arc<dyn Autoloader>>,
    signature_generator: Option<SignatureGenerator>,
    signature_checker: Option<Arc<dyn SignatureChecker>>,
    class_signature_generator: Option<Arc<dyn ClassSignatureGenerator>>,
    class_registry: Option<Arc<ClassRegistry>>,
}

impl ConfigurationBuilder {
    pub fn with_proxies_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.proxies_namespace = Some(namespace.into());
        self
    }

    /// Directory the default autoloader reads class files from.
    pub fn with_proxies_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.proxies_target_dir = Some(dir.into());
        self
    }

    pub fn with_class_name_inflector(mut self, inflector: Arc<dyn ClassNameInflector>) -> Self {
        self.class_name_inflector = Some(inflector);
        self
    }

    pub fn with_generator_strategy(mut self, strategy: Arc<dyn GeneratorStrategy>) -> Self {
        self.generator_strategy = Some(strategy);
        self
    }

    pub fn with_proxy_autoloader(mut self, autoloader: Arc<dyn Autoloader>) -> Self {
        self.proxy_autoloader = Some(autoloader);
        self
    }

    /// Signature generator of the default checker and class signature generator.
    pub fn with_signature_generator(mut self, generator: SignatureGenerator) -> Self {
        self.signature_generator = Some(generator);
        self
    }

    pub fn with_signature_checker(mut self, checker: Arc<dyn SignatureChecker>) -> Self {
        self.signature_checker = Some(checker);
        self
    }

    pub fn with_class_signature_generator(
        mut self,
        generator: Arc<dyn ClassSignatureGenerator>,
    ) -> Self {
        self.class_signature_generator = Some(generator);
        self
    }

    pub fn with_class_registry(mut self, registry: Arc<ClassRegistry>) -> Self {
        self.class_registry = Some(registry);
        self
    }

    pub fn build(self) -> Configuration {
        let proxies_namespace = self
            .proxies_namespace
            .unwrap_or_else(|| DEFAULT_PROXIES_NAMESPACE.to_string());
        let proxies_target_dir = self.proxies_target_dir.unwrap_or_else(std::env::temp_dir);
        let class_registry = self.class_registry.unwrap_or_default();
        let class_name_inflector = self.class_name_inflector.unwrap_or_else(|| {
            Arc::new(DefaultClassNameInflector::new(proxies_namespace.clone()))
        });

        let generator_strategy = self.generator_strategy.unwrap_or_else(|| {
            Arc::new(EvaluatingGeneratorStrategy::new(Arc::clone(&class_registry)))
        });
        let proxy_autoloader = self.proxy_autoloader.unwrap_or_else(|| {
            Arc::new(ProxyAutoloader::new(
                FileLocator::unchecked(proxies_target_dir),
                Arc::clone(&class_name_inflector),
                Arc::clone(&class_registry),
            ))
        });

        let signature_generator = self.signature_generator.unwrap_or_default();

        Configuration {
            proxies_namespace,
            class_name_inflector,
            generator_strategy,
            proxy_autoloader,
            signature_checker: self
                .signature_checker
                .unwrap_or_else(|| Arc::new(DefaultSignatureChecker::new(signature_generator))),
            class_signature_generator: self.class_signature_generator.unwrap_or_else(|| {
                Arc::new(DefaultClassSignatureGenerator::new(signature_generator))
            }),
            class_registry,
        }
    }
}

// ── Settings ───────────────────────────────────────────────────────────

/// Which generator strategy [`Configuration::from_settings`] installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Define generated classes in memory
    #[default]
    Evaluating,

    /// Write generated classes to the proxies directory
    FileWriter,
}

/// File/environment settings for proxy generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxySettings {
    /// Namespace prefix of generated proxy classes
    #[serde(default = "default_proxies_namespace")]
    pub proxies_namespace: String,

    /// Directory for generated class files (system temp dir when unset)
    #[serde(default)]
    pub proxies_target_dir: Option<PathBuf>,

    /// Generator strategy
    #[serde(default)]
    pub generator: GeneratorKind,

    /// Load previously written class files on demand
    #[serde(default = "default_true")]
    pub autoload_proxies: bool,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            proxies_namespace: default_proxies_namespace(),
            proxies_target_dir: None,
            generator: GeneratorKind::default(),
            autoload_proxies: true,
        }
    }
}

fn default_proxies_namespace() -> String {
    DEFAULT_PROXIES_NAMESPACE.to_string()
}

fn default_true() -> bool {
    true
}

impl ProxySettings {
    /// Load settings from defaults, an optional file, then `PROXY_MANAGER_*` variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ProxySettings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // PROXY_MANAGER_PROXIES_NAMESPACE -> proxies_namespace
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
