//! Lazy-loading value holder factory: resolves proxy classes and instantiates them.
//!
//! Pipeline for a requested class:
//! 1. Build proxy parameters and derive the proxy class name
//! 2. Ask the generator strategy whether the proxy class exists
//! 3. If not: look up the user class, generate the proxy members, sign the
//!    class, hand it to the generator strategy and autoload it
//! 4. Resolve the class from the registry and check its signature
//! 5. Instantiate a proxy with the initializer attached

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::config::Configuration;
use crate::descriptor::ClassDescriptor;
use crate::error::{ProxyError, ProxyResult};
use crate::identifier::is_valid_class_name;
use crate::parameters::{ParameterHasher, ProxyOptions, ProxyParameters};
use crate::proxy_generator::{LazyLoadingValueHolderGenerator, ProxyGenerator};
use crate::value_holder::{Initializer, ValueHolderProxy};

/// Where a proxy request is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    Unresolved,
    Resolving,
    /// The proxy class was already loadable.
    ResolvedExisting,
    /// The proxy class was generated by this request.
    ResolvedGenerated,
    Instantiated,
}

impl std::fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionState::Unresolved => "unresolved",
            ResolutionState::Resolving => "resolving",
            ResolutionState::ResolvedExisting => "resolved-existing",
            ResolutionState::ResolvedGenerated => "resolved-generated",
            ResolutionState::Instantiated => "instantiated",
        };
        f.write_str(s)
    }
}

/// A resolved proxy class.
#[derive(Clone, Debug)]
pub struct ResolvedProxy {
    pub class: Arc<ClassDescriptor>,
    pub state: ResolutionState,
}

// ── Core ───────────────────────────────────────────────────────────────

/// Proxy class resolution shared by factories.
pub struct ProxyFactoryCore {
    configuration: Arc<Configuration>,
    /// Parameter hash → proxy class name of already checked classes.
    checked_classes: DashMap<String, String>,
    generation_lock: Mutex<()>,
    factory_name: String,
}

impl ProxyFactoryCore {
    pub fn new(configuration: Arc<Configuration>, factory_name: impl Into<String>) -> Self {
        Self {
            configuration,
            checked_classes: DashMap::new(),
            generation_lock: Mutex::new(()),
            factory_name: factory_name.into(),
        }
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn factory_name(&self) -> &str {
        &self.factory_name
    }

    /// Resolve (generating if needed) the proxy class for `class_name`.
    pub fn generate_proxy(
        &self,
        class_name: &str,
        options: &ProxyOptions,
        generator: &dyn ProxyGenerator,
    ) -> ProxyResult<ResolvedProxy> {
        let config = &self.configuration;
        let parameters = ProxyParameters::for_class(class_name, &self.factory_name, options);
        let cache_key = ParameterHasher::hash(&parameters)?;

        if let Some(proxy_name) = self.checked_classes.get(&cache_key).map(|e| e.value().clone()) {
            debug!(class = %class_name, proxy = %proxy_name, "Proxy class cache hit");
            let class = config
                .class_registry()
                .resolve(&proxy_name, config.proxy_autoloader().as_ref())?;
            return Ok(ResolvedProxy {
                class,
                state: ResolutionState::ResolvedExisting,
            });
        }

        debug!(class = %class_name, state = %ResolutionState::Resolving, "Resolving proxy class");
        let proxy_name = config
            .class_name_inflector()
            .get_proxy_class_name(class_name, &parameters);
        if !is_valid_class_name(&proxy_name) {
            return Err(ProxyError::InvalidClassName(proxy_name));
        }

        let strategy = config.generator_strategy();
        let mut state = ResolutionState::ResolvedExisting;
        if !strategy.class_exists(&proxy_name, config)? {
            let _guard = self
                .generation_lock
                .lock()
                .map_err(|_| ProxyError::LockPoisoned)?;
            // Another request may have generated the class while we waited.
            if !config.class_registry().contains(&proxy_name) {
                self.generate_proxy_class(class_name, &proxy_name, &parameters, generator)?;
                state = ResolutionState::ResolvedGenerated;
            }
        }
        debug!(proxy = %proxy_name, state = %state, "Proxy class resolved");

        let class = config
            .class_registry()
            .resolve(&proxy_name, config.proxy_autoloader().as_ref())?;
        config.signature_checker().check_signature(&class, &parameters)?;

        self.checked_classes.insert(cache_key, proxy_name);
        Ok(ResolvedProxy { class, state })
    }

    fn generate_proxy_class(
        &self,
        class_name: &str,
        proxy_name: &str,
        parameters: &ProxyParameters,
        generator: &dyn ProxyGenerator,
    ) -> ProxyResult<()> {
        let config = &self.configuration;
        let user_name = config.class_name_inflector().get_user_class_name(class_name);
        let original = config
            .class_registry()
            .get(&user_name)
            .ok_or_else(|| ProxyError::ClassNotFound(user_name.clone()))?;

        let proxy = generator.generate(&original, ClassDescriptor::new(proxy_name), parameters)?;
        let proxy = config
            .class_signature_generator()
            .add_signature(proxy, parameters)?;
        config.generator_strategy().generate(&proxy)?;

        if !config.proxy_autoloader().load(proxy_name)? {
            return Err(ProxyError::AutoloadFailed(proxy_name.to_string()));
        }

        info!(
            class = %user_name,
            proxy = %proxy_name,
            strategy = config.generator_strategy().name(),
            "Generated proxy class"
        );
        Ok(())
    }

    /// Number of classes resolved by this factory so far.
    pub fn checked_class_count(&self) -> usize {
        self.checked_classes.len()
    }
}

// ── Lazy-loading value holder factory ──────────────────────────────────

/// Creates lazy-loading value holder proxies.
pub struct LazyLoadingValueHolderFactory {
    core: ProxyFactoryCore,
    generator: Arc<dyn ProxyGenerator>,
}

impl LazyLoadingValueHolderFactory {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self::with_generator(
            configuration,
            Arc::new(LazyLoadingValueHolderGenerator::new()),
        )
    }

    /// Factory using a custom proxy generator.
    pub fn with_generator(
        configuration: Arc<Configuration>,
        generator: Arc<dyn ProxyGenerator>,
    ) -> Self {
        Self {
            core: ProxyFactoryCore::new(
                configuration,
                std::any::type_name::<LazyLoadingValueHolderFactory>(),
            ),
            generator,
        }
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        self.core.configuration()
    }

    pub fn core(&self) -> &ProxyFactoryCore {
        &self.core
    }

    /// Create a proxy for `class_name` whose value is produced by `initializer`.
    pub fn create_proxy<T>(
        &self,
        class_name: &str,
        initializer: Initializer<T>,
    ) -> ProxyResult<ValueHolderProxy<T>> {
        self.create_proxy_with_options(class_name, initializer, &ProxyOptions::new())
    }

    pub fn create_proxy_with_options<T>(
        &self,
        class_name: &str,
        initializer: Initializer<T>,
        options: &ProxyOptions,
    ) -> ProxyResult<ValueHolderProxy<T>> {
        let resolved = self
            .core
            .generate_proxy(class_name, options, self.generator.as_ref())?;
        debug!(
            class = %class_name,
            proxy = resolved.class.name(),
            state = %ResolutionState::Instantiated,
            "Instantiating proxy"
        );
        Ok(ValueHolderProxy::new(resolved.class, initializer))
    }
}

impl Default for LazyLoadingValueHolderFactory {
    fn default() -> Self {
        Self::new(Arc::new(Configuration::default()))
    }
}
