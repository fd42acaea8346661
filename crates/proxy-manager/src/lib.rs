//! # proxy-manager
//!
//! **Lazy-loading value holder proxies** over a class registry.
//!
//! A factory derives a deterministic proxy class name for a requested class,
//! generates the proxy class when it does not exist yet, signs it with the
//! parameters it was generated with, and hands out proxy instances whose
//! wrapped value is produced by an initializer on first access.
//!
//! ## Architecture
//!
//! ```text
//! create_proxy(class, initializer)
//!     │
//!     ▼
//! LazyLoadingValueHolderFactory
//!     │─── proxy name (ClassNameInflector)
//!     │─── exists? (GeneratorStrategy::class_exists)
//!     │─── generate members (ProxyGenerator)
//!     │─── sign (ClassSignatureGenerator)
//!     │─── emit (GeneratorStrategy: evaluating | file writer)
//!     │─── load (Autoloader → ClassRegistry)
//!     │─── verify (SignatureChecker)
//!     ▼
//! ValueHolderProxy<T> (initializer attached, value deferred)
//! ```
//!
//! ## Traits
//!
//! - [`ClassNameInflector`]: proxy ↔ user class names
//! - [`GeneratorStrategy`]: turns descriptors into loadable classes
//! - [`Autoloader`]: defines classes the registry misses
//! - [`ClassSignatureGenerator`] / [`SignatureChecker`]: parameter signatures
//!
//! All are wired through [`Configuration`].

#![deny(unsafe_code)]

pub mod autoloader;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod generator_strategy;
pub mod identifier;
pub mod inflector;
pub mod logging;
pub mod parameters;
pub mod proxy_generator;
pub mod registry;
pub mod signature;
pub mod value_holder;
pub mod version;

// Re-exports
pub use autoloader::{Autoloader, FileLocator, ProxyAutoloader};
pub use config::{Configuration, ConfigurationBuilder, GeneratorKind, ProxySettings};
pub use descriptor::{
    ClassDescriptor, ClassFlags, MethodDescriptor, ParameterDescriptor, PropertyDescriptor,
    Visibility,
};
pub use error::{ProxyError, ProxyResult};
pub use factory::{LazyLoadingValueHolderFactory, ProxyFactoryCore, ResolutionState, ResolvedProxy};
pub use generator_strategy::{
    BaseGeneratorStrategy, EvaluatingGeneratorStrategy, FileWriterGeneratorStrategy,
    GeneratorStrategy,
};
pub use identifier::{IdentifierSuffixer, UniqueIdentifierGenerator};
pub use inflector::{ClassNameInflector, DefaultClassNameInflector};
pub use parameters::{ParameterEncoder, ParameterHasher, ProxyOptions, ProxyParameters};
pub use proxy_generator::{LazyLoadingValueHolderGenerator, ProxiedClassValidator, ProxyGenerator};
pub use registry::ClassRegistry;
pub use signature::{
    ClassSignatureGenerator, DefaultClassSignatureGenerator, DefaultSignatureChecker,
    SignatureChecker, SignatureGenerator,
};
pub use value_holder::{
    initializer, InitializationContext, Initializer, LazyLoading, ValueHolder, ValueHolderProxy,
};
pub use version::BuildFingerprint;
