//! Error types for proxy resolution, generation and initialization.

use thiserror::Error;

/// Errors surfaced by the proxy factory and its collaborators.
///
/// None of these are recovered internally: every failure is terminal for the
/// call that produced it.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The inflector produced a name that is not a valid class path.
    #[error("Invalid class name: '{0}'")]
    InvalidClassName(String),

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// The source class cannot be proxied (final, or abstract protected members).
    #[error("Class '{class_name}' cannot be proxied: {reason}")]
    InvalidProxiedClass { class_name: String, reason: String },

    /// The generator strategy could not produce a loadable artifact.
    #[error("Proxy generation failed for '{class_name}': {reason}")]
    GenerationFailed { class_name: String, reason: String },

    #[error("Missing signature property '{property}' on class '{class_name}'")]
    MissingSignature {
        class_name: String,
        property: String,
        expected: String,
    },

    #[error(
        "Invalid signature on class '{class_name}': property '{property}' is '{found}', expected '{expected}'"
    )]
    InvalidSignature {
        class_name: String,
        property: String,
        expected: String,
        found: String,
    },

    /// The autoloader hook returned `false`, or the class stayed undefined.
    #[error("Autoloading failed for class '{0}'")]
    AutoloadFailed(String),

    #[error("Invalid proxy directory: {0}")]
    InvalidProxyDirectory(String),

    #[error("Proxy '{class_name}' has no initializer attached")]
    MissingInitializer { class_name: String },

    #[error("Initializer of proxy '{class_name}' failed during '{method}'")]
    InitializerFailed {
        class_name: String,
        method: String,
        #[source]
        source: Box<ProxyError>,
    },

    /// Failure reported by user initialization code.
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;
