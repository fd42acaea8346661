//! Proxy parameters and their hashing and encoding.
//!
//! Parameters identify *how* a proxy was produced: the source class, the
//! factory, the library version and any proxy options. The inflector hashes
//! them into the proxy class name and the signature embeds them in the class.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProxyResult;

pub const CLASS_NAME_KEY: &str = "className";
pub const FACTORY_KEY: &str = "factory";
pub const VERSION_KEY: &str = "proxyManagerVersion";
pub const OPTIONS_KEY: &str = "proxyOptions";

/// Options passed through a factory into the generated proxy.
pub type ProxyOptions = BTreeMap<String, Value>;

/// Ordered parameter map; ordering keeps hashing and encoding canonical.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyParameters(BTreeMap<String, Value>);

impl ProxyParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard parameters for a factory-produced proxy.
    pub fn for_class(class_name: &str, factory: &str, options: &ProxyOptions) -> Self {
        let params = Self::new()
            .with(CLASS_NAME_KEY, class_name)
            .with(FACTORY_KEY, factory)
            .with(VERSION_KEY, crate::version::version());
        if options.is_empty() {
            params
        } else {
            params.with(
                OPTIONS_KEY,
                Value::Object(options.clone().into_iter().collect()),
            )
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn class_name(&self) -> Option<&str> {
        self.get(CLASS_NAME_KEY).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn canonical_bytes(&self) -> ProxyResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}

/// Hashes parameters into a short hex token usable inside identifiers.
pub struct ParameterHasher;

impl ParameterHasher {
    /// Length of the returned hex token.
    pub const HASH_LENGTH: usize = 32;

    pub fn hash(parameters: &ProxyParameters) -> ProxyResult<String> {
        let digest = blake3::hash(&parameters.canonical_bytes()?).to_hex();
        Ok(digest.as_str()[..Self::HASH_LENGTH].to_string())
    }
}

/// Reversible encoding of parameters (base64 of canonical JSON).
pub struct ParameterEncoder;

impl ParameterEncoder {
    pub fn encode(parameters: &ProxyParameters) -> ProxyResult<String> {
        Ok(STANDARD.encode(parameters.canonical_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProxyParameters {
        ProxyParameters::new()
            .with(CLASS_NAME_KEY, "App\\Mailer")
            .with(FACTORY_KEY, "test")
    }

    #[test]
    fn for_class_sets_standard_keys() {
        let params = ProxyParameters::for_class("Foo", "factory", &ProxyOptions::new());
        assert_eq!(params.class_name(), Some("Foo"));
        assert_eq!(params.get(FACTORY_KEY), Some(&Value::from("factory")));
        assert!(params.get(VERSION_KEY).is_some());
        assert!(params.get(OPTIONS_KEY).is_none());
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn options_are_nested() {
        let mut options = ProxyOptions::new();
        options.insert("skipDestructor".into(), Value::Bool(true));
        let params = ProxyParameters::for_class("Foo", "factory", &options);
        assert_eq!(params.get(OPTIONS_KEY).and_then(|o| o.get("skipDestructor")), Some(&Value::Bool(true)));
    }

    #[test]
    fn hash_is_stable_and_insertion_order_free() {
        let a = sample();
        let b = ProxyParameters::new()
            .with(FACTORY_KEY, "test")
            .with(CLASS_NAME_KEY, "App\\Mailer");
        let hash = ParameterHasher::hash(&a).unwrap();
        assert_eq!(hash, ParameterHasher::hash(&b).unwrap());
        assert_eq!(hash.len(), ParameterHasher::HASH_LENGTH);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_differs_per_parameter_set() {
        let other = sample().with(FACTORY_KEY, "other");
        assert_ne!(
            ParameterHasher::hash(&sample()).unwrap(),
            ParameterHasher::hash(&other).unwrap()
        );
    }

    #[test]
    fn encoder_emits_base64_of_canonical_json() {
        let encoded = ParameterEncoder::encode(&sample()).unwrap();
        let bytes = STANDARD.decode(&encoded).unwrap();
        assert_eq!(bytes, sample().canonical_bytes().unwrap());
    }
}
