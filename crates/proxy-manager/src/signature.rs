//! Integrity signatures embedded in generated proxy classes.
//!
//! A signature is a private static property `signature{key}` whose default
//! value is the encoded proxy parameters; `key` is the parameter hash. A class
//! whose signature is missing or does not match the parameters it is resolved
//! with must not be trusted.

use serde_json::Value;
use tracing::warn;

use crate::descriptor::{ClassDescriptor, PropertyDescriptor};
use crate::error::{ProxyError, ProxyResult};
use crate::parameters::{ParameterEncoder, ParameterHasher, ProxyParameters};

/// Prefix of the signature property name.
pub const SIGNATURE_PROPERTY_PREFIX: &str = "signature";

/// Computes signature values and property keys from proxy parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignatureGenerator;

impl SignatureGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_signature(&self, parameters: &ProxyParameters) -> ProxyResult<String> {
        ParameterEncoder::encode(parameters)
    }

    pub fn generate_signature_key(&self, parameters: &ProxyParameters) -> ProxyResult<String> {
        ParameterHasher::hash(parameters)
    }

    /// Full name of the signature property for `parameters`.
    pub fn signature_property(&self, parameters: &ProxyParameters) -> ProxyResult<String> {
        Ok(format!(
            "{}{}",
            SIGNATURE_PROPERTY_PREFIX,
            self.generate_signature_key(parameters)?
        ))
    }
}

/// Attaches a signature to a class descriptor.
pub trait ClassSignatureGenerator: Send + Sync {
    fn add_signature(
        &self,
        class: ClassDescriptor,
        parameters: &ProxyParameters,
    ) -> ProxyResult<ClassDescriptor>;
}

/// Verifies the signature of a resolved class.
pub trait SignatureChecker: Send + Sync {
    fn check_signature(
        &self,
        class: &ClassDescriptor,
        parameters: &ProxyParameters,
    ) -> ProxyResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct DefaultClassSignatureGenerator {
    generator: SignatureGenerator,
}

impl DefaultClassSignatureGenerator {
    pub fn new(generator: SignatureGenerator) -> Self {
        Self { generator }
    }
}

impl ClassSignatureGenerator for DefaultClassSignatureGenerator {
    fn add_signature(
        &self,
        class: ClassDescriptor,
        parameters: &ProxyParameters,
    ) -> ProxyResult<ClassDescriptor> {
        let property = PropertyDescriptor::private(self.generator.signature_property(parameters)?)
            .with_static()
            .with_default(self.generator.generate_signature(parameters)?)
            .with_doc("Signature of the parameters this class was generated with");
        Ok(class.with_property(property))
    }
}

#[derive(Clone, Debug, Default)]
pub struct DefaultSignatureChecker {
    generator: SignatureGenerator,
}

impl DefaultSignatureChecker {
    pub fn new(generator: SignatureGenerator) -> Self {
        Self { generator }
    }
}

impl SignatureChecker for DefaultSignatureChecker {
    fn check_signature(
        &self,
        class: &ClassDescriptor,
        parameters: &ProxyParameters,
    ) -> ProxyResult<()> {
        let property = self.generator.signature_property(parameters)?;
        let expected = self.generator.generate_signature(parameters)?;

        let Some(found) = class.property(&property) else {
            warn!(class = class.name(), property = %property, "Missing proxy signature");
            return Err(ProxyError::MissingSignature {
                class_name: class.name().to_string(),
                property,
                expected,
            });
        };

        match &found.default_value {
            Some(Value::String(value)) if found.is_static && *value == expected => Ok(()),
            other => {
                let found = match other {
                    Some(Value::String(value)) => value.clone(),
                    Some(value) => value.to_string(),
                    None => String::new(),
                };
                warn!(class = class.name(), property = %property, "Proxy signature mismatch");
                Err(ProxyError::InvalidSignature {
                    class_name: class.name().to_string(),
                    property,
                    expected,
                    found,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ProxyParameters {
        ProxyParameters::new()
            .with("className", "App\\Mailer")
            .with("factory", "test")
    }

    fn signed() -> ClassDescriptor {
        DefaultClassSignatureGenerator::default()
            .add_signature(ClassDescriptor::new("Proxy"), &params())
            .unwrap()
    }

    #[test]
    fn signature_property_is_private_static() {
        let class = signed();
        let name = SignatureGenerator::new().signature_property(&params()).unwrap();
        let property = class.property(&name).unwrap();
        assert!(property.is_static);
        assert_eq!(property.visibility, crate::descriptor::Visibility::Private);
        assert!(name.starts_with(SIGNATURE_PROPERTY_PREFIX));
    }

    #[test]
    fn signed_class_passes_check() {
        assert!(DefaultSignatureChecker::default()
            .check_signature(&signed(), &params())
            .is_ok());
    }

    #[test]
    fn unsigned_class_is_missing_signature() {
        let result =
            DefaultSignatureChecker::default().check_signature(&ClassDescriptor::new("Proxy"), &params());
        assert!(matches!(result, Err(ProxyError::MissingSignature { .. })));
    }

    #[test]
    fn different_parameters_do_not_match() {
        let other = params().with("factory", "other");
        let result = DefaultSignatureChecker::default().check_signature(&signed(), &other);
        assert!(matches!(result, Err(ProxyError::MissingSignature { .. })));
    }

    #[test]
    fn tampered_value_is_invalid() {
        let name = SignatureGenerator::new().signature_property(&params()).unwrap();
        let tampered = signed().with_property(
            PropertyDescriptor::private(name)
                .with_static()
                .with_default("tampered"),
        );
        match DefaultSignatureChecker::default().check_signature(&tampered, &params()) {
            Err(ProxyError::InvalidSignature { found, .. }) => assert_eq!(found, "tampered"),
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn non_static_signature_is_invalid() {
        let name = SignatureGenerator::new().signature_property(&params()).unwrap();
        let value = SignatureGenerator::new().generate_signature(&params()).unwrap();
        let class = ClassDescriptor::new("Proxy")
            .with_property(PropertyDescriptor::private(name).with_default(value));
        assert!(matches!(
            DefaultSignatureChecker::default().check_signature(&class, &params()),
            Err(ProxyError::InvalidSignature { .. })
        ));
    }
}
