//! Proxy generators: fill a proxy class descriptor for a given user class.

use tracing::debug;

use crate::descriptor::{
    ClassDescriptor, MethodDescriptor, ParameterDescriptor, PropertyDescriptor, Visibility,
};
use crate::error::{ProxyError, ProxyResult};
use crate::identifier::IdentifierSuffixer;
use crate::parameters::ProxyParameters;

/// Interface implemented by every lazy-loading proxy class.
pub const LAZY_LOADING_INTERFACE: &str = "ProxyManager\\Proxy\\LazyLoading";

/// Interface implemented by every value-holder proxy class.
pub const VALUE_HOLDER_INTERFACE: &str = "ProxyManager\\Proxy\\ValueHolder";

/// Builds the members of a proxy class around an original class.
pub trait ProxyGenerator: Send + Sync {
    fn generate(
        &self,
        original: &ClassDescriptor,
        proxy: ClassDescriptor,
        parameters: &ProxyParameters,
    ) -> ProxyResult<ClassDescriptor>;
}

/// Rejects classes a proxy cannot extend.
pub struct ProxiedClassValidator;

impl ProxiedClassValidator {
    pub fn validate(original: &ClassDescriptor) -> ProxyResult<()> {
        if original.is_final() {
            return Err(ProxyError::InvalidProxiedClass {
                class_name: original.name().to_string(),
                reason: "final classes cannot be proxied".into(),
            });
        }

        let abstract_protected: Vec<&str> = original
            .methods()
            .iter()
            .filter(|m| m.is_abstract && m.visibility == Visibility::Protected)
            .map(|m| m.name.as_str())
            .collect();
        if !abstract_protected.is_empty() {
            return Err(ProxyError::InvalidProxiedClass {
                class_name: original.name().to_string(),
                reason: format!(
                    "abstract protected methods cannot be proxied: {}",
                    abstract_protected.join(", ")
                ),
            });
        }

        Ok(())
    }
}

/// Generates lazy-loading value holder proxies.
///
/// The proxy extends the original class (or implements it, for interfaces),
/// holds the wrapped value and the initializer in build-suffixed private
/// properties, and intercepts every public instance method by initializing
/// and then delegating to the wrapped value.
#[derive(Clone, Debug)]
pub struct LazyLoadingValueHolderGenerator {
    value_holder_property: String,
    initializer_property: String,
}

impl LazyLoadingValueHolderGenerator {
    pub fn new() -> Self {
        Self {
            value_holder_property: IdentifierSuffixer::get_identifier("valueHolder"),
            initializer_property: IdentifierSuffixer::get_identifier("initializer"),
        }
    }

    pub fn value_holder_property(&self) -> &str {
        &self.value_holder_property
    }

    pub fn initializer_property(&self) -> &str {
        &self.initializer_property
    }

    fn initialize_call(&self, method: &str, arguments: &str) -> String {
        format!(
            "if self.{holder} == null && self.{init} != null {{ self.{holder} = self.{init}(self, \"{method}\", [{arguments}]); }}",
            init = self.initializer_property,
            holder = self.value_holder_property,
            method = method,
            arguments = arguments,
        )
    }

    fn lifecycle_methods(&self) -> Vec<MethodDescriptor> {
        let init = &self.initializer_property;
        let holder = &self.value_holder_property;
        vec![
            MethodDescriptor::public("set_proxy_initializer")
                .with_parameter(ParameterDescriptor::typed("initializer", "?Initializer"))
                .with_body(format!("self.{} = initializer;", init)),
            MethodDescriptor::public("proxy_initializer")
                .with_return_type("?Initializer")
                .with_body(format!("return self.{};", init)),
            MethodDescriptor::public("initialize_proxy")
                .with_return_type("bool")
                .with_body(format!(
                    "{}\nreturn self.{} != null;",
                    self.initialize_call("initialize_proxy", ""),
                    holder
                )),
            MethodDescriptor::public("is_proxy_initialized")
                .with_return_type("bool")
                .with_body(format!("return self.{} != null;", holder)),
            MethodDescriptor::public("wrapped_value_holder_value")
                .with_body(format!("return self.{};", holder)),
        ]
    }

    fn interceptor(&self, method: &MethodDescriptor) -> MethodDescriptor {
        let arguments: Vec<String> = method
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.name))
            .collect();
        let forwarded: Vec<String> = method
            .parameters
            .iter()
            .map(|p| p.name.clone())
            .collect();

        let mut interceptor = MethodDescriptor::public(method.name.clone()).with_body(format!(
            "{}\nreturn self.{}.{}({});",
            self.initialize_call(&method.name, &arguments.join(", ")),
            self.value_holder_property,
            method.name,
            forwarded.join(", "),
        ));
        interceptor.parameters = method.parameters.clone();
        interceptor.return_type = method.return_type.clone();
        interceptor
    }
}

impl Default for LazyLoadingValueHolderGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyGenerator for LazyLoadingValueHolderGenerator {
    fn generate(
        &self,
        original: &ClassDescriptor,
        proxy: ClassDescriptor,
        _parameters: &ProxyParameters,
    ) -> ProxyResult<ClassDescriptor> {
        ProxiedClassValidator::validate(original)?;

        let mut proxy = if original.is_interface() {
            proxy.with_interface(original.name())
        } else {
            proxy.with_parent(original.name())
        };
        proxy = proxy
            .with_interface(LAZY_LOADING_INTERFACE)
            .with_interface(VALUE_HOLDER_INTERFACE)
            .with_property(
                PropertyDescriptor::private(self.value_holder_property.clone())
                    .with_doc("Wrapped value, set on first access"),
            )
            .with_property(
                PropertyDescriptor::private(self.initializer_property.clone())
                    .with_doc("Deferred initializer"),
            );

        let lifecycle = self.lifecycle_methods();
        for method in original.methods().iter().filter(|m| m.is_interceptable()) {
            if lifecycle.iter().any(|l| l.name == method.name) {
                continue;
            }
            proxy = proxy.with_method(self.interceptor(method));
        }
        for method in lifecycle {
            proxy = proxy.with_method(method);
        }

        debug!(
            original = original.name(),
            proxy = proxy.name(),
            methods = proxy.methods().len(),
            "Generated lazy-loading value holder members"
        );
        Ok(proxy)
    }
}
