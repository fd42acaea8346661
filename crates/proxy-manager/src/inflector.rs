//! Class name inflection between user classes and their generated proxies.

use crate::identifier::NAMESPACE_SEPARATOR;
use crate::parameters::{ParameterHasher, ProxyParameters};

/// Marker segment separating the proxy namespace from the user class name.
pub const PROXY_MARKER: &str = "__PM__";

/// Prefix of the final segment of every generated proxy class name.
pub const GENERATED_PREFIX: &str = "Generated";

/// Naming policy mapping user class names to proxy class names and back.
///
/// Implementations must be pure: the same input always yields the same
/// name, and `get_user_class_name(get_proxy_class_name(c, p)) == c`.
pub trait ClassNameInflector: Send + Sync {
    /// Name of the user class behind `class_name`. Non-proxy names are
    /// returned unchanged (minus a leading separator).
    fn get_user_class_name(&self, class_name: &str) -> String;

    /// Proxy class name for `class_name` produced with `parameters`.
    fn get_proxy_class_name(&self, class_name: &str, parameters: &ProxyParameters) -> String;

    fn is_proxy_class_name(&self, class_name: &str) -> bool;
}

/// Inflector producing `{namespace}\__PM__\{UserClass}\Generated{hash}`.
#[derive(Clone, Debug)]
pub struct DefaultClassNameInflector {
    proxy_namespace: String,
    /// `{namespace}\__PM__\`
    proxy_marker: String,
}

impl DefaultClassNameInflector {
    pub fn new(proxy_namespace: impl Into<String>) -> Self {
        let proxy_namespace = proxy_namespace
            .into()
            .trim_matches(NAMESPACE_SEPARATOR)
            .to_string();
        let proxy_marker = format!(
            "{ns}{sep}{marker}{sep}",
            ns = proxy_namespace,
            sep = NAMESPACE_SEPARATOR,
            marker = PROXY_MARKER,
        );
        Self {
            proxy_namespace,
            proxy_marker,
        }
    }

    pub fn proxy_namespace(&self) -> &str {
        &self.proxy_namespace
    }
}

impl ClassNameInflector for DefaultClassNameInflector {
    fn get_user_class_name(&self, class_name: &str) -> String {
        let class_name = class_name.trim_start_matches(NAMESPACE_SEPARATOR);

        let Some(position) = class_name.rfind(&self.proxy_marker) else {
            return class_name.to_string();
        };

        let start = position + self.proxy_marker.len();
        let end = class_name
            .rfind(NAMESPACE_SEPARATOR)
            .filter(|end| *end >= start)
            .unwrap_or(class_name.len());
        class_name[start..end].to_string()
    }

    fn get_proxy_class_name(&self, class_name: &str, parameters: &ProxyParameters) -> String {
        // Serializing an in-memory map does not fail.
        let hash = ParameterHasher::hash(parameters).unwrap_or_default();
        format!(
            "{}{}{}{}{}",
            self.proxy_marker,
            self.get_user_class_name(class_name),
            NAMESPACE_SEPARATOR,
            GENERATED_PREFIX,
            hash,
        )
    }

    fn is_proxy_class_name(&self, class_name: &str) -> bool {
        class_name.contains(&self.proxy_marker)
    }
}
