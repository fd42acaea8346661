//! Lazy-loading value holder proxies.
//!
//! A [`ValueHolderProxy`] is an instance of a proxy class from the registry.
//! It carries an [`Initializer`] and produces the wrapped value on first
//! meaningful access.

use std::sync::Arc;

use serde_json::Value;

use crate::descriptor::ClassDescriptor;
use crate::error::{ProxyError, ProxyResult};

/// Context handed to an initializer.
#[derive(Clone, Copy, Debug)]
pub struct InitializationContext<'a> {
    /// Class name of the proxy being initialized.
    pub proxy_class: &'a str,
    /// Method whose invocation triggered initialization.
    pub method: &'a str,
    pub parameters: &'a [Value],
}

/// Deferred construction of the wrapped value.
pub type Initializer<T> =
    Arc<dyn Fn(&InitializationContext<'_>) -> ProxyResult<T> + Send + Sync>;

/// Wrap a closure as an [`Initializer`].
pub fn initializer<T, F>(f: F) -> Initializer<T>
where
    F: Fn(&InitializationContext<'_>) -> ProxyResult<T> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Objects whose real state is produced on demand.
pub trait LazyLoading<T> {
    fn set_proxy_initializer(&mut self, initializer: Option<Initializer<T>>);

    fn proxy_initializer(&self) -> Option<&Initializer<T>>;

    /// Force initialization. Returns whether a value is now held.
    fn initialize_proxy(&mut self) -> ProxyResult<bool>;

    fn is_proxy_initialized(&self) -> bool;
}

/// Objects wrapping another value.
pub trait ValueHolder<T> {
    fn wrapped_value_holder_value(&self) -> Option<&T>;
}

/// Instance of a lazy-loading value holder proxy class.
pub struct ValueHolderProxy<T> {
    class: Arc<ClassDescriptor>,
    initializer: Option<Initializer<T>>,
    value: Option<T>,
}

impl<T> ValueHolderProxy<T> {
    pub(crate) fn new(class: Arc<ClassDescriptor>, initializer: Initializer<T>) -> Self {
        Self {
            class,
            initializer: Some(initializer),
            value: None,
        }
    }

    /// Runtime class name of this instance.
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn proxy_class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// Access the wrapped value on behalf of `method`, initializing first if needed.
    pub fn access(&mut self, method: &str, parameters: &[Value]) -> ProxyResult<&T> {
        self.initialize(method, parameters)?;
        self.value
            .as_ref()
            .ok_or_else(|| self.missing_initializer())
    }

    pub fn access_mut(&mut self, method: &str, parameters: &[Value]) -> ProxyResult<&mut T> {
        self.initialize(method, parameters)?;
        match self.value.as_mut() {
            Some(value) => Ok(value),
            None => Err(ProxyError::MissingInitializer {
                class_name: self.class.name().to_string(),
            }),
        }
    }

    /// Consume the proxy, returning the (initialized) wrapped value.
    pub fn into_inner(mut self) -> ProxyResult<T> {
        self.initialize("into_inner", &[])?;
        let class_name = self.class.name().to_string();
        self.value
            .take()
            .ok_or(ProxyError::MissingInitializer { class_name })
    }

    fn missing_initializer(&self) -> ProxyError {
        ProxyError::MissingInitializer {
            class_name: self.class.name().to_string(),
        }
    }

    fn initialize(&mut self, method: &str, parameters: &[Value]) -> ProxyResult<()> {
        if self.value.is_some() {
            return Ok(());
        }
        let Some(initializer) = self.initializer.clone() else {
            return Err(self.missing_initializer());
        };

        let context = InitializationContext {
            proxy_class: self.class.name(),
            method,
            parameters,
        };
        let value = initializer(&context).map_err(|e| ProxyError::InitializerFailed {
            class_name: self.class.name().to_string(),
            method: method.to_string(),
            source: Box::new(e),
        })?;
        self.value = Some(value);
        Ok(())
    }
}

impl<T> LazyLoading<T> for ValueHolderProxy<T> {
    fn set_proxy_initializer(&mut self, initializer: Option<Initializer<T>>) {
        self.initializer = initializer;
    }

    fn proxy_initializer(&self) -> Option<&Initializer<T>> {
        self.initializer.as_ref()
    }

    fn initialize_proxy(&mut self) -> ProxyResult<bool> {
        if self.value.is_none() && self.initializer.is_none() {
            return Ok(false);
        }
        self.initialize("initialize_proxy", &[])?;
        Ok(self.value.is_some())
    }

    fn is_proxy_initialized(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> ValueHolder<T> for ValueHolderProxy<T> {
    fn wrapped_value_holder_value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ValueHolderProxy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueHolderProxy")
            .field("class", &self.class.name())
            .field("has_initializer", &self.initializer.is_some())
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn class() -> Arc<ClassDescriptor> {
        Arc::new(ClassDescriptor::new("Gen\\__PM__\\Foo\\Generated0"))
    }

    fn counting(calls: Arc<AtomicUsize>) -> Initializer<String> {
        initializer(move |_ctx| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("real".to_string())
        })
    }

    #[test]
    fn new_proxy_is_uninitialized_with_initializer() {
        let init = counting(Arc::new(AtomicUsize::new(0)));
        let proxy = ValueHolderProxy::new(class(), Arc::clone(&init));
        assert!(!proxy.is_proxy_initialized());
        assert!(proxy.wrapped_value_holder_value().is_none());
        assert!(Arc::ptr_eq(proxy.proxy_initializer().unwrap(), &init));
        assert_eq!(proxy.class_name(), "Gen\\__PM__\\Foo\\Generated0");
    }

    #[test]
    fn first_access_initializes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut proxy = ValueHolderProxy::new(class(), counting(Arc::clone(&calls)));
        assert_eq!(proxy.access("len", &[]).unwrap(), "real");
        assert_eq!(proxy.access("len", &[]).unwrap(), "real");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(proxy.is_proxy_initialized());
    }

    #[test]
    fn initializer_sees_triggering_method() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let init: Initializer<usize> = initializer(move |ctx| {
            record
                .lock()
                .unwrap()
                .push((ctx.proxy_class.to_string(), ctx.method.to_string(), ctx.parameters.len()));
            Ok(7)
        });
        let mut proxy = ValueHolderProxy::new(class(), init);
        proxy.access("send", &[Value::from("hi")]).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, "send");
        assert_eq!(seen[0].2, 1);
        assert!(seen[0].0.ends_with("Generated0"));
    }

    #[test]
    fn failing_initializer_leaves_proxy_uninitialized() {
        let init: Initializer<u32> =
            initializer(|_| Err(ProxyError::Initialization("backend down".into())));
        let mut proxy = ValueHolderProxy::new(class(), init);
        match proxy.access("run", &[]) {
            Err(ProxyError::InitializerFailed { method, source, .. }) => {
                assert_eq!(method, "run");
                assert!(matches!(*source, ProxyError::Initialization(_)));
            }
            other => panic!("expected InitializerFailed, got {:?}", other.map(|v| *v)),
        }
        assert!(!proxy.is_proxy_initialized());
    }

    #[test]
    fn removing_initializer_prevents_initialization() {
        let mut proxy = ValueHolderProxy::new(class(), counting(Arc::new(AtomicUsize::new(0))));
        proxy.set_proxy_initializer(None);
        assert!(!proxy.initialize_proxy().unwrap());
        assert!(matches!(
            proxy.access("run", &[]),
            Err(ProxyError::MissingInitializer { .. })
        ));
    }

    #[test]
    fn initialize_proxy_forces_initialization() {
        let mut proxy = ValueHolderProxy::new(class(), counting(Arc::new(AtomicUsize::new(0))));
        assert!(proxy.initialize_proxy().unwrap());
        assert_eq!(proxy.wrapped_value_holder_value().map(String::as_str), Some("real"));
    }

    #[test]
    fn value_survives_initializer_removal() {
        let mut proxy = ValueHolderProxy::new(class(), counting(Arc::new(AtomicUsize::new(0))));
        proxy.initialize_proxy().unwrap();
        proxy.set_proxy_initializer(None);
        assert_eq!(proxy.access("len", &[]).unwrap(), "real");
    }

    #[test]
    fn access_mut_and_into_inner() {
        let mut proxy = ValueHolderProxy::new(class(), counting(Arc::new(AtomicUsize::new(0))));
        proxy.access_mut("push", &[]).unwrap().push('!');
        assert_eq!(proxy.into_inner().unwrap(), "real!");
    }
}
