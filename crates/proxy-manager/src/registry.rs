//! Class registry: the process-wide table of defined classes.
//!
//! Definitions are permanent and idempotent: the first definition of a name
//! wins and later definitions of the same name return the existing entry.
//! Lookups that miss can be delegated to an [`Autoloader`].

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::autoloader::Autoloader;
use crate::descriptor::ClassDescriptor;
use crate::error::{ProxyError, ProxyResult};
use crate::identifier::NAMESPACE_SEPARATOR;

fn normalize(name: &str) -> &str {
    name.trim_start_matches(NAMESPACE_SEPARATOR)
}

/// Registry of defined classes.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: DashMap<String, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            classes: DashMap::new(),
        }
    }

    /// Define a class. Returns the registered entry, which is the existing
    /// one if the name was already defined.
    pub fn define(&self, class: ClassDescriptor) -> Arc<ClassDescriptor> {
        let name = class.name().to_string();
        let entry = self
            .classes
            .entry(name.clone())
            .or_insert_with(|| {
                debug!(class = %name, "Defining class");
                Arc::new(class)
            });
        Arc::clone(entry.value())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(normalize(name)).map(|c| Arc::clone(c.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(normalize(name))
    }

    /// Look up a class, invoking `autoloader` on a miss.
    pub fn resolve(
        &self,
        name: &str,
        autoloader: &dyn Autoloader,
    ) -> ProxyResult<Arc<ClassDescriptor>> {
        if let Some(class) = self.get(name) {
            return Ok(class);
        }

        debug!(class = %name, "Class not defined, autoloading");
        if !autoloader.load(normalize(name))? {
            return Err(ProxyError::AutoloadFailed(normalize(name).to_string()));
        }
        self.get(name)
            .ok_or_else(|| ProxyError::AutoloadFailed(normalize(name).to_string()))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
