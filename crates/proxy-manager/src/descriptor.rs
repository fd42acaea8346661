//! Class descriptors: the registry's unit of definition.
//!
//! A [`ClassDescriptor`] describes both user classes (registered by the
//! application) and generated proxy classes (built by a proxy generator,
//! signed, then handed to a generator strategy). Descriptors are serializable
//! so strategies can persist them and autoloaders can load them back.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifier::NAMESPACE_SEPARATOR;

// ── Members ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Protected => write!(f, "protected"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// A property declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            default_value: None,
            doc: None,
        }
    }

    pub fn private(name: impl Into<String>) -> Self {
        Self::new(name, Visibility::Private)
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(default)]
    pub type_hint: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
        }
    }

    pub fn typed(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: Some(type_hint.into()),
        }
    }
}

/// A method declaration with an opaque body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            is_abstract: false,
            is_final: false,
            parameters: vec![],
            return_type: None,
            body: String::new(),
        }
    }

    pub fn public(name: impl Into<String>) -> Self {
        Self::new(name, Visibility::Public)
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn abstract_method(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn final_method(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Whether a proxy may intercept this method.
    pub fn is_interceptable(&self) -> bool {
        self.visibility == Visibility::Public && !self.is_static && !self.is_final
    }
}

// ── Class ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFlags {
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_interface: bool,
}

/// Description of a class: name, hierarchy and members.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default)]
    flags: ClassFlags,
    #[serde(default)]
    constants: BTreeMap<String, Value>,
    #[serde(default)]
    properties: Vec<PropertyDescriptor>,
    #[serde(default)]
    methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    /// New empty class. Leading namespace separators are dropped.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: name.trim_start_matches(NAMESPACE_SEPARATOR).to_string(),
            parent: None,
            interfaces: vec![],
            flags: ClassFlags::default(),
            constants: BTreeMap::new(),
            properties: vec![],
            methods: vec![],
        }
    }

    /// New interface.
    pub fn interface(name: impl Into<String>) -> Self {
        let mut class = Self::new(name);
        class.flags.is_interface = true;
        class
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        let interface = interface.into();
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    pub fn with_flags(mut self, flags: ClassFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn final_class(mut self) -> Self {
        self.flags.is_final = true;
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.flags.is_abstract = true;
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    /// Adds a property, replacing any property with the same name.
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.retain(|p| p.name != property.name);
        self.properties.push(property);
        self
    }

    /// Adds a method, replacing any method with the same name.
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.retain(|m| m.name != method.name);
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the class path.
    pub fn short_name(&self) -> &str {
        self.name
            .rsplit(NAMESPACE_SEPARATOR)
            .next()
            .unwrap_or(&self.name)
    }

    /// Namespace part of the class path; empty for global classes.
    pub fn namespace(&self) -> &str {
        self.name
            .rfind(NAMESPACE_SEPARATOR)
            .map(|pos| &self.name[..pos])
            .unwrap_or("")
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn flags(&self) -> ClassFlags {
        self.flags
    }

    pub fn is_final(&self) -> bool {
        self.flags.is_final
    }

    pub fn is_interface(&self) -> bool {
        self.flags.is_interface
    }

    pub fn constants(&self) -> &BTreeMap<String, Value> {
        &self.constants
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    /// Whether this class is, extends or implements `name` (direct relations only).
    pub fn is_a(&self, name: &str) -> bool {
        let name = name.trim_start_matches(NAMESPACE_SEPARATOR);
        self.name == name
            || self.parent.as_deref() == Some(name)
            || self.interfaces.iter().any(|i| i == name)
    }

    /// Renders a readable class declaration listing.
    pub fn to_source(&self) -> String {
        let mut out = String::new();

        if !self.namespace().is_empty() {
            let _ = writeln!(out, "namespace {};\n", self.namespace());
        }

        let kind = if self.flags.is_interface {
            "interface"
        } else if self.flags.is_final {
            "final class"
        } else if self.flags.is_abstract {
            "abstract class"
        } else {
            "class"
        };
        let _ = write!(out, "{} {}", kind, self.short_name());
        if let Some(parent) = &self.parent {
            let _ = write!(out, " extends {}{}", NAMESPACE_SEPARATOR, parent);
        }
        if !self.interfaces.is_empty() {
            let list: Vec<String> = self
                .interfaces
                .iter()
                .map(|i| format!("{}{}", NAMESPACE_SEPARATOR, i))
                .collect();
            let keyword = if self.flags.is_interface { "extends" } else { "implements" };
            let _ = write!(out, " {} {}", keyword, list.join(", "));
        }
        out.push_str("\n{\n");

        for (name, value) in &self.constants {
            let _ = writeln!(out, "    const {} = {};", name, value);
        }

        for property in &self.properties {
            if let Some(doc) = &property.doc {
                let _ = writeln!(out, "    /** {} */", doc);
            }
            let _ = write!(out, "    {}", property.visibility);
            if property.is_static {
                out.push_str(" static");
            }
            let _ = write!(out, " {}", property.name);
            if let Some(value) = &property.default_value {
                let _ = write!(out, " = {}", value);
            }
            out.push_str(";\n");
        }

        for method in &self.methods {
            out.push('\n');
            out.push_str("    ");
            if method.is_final {
                out.push_str("final ");
            }
            if method.is_abstract {
                out.push_str("abstract ");
            }
            let _ = write!(out, "{}", method.visibility);
            if method.is_static {
                out.push_str(" static");
            }
            let params: Vec<String> = method
                .parameters
                .iter()
                .map(|p| match &p.type_hint {
                    Some(hint) => format!("{}: {}", p.name, hint),
                    None => p.name.clone(),
                })
                .collect();
            let _ = write!(out, " fn {}({})", method.name, params.join(", "));
            if let Some(ret) = &method.return_type {
                let _ = write!(out, " -> {}", ret);
            }
            if method.is_abstract || self.flags.is_interface {
                out.push_str(";\n");
            } else {
                out.push_str("\n    {\n");
                for line in method.body.lines() {
                    let _ = writeln!(out, "        {}", line);
                }
                out.push_str("    }\n");
            }
        }

        out.push_str("}\n");
        out
    }
}
