//! Object classes and connector objects (records)

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::attribute::{is_named, name_key, Attribute, Name, Uid, NAME_NAME, UID_NAME};
use crate::error::{ConnectorError, ConnectorResult};
use crate::value::AttributeValue;

/// Kind of record in a target system ("account", "group", ...).
///
/// Equality is by name, ignoring case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectClass {
    name: String,
}

impl ObjectClass {
    /// Name of the predefined account object class.
    pub const ACCOUNT_NAME: &'static str = "__ACCOUNT__";

    /// Name of the predefined group object class.
    pub const GROUP_NAME: &'static str = "__GROUP__";

    /// Create an object class, rejecting blank names.
    pub fn new(name: impl Into<String>) -> ConnectorResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConnectorError::InvalidObject {
                message: "object class name must not be blank".to_string(),
            });
        }
        Ok(Self { name })
    }

    /// The predefined account object class.
    pub fn account() -> Self {
        Self {
            name: Self::ACCOUNT_NAME.to_string(),
        }
    }

    /// The predefined group object class.
    pub fn group() -> Self {
        Self {
            name: Self::GROUP_NAME.to_string(),
        }
    }

    /// Get the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name check.
    pub fn is(&self, name: &str) -> bool {
        is_named(&self.name, name)
    }
}

impl PartialEq for ObjectClass {
    fn eq(&self, other: &Self) -> bool {
        self.is(&other.name)
    }
}

impl Eq for ObjectClass {}

impl Hash for ObjectClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_lowercase().hash(state);
    }
}

impl TryFrom<String> for ObjectClass {
    type Error = ConnectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectClass> for String {
    fn from(oc: ObjectClass) -> Self {
        oc.name
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A record read from or written to a target system.
///
/// Always carries a [`Uid`] and a [`Name`]; attribute lookup ignores case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorObject {
    object_class: ObjectClass,
    uid: Uid,
    name: Name,
    attributes: HashMap<String, Attribute>,
}

impl ConnectorObject {
    /// Start building an object of the given class.
    pub fn builder(object_class: ObjectClass) -> ConnectorObjectBuilder {
        ConnectorObjectBuilder::new(object_class)
    }

    /// Get the object class.
    pub fn object_class(&self) -> &ObjectClass {
        &self.object_class
    }

    /// Get the unique identifier.
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Get the native name.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Look up an attribute by name, ignoring case.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(&*name_key(name))
    }

    /// Iterate over all attributes, including `__UID__` and `__NAME__`.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Number of attributes, including `__UID__` and `__NAME__`.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always false: a built object carries at least its UID and name.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Keep only the named attributes (plus `__UID__` and `__NAME__`).
    #[must_use]
    pub fn retain_attributes<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        let keep: Vec<String> = names.iter().map(|n| n.as_ref().to_lowercase()).collect();
        self.attributes.retain(|key, attr| {
            attr.is_uid() || attr.is_name() || keep.iter().any(|k| k == key)
        });
        self
    }

    /// Turn this object back into a builder, e.g. to apply changes.
    pub fn into_builder(self) -> ConnectorObjectBuilder {
        ConnectorObjectBuilder {
            object_class: self.object_class,
            attributes: self.attributes,
        }
    }
}

/// Builder for [`ConnectorObject`].
#[derive(Debug, Clone)]
pub struct ConnectorObjectBuilder {
    object_class: ObjectClass,
    attributes: HashMap<String, Attribute>,
}

impl ConnectorObjectBuilder {
    /// Create a builder for the given object class.
    pub fn new(object_class: ObjectClass) -> Self {
        Self {
            object_class,
            attributes: HashMap::new(),
        }
    }

    /// Set the UID.
    #[must_use]
    pub fn with_uid(self, uid: &Uid) -> Self {
        self.with_attribute(uid.to_attribute())
    }

    /// Set the native name.
    #[must_use]
    pub fn with_name(self, name: &Name) -> Self {
        self.with_attribute(name.to_attribute())
    }

    /// Add or replace an attribute.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.insert(attribute.key(), attribute);
        self
    }

    /// Add or replace several attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        for attribute in attributes {
            self.attributes.insert(attribute.key(), attribute);
        }
        self
    }

    /// Remove an attribute by name.
    #[must_use]
    pub fn without_attribute(mut self, name: &str) -> Self {
        self.attributes.remove(&*name_key(name));
        self
    }

    /// Get an attribute added so far.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(&*name_key(name))
    }

    /// Build the object.
    ///
    /// Fails unless both `__UID__` and `__NAME__` are present.
    pub fn build(self) -> ConnectorResult<ConnectorObject> {
        let uid = Uid::new(self.required_string(UID_NAME)?)?;
        let name = Name::new(self.required_string(NAME_NAME)?)?;

        Ok(ConnectorObject {
            object_class: self.object_class,
            uid,
            name,
            attributes: self.attributes,
        })
    }

    fn required_string(&self, name: &str) -> ConnectorResult<String> {
        match self.attribute(name).and_then(Attribute::values) {
            Some([AttributeValue::String(s)]) => Ok(s.clone()),
            _ => Err(ConnectorError::InvalidObject {
                message: format!("object of class {} is missing {}", self.object_class, name),
            }),
        }
    }
}
