//! Attributes and the reserved identity attributes
//!
//! An [`Attribute`] is a name plus an ordered list of values. Names compare
//! case-insensitively. A `None` value list ("null") and an empty list are
//! different states and are kept apart.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConnectorError, ConnectorResult};
use crate::guarded::GuardedString;
use crate::value::AttributeValue;

/// Name of the attribute holding a record's unique identifier.
pub const UID_NAME: &str = "__UID__";

/// Name of the attribute holding a record's native name.
pub const NAME_NAME: &str = "__NAME__";

/// Operational attribute enabling or disabling an account.
pub const ENABLE_NAME: &str = "__ENABLE__";

/// Operational attribute carrying an account password.
pub const PASSWORD_NAME: &str = "__PASSWORD__";

/// A named, possibly multi-valued attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    values: Option<Vec<AttributeValue>>,
}

impl Attribute {
    /// Create an attribute.
    ///
    /// `__UID__` and `__NAME__` must carry exactly one non-blank string.
    pub fn new(
        name: impl Into<String>,
        values: Option<Vec<AttributeValue>>,
    ) -> ConnectorResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConnectorError::invalid_attribute(
                name,
                "name must not be blank",
            ));
        }

        if is_named(&name, UID_NAME) || is_named(&name, NAME_NAME) {
            match values.as_deref() {
                Some([AttributeValue::String(s)]) if !s.trim().is_empty() => {}
                _ => {
                    return Err(ConnectorError::invalid_attribute(
                        name,
                        "must have exactly one non-blank string value",
                    ))
                }
            }
        }

        Ok(Self { name, values })
    }

    /// Create a single-valued attribute.
    pub fn single(
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> ConnectorResult<Self> {
        Self::new(name, Some(vec![value.into()]))
    }

    /// Create a multi-valued attribute.
    pub fn multi<I, V>(name: impl Into<String>, values: I) -> ConnectorResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        Self::new(name, Some(values.into_iter().map(Into::into).collect()))
    }

    /// Create an attribute with an explicit empty value list.
    pub fn empty(name: impl Into<String>) -> ConnectorResult<Self> {
        Self::new(name, Some(Vec::new()))
    }

    /// Create an attribute whose value list is null.
    pub fn null(name: impl Into<String>) -> ConnectorResult<Self> {
        Self::new(name, None)
    }

    /// Create an attribute from dynamic JSON input.
    ///
    /// `null` becomes a null value list and arrays become multiple values.
    /// Anything outside the supported value types is rejected.
    pub fn from_json(name: impl Into<String>, value: Value) -> ConnectorResult<Self> {
        let values = match value {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .map(AttributeValue::try_from)
                    .collect::<ConnectorResult<Vec<_>>>()?,
            ),
            scalar => Some(vec![AttributeValue::try_from(scalar)?]),
        };
        Self::new(name, values)
    }

    /// The `__ENABLE__` operational attribute.
    pub fn enable(enabled: bool) -> Self {
        Self {
            name: ENABLE_NAME.to_string(),
            values: Some(vec![AttributeValue::Boolean(enabled)]),
        }
    }

    /// The `__PASSWORD__` operational attribute.
    pub fn password(password: GuardedString) -> Self {
        Self {
            name: PASSWORD_NAME.to_string(),
            values: Some(vec![AttributeValue::Guarded(password)]),
        }
    }

    /// Get the attribute name as given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the values, `None` when the value list is null.
    pub fn values(&self) -> Option<&[AttributeValue]> {
        self.values.as_deref()
    }

    /// Check if the value list is null (as opposed to empty).
    pub fn is_null(&self) -> bool {
        self.values.is_none()
    }

    /// Check whether this attribute has any value.
    pub fn has_values(&self) -> bool {
        self.values.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Get the single value of this attribute.
    ///
    /// Returns `Ok(None)` for a null or empty list and an error when the
    /// attribute holds more than one value.
    pub fn single_value(&self) -> ConnectorResult<Option<&AttributeValue>> {
        match self.values.as_deref() {
            None | Some([]) => Ok(None),
            Some([value]) => Ok(Some(value)),
            Some(values) => Err(ConnectorError::invalid_data(format!(
                "attribute '{}' is expected to be single-valued but has {} values",
                self.name,
                values.len()
            ))),
        }
    }

    /// Case-insensitive name check.
    pub fn is(&self, name: &str) -> bool {
        is_named(&self.name, name)
    }

    /// Check if this is the `__UID__` attribute.
    pub fn is_uid(&self) -> bool {
        self.is(UID_NAME)
    }

    /// Check if this is the `__NAME__` attribute.
    pub fn is_name(&self) -> bool {
        self.is(NAME_NAME)
    }

    /// Lowercased name used as map key and for hashing.
    pub(crate) fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.is(&other.name) && self.values == other.values
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
        self.values.hash(state);
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.values {
            None => write!(f, "{}=null", self.name),
            Some(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{}=[{}]", self.name, rendered.join(", "))
            }
        }
    }
}

/// Lowercased attribute name, borrowed when the name is already lowercase.
pub(crate) fn name_key(name: &str) -> Cow<'_, str> {
    if name.chars().all(|c| c.to_lowercase().eq(std::iter::once(c))) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_lowercase())
    }
}

pub(crate) fn is_named(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    name_key(a) == name_key(b)
}

/// Unique identifier of a record in its target system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    /// Create a UID, rejecting blank values.
    pub fn new(value: impl Into<String>) -> ConnectorResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ConnectorError::invalid_attribute(
                UID_NAME,
                "value must not be blank",
            ));
        }
        Ok(Self(value))
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The `__UID__` attribute carrying this identifier.
    pub fn to_attribute(&self) -> Attribute {
        Attribute {
            name: UID_NAME.to_string(),
            values: Some(vec![AttributeValue::String(self.0.clone())]),
        }
    }
}

impl TryFrom<String> for Uid {
    type Error = ConnectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Native name of a record (e.g. an LDAP DN or a login name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    /// Create a name, rejecting blank values.
    pub fn new(value: impl Into<String>) -> ConnectorResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ConnectorError::invalid_attribute(
                NAME_NAME,
                "value must not be blank",
            ));
        }
        Ok(Self(value))
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The `__NAME__` attribute carrying this name.
    pub fn to_attribute(&self) -> Attribute {
        Attribute {
            name: NAME_NAME.to_string(),
            values: Some(vec![AttributeValue::String(self.0.clone())]),
        }
    }
}

impl TryFrom<String> for Name {
    type Error = ConnectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
