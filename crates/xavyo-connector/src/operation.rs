//! Connector Framework operation types
//!
//! Options passed to operations, attribute deltas for updates, and the
//! summary reported by a search.

use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::error::ConnectorResult;
use crate::object::ConnectorObject;
use crate::value::AttributeValue;

/// Options shared by all operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOptions {
    /// Attributes to return. `None` returns everything the connector reads.
    /// `__UID__` and `__NAME__` are always returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,

    /// Page size hint for connectors that page natively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    /// Opaque cookie of the page to continue from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paged_results_cookie: Option<String>,
}

impl OperationOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned attributes.
    pub fn with_attributes_to_get<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_get = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the page size hint.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Continue from a previous page.
    pub fn with_paged_results_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.paged_results_cookie = Some(cookie.into());
        self
    }
}

/// Changes to apply to an object during update operations.
///
/// Replacements are applied first, then additions, then removals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDelta {
    /// Values to add to (possibly multi-valued) attributes.
    pub add: Vec<Attribute>,

    /// Values to remove from multi-valued attributes.
    pub remove: Vec<Attribute>,

    /// Attributes to replace entirely.
    pub replace: Vec<Attribute>,
}

impl AttributeDelta {
    /// Create a new empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values to an attribute.
    pub fn add(&mut self, attribute: Attribute) -> &mut Self {
        self.add.push(attribute);
        self
    }

    /// Remove values from an attribute.
    pub fn remove(&mut self, attribute: Attribute) -> &mut Self {
        self.remove.push(attribute);
        self
    }

    /// Replace an attribute entirely.
    pub fn replace(&mut self, attribute: Attribute) -> &mut Self {
        self.replace.push(attribute);
        self
    }

    /// Check if this delta has any changes.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty() && self.replace.is_empty()
    }

    /// Get all affected attribute names, lowercased and sorted.
    pub fn affected_attributes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .add
            .iter()
            .chain(&self.remove)
            .chain(&self.replace)
            .map(|a| a.name().to_lowercase())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Apply the delta to an in-memory object.
    ///
    /// Added values already present are not duplicated. Removing values from
    /// an attribute the object does not have is a no-op. Fails when the
    /// result is not a valid object, e.g. `__NAME__` was emptied.
    pub fn apply(&self, object: ConnectorObject) -> ConnectorResult<ConnectorObject> {
        let mut builder = object.into_builder();

        for attribute in &self.replace {
            builder = builder.with_attribute(attribute.clone());
        }

        for attribute in &self.add {
            let mut values: Vec<AttributeValue> = builder
                .attribute(attribute.name())
                .and_then(Attribute::values)
                .map(<[AttributeValue]>::to_vec)
                .unwrap_or_default();
            for value in attribute.values().unwrap_or_default() {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
            let name = builder
                .attribute(attribute.name())
                .map_or_else(|| attribute.name().to_string(), |a| a.name().to_string());
            builder = builder.with_attribute(Attribute::new(name, Some(values))?);
        }

        for attribute in &self.remove {
            let Some(existing) = builder.attribute(attribute.name()) else {
                continue;
            };
            let removed = attribute.values().unwrap_or_default();
            let name = existing.name().to_string();
            let values = existing
                .values()
                .map(|vs| vs.iter().filter(|v| !removed.contains(v)).cloned().collect());
            builder = builder.with_attribute(Attribute::new(name, values)?);
        }

        builder.build()
    }
}

/// Counters reported by a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    /// Native queries executed (one when the target was scanned).
    pub native_queries: usize,

    /// Records handed back by the connector.
    pub received: usize,

    /// Records dropped because an earlier query already returned them.
    pub duplicates: usize,

    /// Records dropped because they did not match the filter.
    pub rejected: usize,

    /// Records passed to the caller's handler.
    pub delivered: usize,

    /// Whether the caller's handler asked to stop early.
    pub stopped: bool,
}
