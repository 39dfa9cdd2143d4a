//! Search filters
//!
//! A [`Filter`] is an immutable tree of attribute predicates combined with
//! AND, OR and NOT. Every node can be evaluated in memory with
//! [`Filter::accept`]; the search pipeline re-applies the caller's filter to
//! every record so results are exact even when the native query was broader.
//!
//! Leaf operands are validated when the filter is built, never when it is
//! evaluated.

use std::cmp::Ordering;
use std::fmt;

use crate::attribute::Attribute;
use crate::error::{ConnectorError, ConnectorResult};
use crate::object::ConnectorObject;
use crate::value::AttributeValue;

/// Kind of leaf predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    ContainsAllValues,
}

impl FilterKind {
    /// Upper-case label used when rendering filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Equals => "EQUALS",
            FilterKind::Contains => "CONTAINS",
            FilterKind::StartsWith => "STARTSWITH",
            FilterKind::EndsWith => "ENDSWITH",
            FilterKind::GreaterThan => "GREATERTHAN",
            FilterKind::GreaterThanOrEqual => "GREATERTHANOREQUAL",
            FilterKind::LessThan => "LESSTHAN",
            FilterKind::LessThanOrEqual => "LESSTHANOREQUAL",
            FilterKind::ContainsAllValues => "CONTAINSALLVALUES",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matches records whose attribute equals the operand exactly: same name
/// (ignoring case) and the same complete value list.
///
/// This is narrower than most native equality filters, which match when any
/// single value is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EqualsFilter {
    attribute: Attribute,
}

impl EqualsFilter {
    fn new(attribute: Attribute) -> ConnectorResult<Self> {
        if attribute.is_null() {
            return Err(ConnectorError::invalid_filter(format!(
                "equals filter on '{}' needs a value list",
                attribute.name()
            )));
        }
        Ok(Self { attribute })
    }

    /// The operand.
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Name of the attribute being tested.
    pub fn name(&self) -> &str {
        self.attribute.name()
    }

    /// The operand's values.
    pub fn values(&self) -> &[AttributeValue] {
        self.attribute.values().unwrap_or_default()
    }

    fn accept(&self, object: &ConnectorObject) -> bool {
        object
            .attribute(self.name())
            .is_some_and(|attr| *attr == self.attribute)
    }
}

/// Substring predicate on a single string value (contains, starts with,
/// ends with).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringFilter {
    attribute: Attribute,
    value: String,
}

impl StringFilter {
    fn new(kind: FilterKind, attribute: Attribute) -> ConnectorResult<Self> {
        let value = match single_operand(kind, &attribute)? {
            AttributeValue::String(s) => s.clone(),
            other => {
                return Err(ConnectorError::invalid_filter(format!(
                    "{kind} filter on '{}' needs a string value, got {}",
                    attribute.name(),
                    other.type_name()
                )))
            }
        };
        Ok(Self { attribute, value })
    }

    /// The operand.
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Name of the attribute being tested.
    pub fn name(&self) -> &str {
        self.attribute.name()
    }

    /// The substring.
    pub fn value(&self) -> &str {
        &self.value
    }

    fn accept(
        &self,
        object: &ConnectorObject,
        test: impl Fn(&str, &str) -> bool,
    ) -> ConnectorResult<bool> {
        let Some(attr) = object.attribute(self.name()) else {
            return Ok(false);
        };
        match attr.single_value()? {
            None => Ok(false),
            Some(AttributeValue::String(s)) => Ok(test(s, &self.value)),
            Some(other) => Err(ConnectorError::invalid_data(format!(
                "attribute '{}' holds a {} value, string filters need a string",
                attr.name(),
                other.type_name()
            ))),
        }
    }
}

/// Ordering predicate on a single orderable value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComparableFilter {
    attribute: Attribute,
    value: AttributeValue,
}

impl ComparableFilter {
    fn new(kind: FilterKind, attribute: Attribute) -> ConnectorResult<Self> {
        let value = single_operand(kind, &attribute)?.clone();
        if !value.is_orderable() {
            return Err(ConnectorError::invalid_filter(format!(
                "{kind} filter on '{}' needs an orderable value, got {}",
                attribute.name(),
                value.type_name()
            )));
        }
        Ok(Self { attribute, value })
    }

    /// The operand.
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Name of the attribute being tested.
    pub fn name(&self) -> &str {
        self.attribute.name()
    }

    /// The value compared against.
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Order the record's value against the operand; `None` when the record
    /// has no value for the attribute.
    fn compare(&self, object: &ConnectorObject) -> ConnectorResult<Option<Ordering>> {
        let Some(attr) = object.attribute(self.name()) else {
            return Ok(None);
        };
        match attr.single_value()? {
            None => Ok(None),
            Some(value) => value.compare(&self.value).map(Some),
        }
    }
}

/// Matches records whose attribute contains every operand value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainsAllValuesFilter {
    attribute: Attribute,
}

impl ContainsAllValuesFilter {
    fn new(attribute: Attribute) -> ConnectorResult<Self> {
        if attribute.is_null() {
            return Err(ConnectorError::invalid_filter(format!(
                "contains-all-values filter on '{}' needs a value list",
                attribute.name()
            )));
        }
        Ok(Self { attribute })
    }

    /// The operand.
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Name of the attribute being tested.
    pub fn name(&self) -> &str {
        self.attribute.name()
    }

    /// The values that must all be present.
    pub fn values(&self) -> &[AttributeValue] {
        self.attribute.values().unwrap_or_default()
    }

    fn accept(&self, object: &ConnectorObject) -> bool {
        let Some(attr) = object.attribute(self.name()) else {
            return false;
        };
        let present = attr.values().unwrap_or_default();
        self.values().iter().all(|v| present.contains(v))
    }
}

/// Single-value filters take exactly one value and may not test `__UID__`.
fn single_operand(kind: FilterKind, attribute: &Attribute) -> ConnectorResult<&AttributeValue> {
    if attribute.is_uid() {
        return Err(ConnectorError::invalid_filter(format!(
            "{kind} filter cannot be used on {}",
            attribute.name()
        )));
    }
    match attribute.values() {
        Some([value]) => Ok(value),
        _ => Err(ConnectorError::invalid_filter(format!(
            "{kind} filter on '{}' needs exactly one value",
            attribute.name()
        ))),
    }
}

/// Search filter tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    Equals(EqualsFilter),
    Contains(StringFilter),
    StartsWith(StringFilter),
    EndsWith(StringFilter),
    GreaterThan(ComparableFilter),
    GreaterThanOrEqual(ComparableFilter),
    LessThan(ComparableFilter),
    LessThanOrEqual(ComparableFilter),
    ContainsAllValues(ContainsAllValuesFilter),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Exact match on the whole attribute.
    pub fn equals(attribute: Attribute) -> ConnectorResult<Self> {
        EqualsFilter::new(attribute).map(Filter::Equals)
    }

    /// Single string value contains the operand.
    pub fn contains(attribute: Attribute) -> ConnectorResult<Self> {
        StringFilter::new(FilterKind::Contains, attribute).map(Filter::Contains)
    }

    /// Single string value starts with the operand.
    pub fn starts_with(attribute: Attribute) -> ConnectorResult<Self> {
        StringFilter::new(FilterKind::StartsWith, attribute).map(Filter::StartsWith)
    }

    /// Single string value ends with the operand.
    pub fn ends_with(attribute: Attribute) -> ConnectorResult<Self> {
        StringFilter::new(FilterKind::EndsWith, attribute).map(Filter::EndsWith)
    }

    /// Single value is greater than the operand.
    pub fn greater_than(attribute: Attribute) -> ConnectorResult<Self> {
        ComparableFilter::new(FilterKind::GreaterThan, attribute).map(Filter::GreaterThan)
    }

    /// Single value is greater than or equal to the operand.
    pub fn greater_than_or_equal(attribute: Attribute) -> ConnectorResult<Self> {
        ComparableFilter::new(FilterKind::GreaterThanOrEqual, attribute)
            .map(Filter::GreaterThanOrEqual)
    }

    /// Single value is less than the operand.
    pub fn less_than(attribute: Attribute) -> ConnectorResult<Self> {
        ComparableFilter::new(FilterKind::LessThan, attribute).map(Filter::LessThan)
    }

    /// Single value is less than or equal to the operand.
    pub fn less_than_or_equal(attribute: Attribute) -> ConnectorResult<Self> {
        ComparableFilter::new(FilterKind::LessThanOrEqual, attribute).map(Filter::LessThanOrEqual)
    }

    /// Attribute contains all operand values.
    pub fn contains_all_values(attribute: Attribute) -> ConnectorResult<Self> {
        ContainsAllValuesFilter::new(attribute).map(Filter::ContainsAllValues)
    }

    /// Logical AND.
    pub fn and(left: Filter, right: Filter) -> Self {
        Filter::And(Box::new(left), Box::new(right))
    }

    /// Logical OR.
    pub fn or(left: Filter, right: Filter) -> Self {
        Filter::Or(Box::new(left), Box::new(right))
    }

    /// Logical NOT.
    pub fn negate(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Combine this filter with another using AND.
    #[must_use]
    pub fn and_with(self, other: Filter) -> Self {
        Filter::and(self, other)
    }

    /// Combine this filter with another using OR.
    #[must_use]
    pub fn or_with(self, other: Filter) -> Self {
        Filter::or(self, other)
    }

    /// AND together all filters, left-associated. `None` for an empty input.
    pub fn all_of(filters: impl IntoIterator<Item = Filter>) -> Option<Self> {
        filters.into_iter().reduce(Filter::and)
    }

    /// OR together all filters, left-associated. `None` for an empty input.
    pub fn any_of(filters: impl IntoIterator<Item = Filter>) -> Option<Self> {
        filters.into_iter().reduce(Filter::or)
    }

    /// Leaf kind, `None` for composite filters.
    pub fn kind(&self) -> Option<FilterKind> {
        match self {
            Filter::Equals(_) => Some(FilterKind::Equals),
            Filter::Contains(_) => Some(FilterKind::Contains),
            Filter::StartsWith(_) => Some(FilterKind::StartsWith),
            Filter::EndsWith(_) => Some(FilterKind::EndsWith),
            Filter::GreaterThan(_) => Some(FilterKind::GreaterThan),
            Filter::GreaterThanOrEqual(_) => Some(FilterKind::GreaterThanOrEqual),
            Filter::LessThan(_) => Some(FilterKind::LessThan),
            Filter::LessThanOrEqual(_) => Some(FilterKind::LessThanOrEqual),
            Filter::ContainsAllValues(_) => Some(FilterKind::ContainsAllValues),
            Filter::And(..) | Filter::Or(..) | Filter::Not(_) => None,
        }
    }

    /// Check if this is a leaf predicate.
    pub fn is_leaf(&self) -> bool {
        self.kind().is_some()
    }

    /// Evaluate the filter against a record.
    ///
    /// Fails when the record's data does not fit the predicate, e.g. a
    /// multi-valued attribute under a string or comparison filter.
    pub fn accept(&self, object: &ConnectorObject) -> ConnectorResult<bool> {
        match self {
            Filter::Equals(f) => Ok(f.accept(object)),
            Filter::Contains(f) => f.accept(object, |value, operand| value.contains(operand)),
            Filter::StartsWith(f) => f.accept(object, |value, operand| value.starts_with(operand)),
            Filter::EndsWith(f) => f.accept(object, |value, operand| value.ends_with(operand)),
            Filter::GreaterThan(f) => Ok(matches!(f.compare(object)?, Some(Ordering::Greater))),
            Filter::GreaterThanOrEqual(f) => Ok(matches!(
                f.compare(object)?,
                Some(Ordering::Greater | Ordering::Equal)
            )),
            Filter::LessThan(f) => Ok(matches!(f.compare(object)?, Some(Ordering::Less))),
            Filter::LessThanOrEqual(f) => Ok(matches!(
                f.compare(object)?,
                Some(Ordering::Less | Ordering::Equal)
            )),
            Filter::ContainsAllValues(f) => Ok(f.accept(object)),
            Filter::And(left, right) => Ok(left.accept(object)? && right.accept(object)?),
            Filter::Or(left, right) => Ok(left.accept(object)? || right.accept(object)?),
            Filter::Not(inner) => Ok(!inner.accept(object)?),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Equals(leaf) => write!(f, "EQUALS({})", leaf.attribute),
            Filter::Contains(leaf) | Filter::StartsWith(leaf) | Filter::EndsWith(leaf) => {
                let kind = self.kind().map(|k| k.as_str()).unwrap_or_default();
                write!(f, "{kind}({}={})", leaf.name(), leaf.value)
            }
            Filter::GreaterThan(leaf)
            | Filter::GreaterThanOrEqual(leaf)
            | Filter::LessThan(leaf)
            | Filter::LessThanOrEqual(leaf) => {
                let kind = self.kind().map(|k| k.as_str()).unwrap_or_default();
                write!(f, "{kind}({}={})", leaf.name(), leaf.value())
            }
            Filter::ContainsAllValues(leaf) => write!(f, "CONTAINSALLVALUES({})", leaf.attribute),
            Filter::And(left, right) => write!(f, "AND({left}, {right})"),
            Filter::Or(left, right) => write!(f, "OR({left}, {right})"),
            Filter::Not(inner) => write!(f, "NOT({inner})"),
        }
    }
}
