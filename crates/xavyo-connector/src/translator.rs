//! Filter translation
//!
//! Turns a [`Filter`] tree into a list of native query expressions for a
//! target system. A connector implements [`FilterTranslator`] and overrides
//! only the hooks its target supports; every hook defaults to "cannot
//! express". The provided [`FilterTranslator::translate`] does the rest:
//!
//! 1. NOT is pushed down to the leaves with De Morgan's laws.
//! 2. The tree is simplified: parts that cannot be expressed natively are
//!    widened to "everything", and AND over OR is distributed when that lets
//!    the target combine the operands.
//! 3. The simplified tree is rendered through the hooks, with OR falling back
//!    to separate queries when the target cannot combine the two sides.
//!
//! The result is a list of queries whose union is a superset of the records
//! matching the filter. An empty list means "fetch everything". Callers must
//! still evaluate [`Filter::accept`] on every record returned.
//!
//! ## Example
//!
//! ```
//! use xavyo_connector::attribute::Attribute;
//! use xavyo_connector::filter::{EqualsFilter, Filter};
//! use xavyo_connector::translator::FilterTranslator;
//!
//! struct Ldap;
//!
//! impl FilterTranslator for Ldap {
//!     type Query = String;
//!
//!     fn equals_expression(&self, filter: &EqualsFilter, _not: bool) -> Option<String> {
//!         match filter.values() {
//!             [value] => Some(format!("({}={})", filter.name(), value)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let filter = Filter::or(
//!     Filter::equals(Attribute::single("dept", "eng").unwrap()).unwrap(),
//!     Filter::equals(Attribute::single("dept", "ops").unwrap()).unwrap(),
//! );
//! let queries = Ldap.translate(&filter).unwrap();
//! assert_eq!(queries, vec!["(dept=eng)".to_string(), "(dept=ops)".to_string()]);
//! ```

use std::fmt;

use tracing::{debug, warn};

use crate::error::{ConnectorError, ConnectorResult};
use crate::filter::{ComparableFilter, ContainsAllValuesFilter, EqualsFilter, Filter, StringFilter};

/// Translates filters into native query expressions.
///
/// Hooks return `None` when the target cannot express the predicate. Leaf
/// hooks receive `not = true` when asked for the negated predicate; a hook
/// that can only express the positive form must return `None` in that case.
///
/// Hooks must be deterministic: the engine may call the same hook more than
/// once for the same operands and relies on getting the same answer.
pub trait FilterTranslator {
    /// Native query expression.
    type Query: Clone + PartialEq + fmt::Debug;

    /// Combine two expressions with AND.
    fn and_expression(&self, _left: &Self::Query, _right: &Self::Query) -> Option<Self::Query> {
        None
    }

    /// Combine two expressions with OR.
    fn or_expression(&self, _left: &Self::Query, _right: &Self::Query) -> Option<Self::Query> {
        None
    }

    /// Exact equality. The engine only ever asks for the positive form.
    fn equals_expression(&self, _filter: &EqualsFilter, _not: bool) -> Option<Self::Query> {
        None
    }

    fn contains_expression(&self, _filter: &StringFilter, _not: bool) -> Option<Self::Query> {
        None
    }

    fn starts_with_expression(&self, _filter: &StringFilter, _not: bool) -> Option<Self::Query> {
        None
    }

    fn ends_with_expression(&self, _filter: &StringFilter, _not: bool) -> Option<Self::Query> {
        None
    }

    fn greater_than_expression(
        &self,
        _filter: &ComparableFilter,
        _not: bool,
    ) -> Option<Self::Query> {
        None
    }

    fn greater_than_or_equal_expression(
        &self,
        _filter: &ComparableFilter,
        _not: bool,
    ) -> Option<Self::Query> {
        None
    }

    fn less_than_expression(&self, _filter: &ComparableFilter, _not: bool) -> Option<Self::Query> {
        None
    }

    fn less_than_or_equal_expression(
        &self,
        _filter: &ComparableFilter,
        _not: bool,
    ) -> Option<Self::Query> {
        None
    }

    fn contains_all_values_expression(
        &self,
        _filter: &ContainsAllValuesFilter,
        _not: bool,
    ) -> Option<Self::Query> {
        None
    }

    /// Translate a filter into native queries.
    ///
    /// Returns an empty list when the whole filter degrades to "everything".
    /// Otherwise the union of the returned queries' results is a superset of
    /// the records matching `filter`. Duplicate expressions are removed.
    ///
    /// Fails with [`ConnectorError::TranslatorContract`] when the hooks are
    /// inconsistent: a hook accepts a leaf or a pair of operands while
    /// simplifying and refuses it while rendering.
    fn translate(&self, filter: &Filter) -> ConnectorResult<Vec<Self::Query>> {
        translate_filter(self, filter, usize::MAX)
    }

    /// Like [`translate`](Self::translate), but an AND is never distributed
    /// over OR when that would yield more than `max_expressions`
    /// expressions. Such an AND keeps its cheaper side instead, which widens
    /// the result and bounds the work done for deeply nested filters.
    fn translate_with_limit(
        &self,
        filter: &Filter,
        max_expressions: usize,
    ) -> ConnectorResult<Vec<Self::Query>> {
        translate_filter(self, filter, max_expressions)
    }
}

/// Push NOT down to the leaves.
///
/// `NOT(a AND b)` becomes `NOT a OR NOT b`, `NOT(a OR b)` becomes
/// `NOT a AND NOT b` and double negation cancels out. In the result NOT only
/// ever wraps a leaf.
pub fn normalize_not(filter: &Filter) -> Filter {
    match filter {
        Filter::And(left, right) => Filter::and(normalize_not(left), normalize_not(right)),
        Filter::Or(left, right) => Filter::or(normalize_not(left), normalize_not(right)),
        Filter::Not(inner) => negate(inner),
        leaf => leaf.clone(),
    }
}

/// Normalized form of `NOT filter`.
fn negate(filter: &Filter) -> Filter {
    match filter {
        Filter::And(left, right) => Filter::or(negate(left), negate(right)),
        Filter::Or(left, right) => Filter::and(negate(left), negate(right)),
        Filter::Not(inner) => normalize_not(inner),
        leaf => Filter::negate(leaf.clone()),
    }
}

fn translate_filter<T>(
    translator: &T,
    filter: &Filter,
    max_expressions: usize,
) -> ConnectorResult<Vec<T::Query>>
where
    T: FilterTranslator + ?Sized,
{
    let normalized = normalize_not(filter);

    let Some(simplified) = simplify_and_distribute(translator, normalized, max_expressions)? else {
        debug!(filter = %filter, "Filter has no native form, target will be scanned");
        return Ok(Vec::new());
    };

    let expressions = translate_internal(translator, &simplified)?;

    let mut queries: Vec<T::Query> = Vec::with_capacity(expressions.len());
    for expression in expressions {
        if !queries.contains(&expression) {
            queries.push(expression);
        }
    }

    if queries.len() > 1 {
        warn!(
            filter = %filter,
            query_count = queries.len(),
            "Filter translated to several native queries, results will be merged"
        );
    } else {
        debug!(filter = %filter, query_count = queries.len(), "Filter translated");
    }

    Ok(queries)
}

/// Simplify a NOT-normalized tree against the translator's capabilities.
///
/// `None` stands for "everything". Parts of an AND that cannot be expressed
/// are dropped, which only widens the result. When neither side of an AND
/// can be combined with the other, or when distributing would yield more than
/// `max_expressions` expressions, the side yielding fewer queries is kept.
fn simplify_and_distribute<T>(
    translator: &T,
    filter: Filter,
    max_expressions: usize,
) -> ConnectorResult<Option<Filter>>
where
    T: FilterTranslator + ?Sized,
{
    match filter {
        Filter::And(left, right) => {
            let simplified_left = simplify_and_distribute(translator, *left, max_expressions)?;
            let simplified_right = simplify_and_distribute(translator, *right, max_expressions)?;
            let (left, right) = match (simplified_left, simplified_right) {
                (None, right) => return Ok(right),
                (left, None) => return Ok(left),
                (Some(left), Some(right)) => (left, right),
            };

            let left_expressions = translate_internal(translator, &left)?;
            let right_expressions = translate_internal(translator, &right)?;
            let keep_left = left_expressions.len() <= right_expressions.len();

            let and_possible = left_expressions.iter().any(|l| {
                right_expressions
                    .iter()
                    .any(|r| translator.and_expression(l, r).is_some())
            });
            if !and_possible {
                return Ok(Some(if keep_left { left } else { right }));
            }

            let distributed_count = left_expressions.len().saturating_mul(right_expressions.len());
            if distributed_count > 1 && distributed_count > max_expressions {
                debug!(
                    distributed_count,
                    max_expressions,
                    "Distributing AND over OR exceeds the expression limit, keeping the cheaper side"
                );
                return Ok(Some(if keep_left { left } else { right }));
            }

            if left_expressions.len() > 1 {
                let Filter::Or(a, b) = left else {
                    return Err(ConnectorError::internal(format!(
                        "only OR can yield several expressions, got {left}"
                    )));
                };
                let distributed = Filter::or(Filter::and(*a, right.clone()), Filter::and(*b, right));
                return simplify_and_distribute(translator, distributed, max_expressions);
            }

            if right_expressions.len() > 1 {
                let Filter::Or(a, b) = right else {
                    return Err(ConnectorError::internal(format!(
                        "only OR can yield several expressions, got {right}"
                    )));
                };
                let distributed = Filter::or(Filter::and(left.clone(), *a), Filter::and(left, *b));
                return simplify_and_distribute(translator, distributed, max_expressions);
            }

            Ok(Some(Filter::and(left, right)))
        }
        Filter::Or(left, right) => {
            let Some(left) = simplify_and_distribute(translator, *left, max_expressions)? else {
                return Ok(None);
            };
            let Some(right) = simplify_and_distribute(translator, *right, max_expressions)? else {
                return Ok(None);
            };
            Ok(Some(Filter::or(left, right)))
        }
        leaf => Ok(leaf_expression(translator, &leaf)?.map(|_| leaf)),
    }
}

/// Render a simplified tree through the hooks.
///
/// Every leaf of a simplified tree was accepted by its hook, so a refusal
/// here is a contract violation rather than "everything".
fn translate_internal<T>(translator: &T, filter: &Filter) -> ConnectorResult<Vec<T::Query>>
where
    T: FilterTranslator + ?Sized,
{
    match filter {
        Filter::And(left, right) => {
            let left_expressions = translate_internal(translator, left)?;
            let right_expressions = translate_internal(translator, right)?;
            match (left_expressions.as_slice(), right_expressions.as_slice()) {
                ([l], [r]) => translator.and_expression(l, r).map(|e| vec![e]).ok_or_else(|| {
                    ConnectorError::translator_contract(format!(
                        "and_expression refused operands it accepted earlier: {filter}"
                    ))
                }),
                _ => Err(ConnectorError::translator_contract(format!(
                    "AND operands must translate to exactly one expression each, \
                     got {} and {} for {filter}",
                    left_expressions.len(),
                    right_expressions.len()
                ))),
            }
        }
        Filter::Or(left, right) => {
            let mut expressions = translate_internal(translator, left)?;
            let right_expressions = translate_internal(translator, right)?;
            if let ([l], [r]) = (expressions.as_slice(), right_expressions.as_slice()) {
                if let Some(combined) = translator.or_expression(l, r) {
                    return Ok(vec![combined]);
                }
            }
            expressions.extend(right_expressions);
            Ok(expressions)
        }
        leaf => leaf_expression(translator, leaf)?
            .map(|e| vec![e])
            .ok_or_else(|| {
                ConnectorError::translator_contract(format!(
                    "leaf hook refused a filter it accepted earlier: {leaf}"
                ))
            }),
    }
}

/// Ask the matching hook for a leaf or a negated leaf.
fn leaf_expression<T>(translator: &T, filter: &Filter) -> ConnectorResult<Option<T::Query>>
where
    T: FilterTranslator + ?Sized,
{
    let (leaf, not) = match filter {
        Filter::Not(inner) => (inner.as_ref(), true),
        other => (other, false),
    };

    let expression = match leaf {
        // Negated exact equality is never expressed natively.
        Filter::Equals(_) if not => None,
        Filter::Equals(f) => translator.equals_expression(f, false),
        Filter::Contains(f) => translator.contains_expression(f, not),
        Filter::StartsWith(f) => translator.starts_with_expression(f, not),
        Filter::EndsWith(f) => translator.ends_with_expression(f, not),
        Filter::GreaterThan(f) => translator.greater_than_expression(f, not),
        Filter::GreaterThanOrEqual(f) => translator.greater_than_or_equal_expression(f, not),
        Filter::LessThan(f) => translator.less_than_expression(f, not),
        Filter::LessThanOrEqual(f) => translator.less_than_or_equal_expression(f, not),
        Filter::ContainsAllValues(f) => translator.contains_all_values_expression(f, not),
        Filter::And(..) | Filter::Or(..) | Filter::Not(_) => {
            return Err(ConnectorError::internal(format!(
                "expected a leaf or a negated leaf, got {filter}"
            )))
        }
    };

    Ok(expression)
}
