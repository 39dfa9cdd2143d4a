//! Framework search
//!
//! [`search`] runs a filtered search against any [`SearchOp`] connector:
//! the filter is translated into native queries, each query is executed in
//! turn, and the records flow through a chain of handlers before reaching
//! the caller:
//!
//! 1. records already returned by an earlier query are dropped (by UID),
//!    only when more than one native query runs;
//! 2. records that do not satisfy the filter are dropped, because native
//!    queries may be broader than the filter;
//! 3. attributes not asked for in `attributes_to_get` are removed.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use crate::attribute::Uid;
use crate::config::SearchSettings;
use crate::error::{ConnectorError, ConnectorResult};
use crate::filter::Filter;
use crate::object::{ConnectorObject, ObjectClass};
use crate::operation::{OperationOptions, SearchSummary};
use crate::traits::{ResultsHandler, SearchOp};
use crate::translator::FilterTranslator;

/// Search `object_class` for records matching `filter`.
///
/// Every record handed to `handler` satisfies `filter` (unless
/// [`SearchSettings::enforce_filter`] is off) and appears once even when
/// several native queries return it. A `None` filter returns everything.
///
/// Stops early when `handler` returns `false`. Fails when translation fails,
/// when the connector fails, or when a record's data cannot be evaluated
/// against the filter; records delivered before the failure stay delivered.
#[instrument(skip_all, fields(connector = connector.display_name(), object_class = %object_class))]
pub async fn search<C>(
    connector: &C,
    object_class: &ObjectClass,
    filter: Option<&Filter>,
    handler: &mut dyn ResultsHandler,
    options: &OperationOptions,
    settings: &SearchSettings,
) -> ConnectorResult<SearchSummary>
where
    C: SearchOp,
{
    settings.validate()?;

    let mut queries = match filter {
        Some(filter) => connector
            .create_filter_translator(object_class, options)
            .translate_with_limit(filter, settings.max_native_queries)?,
        None => Vec::new(),
    };

    if queries.len() > settings.max_native_queries {
        warn!(
            query_count = queries.len(),
            max_native_queries = settings.max_native_queries,
            "Too many native queries, scanning the whole object class instead"
        );
        queries.clear();
    }

    let mut pipeline = Pipeline {
        seen: (queries.len() > 1).then(HashSet::new),
        filter: filter.filter(|_| settings.enforce_filter),
        attributes_to_get: options.attributes_to_get.as_deref(),
        downstream: handler,
        summary: SearchSummary {
            native_queries: queries.len().max(1),
            ..SearchSummary::default()
        },
        error: None,
    };

    let plan: Vec<Option<&C::Query>> = if queries.is_empty() {
        vec![None]
    } else {
        queries.iter().map(Some).collect()
    };

    for (index, query) in plan.into_iter().enumerate() {
        debug!(index, ?query, "Executing native query");
        connector
            .execute_query(object_class, query, &mut pipeline, options)
            .await?;

        if let Some(err) = pipeline.error.take() {
            return Err(err);
        }
        if pipeline.summary.stopped {
            debug!(index, "Search stopped by handler");
            break;
        }
    }

    let summary = pipeline.summary;
    debug!(
        native_queries = summary.native_queries,
        received = summary.received,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        delivered = summary.delivered,
        "Search complete"
    );
    Ok(summary)
}

/// Handler chain between the connector and the caller.
struct Pipeline<'a> {
    seen: Option<HashSet<Uid>>,
    filter: Option<&'a Filter>,
    attributes_to_get: Option<&'a [String]>,
    downstream: &'a mut dyn ResultsHandler,
    summary: SearchSummary,
    error: Option<ConnectorError>,
}

impl ResultsHandler for Pipeline<'_> {
    fn handle(&mut self, object: ConnectorObject) -> bool {
        // The connector should have stopped already.
        if self.summary.stopped || self.error.is_some() {
            return false;
        }
        self.summary.received += 1;

        if let Some(seen) = &mut self.seen {
            if !seen.insert(object.uid().clone()) {
                self.summary.duplicates += 1;
                return true;
            }
        }

        if let Some(filter) = self.filter {
            match filter.accept(&object) {
                Ok(true) => {}
                Ok(false) => {
                    self.summary.rejected += 1;
                    return true;
                }
                Err(err) => {
                    warn!(uid = %object.uid(), error = %err, "Record cannot be evaluated against filter");
                    self.error = Some(err);
                    return false;
                }
            }
        }

        let object = match self.attributes_to_get {
            Some(names) => object.retain_attributes(names),
            None => object,
        };

        self.summary.delivered += 1;
        if !self.downstream.handle(object) {
            self.summary.stopped = true;
            return false;
        }
        true
    }
}
