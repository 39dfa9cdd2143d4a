//! Integration test helpers for xavyo-connector.
//!
//! Provides an in-memory directory connector whose native query language is
//! LDAP filter syntax. Native matching follows directory semantics (any value
//! matches, case-insensitive strings), so native queries are deliberately
//! broader than the framework's filters.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Mutex, Once};

use tokio::sync::RwLock;
use xavyo_connector::async_trait;
use xavyo_connector::prelude::*;

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

/// What the directory can express natively.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub and: bool,
    pub or: bool,
    pub substrings: bool,
    pub ordering: bool,
}

impl Capabilities {
    /// Everything.
    pub fn full() -> Self {
        Self {
            and: true,
            or: true,
            substrings: true,
            ordering: true,
        }
    }

    /// Single predicates only, no AND or OR.
    pub fn leaves_only() -> Self {
        Self {
            and: false,
            or: false,
            substrings: true,
            ordering: false,
        }
    }

    /// Predicates and AND, no OR.
    pub fn and_only() -> Self {
        Self {
            and: true,
            ..Self::leaves_only()
        }
    }
}

#[derive(Debug, Clone)]
enum Pattern {
    Equals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    AtLeast(AttributeValue),
    AtMost(AttributeValue),
}

#[derive(Debug, Clone)]
enum Expr {
    Match {
        attribute: String,
        pattern: Pattern,
        negated: bool,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn matches(&self, object: &ConnectorObject) -> bool {
        match self {
            Expr::And(l, r) => l.matches(object) && r.matches(object),
            Expr::Or(l, r) => l.matches(object) || r.matches(object),
            Expr::Match {
                attribute,
                pattern,
                negated,
            } => {
                let values = object
                    .attribute(attribute)
                    .and_then(Attribute::values)
                    .unwrap_or_default();
                let any = values.iter().any(|v| pattern.matches(v));
                any != *negated
            }
        }
    }
}

impl Pattern {
    fn matches(&self, value: &AttributeValue) -> bool {
        let text = value.to_string().to_lowercase();
        match self {
            Pattern::Equals(p) => text == p.to_lowercase(),
            Pattern::Contains(p) => text.contains(&p.to_lowercase()),
            Pattern::StartsWith(p) => text.starts_with(&p.to_lowercase()),
            Pattern::EndsWith(p) => text.ends_with(&p.to_lowercase()),
            Pattern::AtLeast(bound) => value
                .compare(bound)
                .is_ok_and(|o| o != std::cmp::Ordering::Less),
            Pattern::AtMost(bound) => value
                .compare(bound)
                .is_ok_and(|o| o != std::cmp::Ordering::Greater),
        }
    }
}

/// A native query: LDAP filter text plus what the directory evaluates.
///
/// Equality is by text only.
#[derive(Debug, Clone)]
pub struct LdapQuery {
    text: String,
    expr: Expr,
}

impl LdapQuery {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the directory would return `object` for this query.
    pub fn matches(&self, object: &ConnectorObject) -> bool {
        self.expr.matches(object)
    }
}

impl PartialEq for LdapQuery {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

/// Escape special characters in LDAP filter values (RFC 4515).
pub fn escape_ldap_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

pub struct LdapTranslator {
    caps: Capabilities,
}

impl LdapTranslator {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    fn leaf(
        &self,
        attribute: &str,
        op: &str,
        rendered: String,
        pattern: Pattern,
        not: bool,
    ) -> LdapQuery {
        let text = format!("({attribute}{op}{rendered})");
        LdapQuery {
            text: if not { format!("(!{text})") } else { text },
            expr: Expr::Match {
                attribute: attribute.to_string(),
                pattern,
                negated: not,
            },
        }
    }

    fn substring(
        &self,
        filter: &StringFilter,
        not: bool,
        shape: fn(&str) -> String,
        pattern: fn(String) -> Pattern,
    ) -> Option<LdapQuery> {
        if !self.caps.substrings {
            return None;
        }
        let escaped = escape_ldap_value(filter.value());
        Some(self.leaf(
            filter.name(),
            "=",
            shape(&escaped),
            pattern(filter.value().to_string()),
            not,
        ))
    }

    /// Directories only have `>=` and `<=`; strict comparisons map to the
    /// inclusive form and rely on in-memory filtering.
    fn ordering(&self, filter: &ComparableFilter, not: bool, at_least: bool) -> Option<LdapQuery> {
        if !self.caps.ordering || not {
            return None;
        }
        let value = filter.value().clone();
        let (op, pattern) = if at_least {
            (">=", Pattern::AtLeast(value))
        } else {
            ("<=", Pattern::AtMost(value))
        };
        Some(self.leaf(
            filter.name(),
            op,
            escape_ldap_value(&filter.value().to_string()),
            pattern,
            false,
        ))
    }
}

impl FilterTranslator for LdapTranslator {
    type Query = LdapQuery;

    fn and_expression(&self, left: &LdapQuery, right: &LdapQuery) -> Option<LdapQuery> {
        self.caps.and.then(|| LdapQuery {
            text: format!("(&{}{})", left.text, right.text),
            expr: Expr::And(Box::new(left.expr.clone()), Box::new(right.expr.clone())),
        })
    }

    fn or_expression(&self, left: &LdapQuery, right: &LdapQuery) -> Option<LdapQuery> {
        self.caps.or.then(|| LdapQuery {
            text: format!("(|{}{})", left.text, right.text),
            expr: Expr::Or(Box::new(left.expr.clone()), Box::new(right.expr.clone())),
        })
    }

    fn equals_expression(&self, filter: &EqualsFilter, _not: bool) -> Option<LdapQuery> {
        // Multi-value equality has no single LDAP assertion.
        let [value] = filter.values() else {
            return None;
        };
        let text = value.as_str()?;
        Some(self.leaf(
            filter.name(),
            "=",
            escape_ldap_value(text),
            Pattern::Equals(text.to_string()),
            false,
        ))
    }

    fn contains_expression(&self, filter: &StringFilter, not: bool) -> Option<LdapQuery> {
        self.substring(filter, not, |v| format!("*{v}*"), Pattern::Contains)
    }

    fn starts_with_expression(&self, filter: &StringFilter, not: bool) -> Option<LdapQuery> {
        self.substring(filter, not, |v| format!("{v}*"), Pattern::StartsWith)
    }

    fn ends_with_expression(&self, filter: &StringFilter, not: bool) -> Option<LdapQuery> {
        self.substring(filter, not, |v| format!("*{v}"), Pattern::EndsWith)
    }

    fn greater_than_expression(&self, filter: &ComparableFilter, not: bool) -> Option<LdapQuery> {
        self.ordering(filter, not, true)
    }

    fn greater_than_or_equal_expression(
        &self,
        filter: &ComparableFilter,
        not: bool,
    ) -> Option<LdapQuery> {
        self.ordering(filter, not, true)
    }

    fn less_than_expression(&self, filter: &ComparableFilter, not: bool) -> Option<LdapQuery> {
        self.ordering(filter, not, false)
    }

    fn less_than_or_equal_expression(
        &self,
        filter: &ComparableFilter,
        not: bool,
    ) -> Option<LdapQuery> {
        self.ordering(filter, not, false)
    }
}

/// In-memory directory connector.
pub struct MemoryDirectory {
    name: String,
    caps: Capabilities,
    objects: RwLock<Vec<ConnectorObject>>,
    changelog: RwLock<Vec<(ObjectClass, SyncDelta)>>,
    executed: Mutex<Vec<Option<String>>>,
    next_id: AtomicU64,
}

impl MemoryDirectory {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            name: "memory-directory".to_string(),
            caps,
            objects: RwLock::new(Vec::new()),
            changelog: RwLock::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a directory holding the given objects (not recorded in the
    /// change log).
    pub fn with_objects(caps: Capabilities, objects: Vec<ConnectorObject>) -> Self {
        let directory = Self::new(caps);
        directory.objects.try_write().unwrap().extend(objects);
        directory
    }

    /// Native queries executed so far, `None` for full scans.
    pub fn executed_queries(&self) -> Vec<Option<String>> {
        self.executed.lock().unwrap().clone()
    }

    async fn record(
        &self,
        object_class: &ObjectClass,
        delta: impl FnOnce(SyncToken) -> SyncDelta + Send,
    ) {
        let mut changelog = self.changelog.write().await;
        let token = SyncToken::new((changelog.len() + 1).to_string());
        changelog.push((object_class.clone(), delta(token)));
    }
}

#[async_trait]
impl Connector for MemoryDirectory {
    fn display_name(&self) -> &str {
        &self.name
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        Ok(())
    }

    async fn dispose(&self) -> ConnectorResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SearchOp for MemoryDirectory {
    type Query = LdapQuery;
    type Translator = LdapTranslator;

    fn create_filter_translator(
        &self,
        _object_class: &ObjectClass,
        _options: &OperationOptions,
    ) -> LdapTranslator {
        LdapTranslator::new(self.caps)
    }

    async fn execute_query(
        &self,
        object_class: &ObjectClass,
        query: Option<&LdapQuery>,
        handler: &mut dyn ResultsHandler,
        _options: &OperationOptions,
    ) -> ConnectorResult<()> {
        self.executed
            .lock()
            .unwrap()
            .push(query.map(|q| q.as_str().to_string()));

        let objects = self.objects.read().await;
        for object in objects.iter().filter(|o| o.object_class() == object_class) {
            if query.map_or(true, |q| q.matches(object)) && !handler.handle(object.clone()) {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CreateOp for MemoryDirectory {
    async fn create(
        &self,
        object_class: &ObjectClass,
        attributes: Vec<Attribute>,
        _options: &OperationOptions,
    ) -> ConnectorResult<Uid> {
        let uid = Uid::new(format!(
            "u-{}",
            self.next_id.fetch_add(1, AtomicOrdering::SeqCst)
        ))?;
        let object = ConnectorObject::builder(object_class.clone())
            .with_attributes(attributes)
            .with_uid(&uid)
            .build()?;

        {
            let mut objects = self.objects.write().await;
            if objects
                .iter()
                .any(|o| o.object_class() == object_class && o.name() == object.name())
            {
                return Err(ConnectorError::ObjectAlreadyExists {
                    identifier: object.name().to_string(),
                });
            }
            objects.push(object.clone());
        }

        self.record(object_class, |token| SyncDelta::created(token, object))
            .await;
        Ok(uid)
    }
}

#[async_trait]
impl UpdateOp for MemoryDirectory {
    async fn update(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        changes: AttributeDelta,
        _options: &OperationOptions,
    ) -> ConnectorResult<Uid> {
        let updated = {
            let mut objects = self.objects.write().await;
            let slot = objects
                .iter_mut()
                .find(|o| o.object_class() == object_class && o.uid() == uid)
                .ok_or_else(|| ConnectorError::ObjectNotFound {
                    identifier: uid.to_string(),
                })?;
            let updated = changes.apply(slot.clone())?;
            *slot = updated.clone();
            updated
        };

        self.record(object_class, |token| SyncDelta::updated(token, updated))
            .await;
        Ok(uid.clone())
    }
}

#[async_trait]
impl DeleteOp for MemoryDirectory {
    async fn delete(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        _options: &OperationOptions,
    ) -> ConnectorResult<()> {
        {
            let mut objects = self.objects.write().await;
            let before = objects.len();
            objects.retain(|o| !(o.object_class() == object_class && o.uid() == uid));
            if objects.len() == before {
                return Err(ConnectorError::ObjectNotFound {
                    identifier: uid.to_string(),
                });
            }
        }

        let uid = uid.clone();
        self.record(object_class, |token| SyncDelta::deleted(token, uid))
            .await;
        Ok(())
    }
}

#[async_trait]
impl SyncOp for MemoryDirectory {
    async fn sync(
        &self,
        object_class: &ObjectClass,
        token: Option<&SyncToken>,
        handler: &mut dyn SyncResultsHandler,
        _options: &OperationOptions,
    ) -> ConnectorResult<Option<SyncToken>> {
        let start = match token {
            Some(token) => token.value().parse::<usize>().map_err(|_| {
                ConnectorError::invalid_data(format!("unknown sync token {token}"))
            })?,
            None => 0,
        };

        let changelog = self.changelog.read().await;
        let mut last = None;
        for (class, delta) in changelog.iter().skip(start) {
            if class != object_class {
                continue;
            }
            last = Some(delta.token().clone());
            if !handler.handle(delta.clone()) {
                break;
            }
        }
        Ok(last)
    }

    async fn latest_sync_token(
        &self,
        object_class: &ObjectClass,
    ) -> ConnectorResult<Option<SyncToken>> {
        let changelog = self.changelog.read().await;
        Ok(changelog
            .iter()
            .rev()
            .find(|(class, _)| class == object_class)
            .map(|(_, delta)| delta.token().clone()))
    }
}

/// Build an account with the given UID and name plus string attributes.
pub fn account(uid: &str, name: &str, attributes: &[(&str, &str)]) -> ConnectorObject {
    ConnectorObject::builder(ObjectClass::account())
        .with_uid(&Uid::new(uid).unwrap())
        .with_name(&Name::new(name).unwrap())
        .with_attributes(
            attributes
                .iter()
                .map(|(n, v)| Attribute::single(*n, *v).unwrap()),
        )
        .build()
        .unwrap()
}

/// Attributes for creating an account.
pub fn new_account(name: &str, attributes: &[(&str, &str)]) -> Vec<Attribute> {
    std::iter::once(Attribute::single(NAME_NAME, name).unwrap())
        .chain(
            attributes
                .iter()
                .map(|(n, v)| Attribute::single(*n, *v).unwrap()),
        )
        .collect()
}

pub fn eq(name: &str, value: &str) -> Filter {
    Filter::equals(Attribute::single(name, value).unwrap()).unwrap()
}

pub fn starts_with(name: &str, value: &str) -> Filter {
    Filter::starts_with(Attribute::single(name, value).unwrap()).unwrap()
}

pub fn contains(name: &str, value: &str) -> Filter {
    Filter::contains(Attribute::single(name, value).unwrap()).unwrap()
}

/// The dept/title staff directory used across the search tests.
///
/// `dave` has dept "ENG": a directory matches it for `(dept=eng)` but exact
/// equality does not.
pub fn staff() -> Vec<ConnectorObject> {
    vec![
        account(
            "1",
            "alice",
            &[("dept", "eng"), ("title", "Sr Engineer"), ("mail", "alice@example.com")],
        ),
        account(
            "2",
            "bob",
            &[("dept", "eng"), ("title", "Jr Engineer"), ("mail", "bob@example.com")],
        ),
        account(
            "3",
            "carol",
            &[("dept", "ops"), ("title", "Sr Manager"), ("mail", "carol@example.com")],
        ),
        account(
            "4",
            "dave",
            &[("dept", "ENG"), ("title", "Sr Analyst"), ("mail", "dave@example.com")],
        ),
    ]
}

/// Run a search collecting delivered records.
pub async fn collect(
    directory: &MemoryDirectory,
    filter: Option<&Filter>,
    options: &OperationOptions,
    settings: &SearchSettings,
) -> ConnectorResult<(Vec<ConnectorObject>, SearchSummary)> {
    let mut found = Vec::new();
    let mut handler = |object: ConnectorObject| {
        found.push(object);
        true
    };
    let summary = search(
        directory,
        &ObjectClass::account(),
        filter,
        &mut handler,
        options,
        settings,
    )
    .await?;
    Ok((found, summary))
}

/// Names of the given records, sorted.
pub fn names(objects: &[ConnectorObject]) -> Vec<String> {
    let mut names: Vec<String> = objects.iter().map(|o| o.name().value().to_string()).collect();
    names.sort();
    names
}
