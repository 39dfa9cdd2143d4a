//! Connector Framework traits
//!
//! Capability-based trait definitions for connectors, inspired by `ConnId`.
//! A connector implements [`Connector`] plus whichever operation traits its
//! target supports.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, Uid};
use crate::config::SearchSettings;
use crate::error::ConnectorResult;
use crate::filter::Filter;
use crate::object::{ConnectorObject, ObjectClass};
use crate::operation::{AttributeDelta, OperationOptions};
use crate::translator::FilterTranslator;

/// Base trait for all connectors.
///
/// This trait provides common functionality that all connectors must implement,
/// regardless of their specific capabilities.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;

    /// Test the connection to the target system.
    ///
    /// Returns `Ok(())` if the connection is successful, or an error describing
    /// what went wrong.
    async fn test_connection(&self) -> ConnectorResult<()>;

    /// Dispose of connector resources.
    ///
    /// Implementations should close connections, release pools, etc.
    async fn dispose(&self) -> ConnectorResult<()>;

    /// Check if the connector is currently healthy.
    ///
    /// This is a lightweight health check, different from `test_connection`
    /// which may perform a more thorough validation.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Receives search results one at a time.
///
/// Returning `false` asks the producer to stop.
pub trait ResultsHandler: Send {
    /// Handle one record.
    fn handle(&mut self, object: ConnectorObject) -> bool;
}

impl<F> ResultsHandler for F
where
    F: FnMut(ConnectorObject) -> bool + Send,
{
    fn handle(&mut self, object: ConnectorObject) -> bool {
        self(object)
    }
}

/// Capability for searching objects in the target system.
///
/// The connector supplies a [`FilterTranslator`] for its native query
/// language and executes one native query at a time. Filter translation,
/// merging of several queries, in-memory filtering and attribute projection
/// are done by [`search`](crate::search::search).
#[async_trait]
pub trait SearchOp: Connector {
    /// Native query expression.
    type Query: Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Translator producing [`Self::Query`].
    type Translator: FilterTranslator<Query = Self::Query> + Send;

    /// Create a translator for searches on the given object class.
    fn create_filter_translator(
        &self,
        object_class: &ObjectClass,
        options: &OperationOptions,
    ) -> Self::Translator;

    /// Execute a single native query.
    ///
    /// `query` is `None` when every record of the class should be returned.
    /// Implementations must stop producing records as soon as `handler`
    /// returns `false`.
    async fn execute_query(
        &self,
        object_class: &ObjectClass,
        query: Option<&Self::Query>,
        handler: &mut dyn ResultsHandler,
        options: &OperationOptions,
    ) -> ConnectorResult<()>;

    /// Get a single object by its UID.
    ///
    /// This is a convenience method that searches for a specific object.
    async fn get_object(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        options: &OperationOptions,
    ) -> ConnectorResult<Option<ConnectorObject>>
    where
        Self: Sized,
    {
        let filter = Filter::equals(uid.to_attribute())?;
        let mut found = None;
        let mut handler = |object: ConnectorObject| {
            found = Some(object);
            false
        };
        crate::search::search(
            self,
            object_class,
            Some(&filter),
            &mut handler,
            options,
            &SearchSettings::default(),
        )
        .await?;
        Ok(found)
    }
}

/// Capability for creating objects in the target system.
#[async_trait]
pub trait CreateOp: Connector {
    /// Create a new object in the target system.
    ///
    /// # Arguments
    /// * `object_class` - The type of object to create
    /// * `attributes` - The attributes for the new object, including `__NAME__`
    /// * `options` - Operation options
    ///
    /// # Returns
    /// The unique identifier (UID) of the created object in the target system.
    async fn create(
        &self,
        object_class: &ObjectClass,
        attributes: Vec<Attribute>,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid>;
}

/// Capability for updating objects in the target system.
#[async_trait]
pub trait UpdateOp: Connector {
    /// Update an existing object in the target system.
    ///
    /// # Returns
    /// The UID of the updated object (may change for some systems).
    async fn update(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        changes: AttributeDelta,
        options: &OperationOptions,
    ) -> ConnectorResult<Uid>;
}

/// Capability for deleting objects from the target system.
#[async_trait]
pub trait DeleteOp: Connector {
    /// Delete an object from the target system.
    async fn delete(
        &self,
        object_class: &ObjectClass,
        uid: &Uid,
        options: &OperationOptions,
    ) -> ConnectorResult<()>;
}

/// Marker trait for connectors that support all CRUD operations.
pub trait FullCrud: CreateOp + UpdateOp + DeleteOp + SearchOp {}

// Blanket implementation for any connector that implements all CRUD ops
impl<T> FullCrud for T where T: CreateOp + UpdateOp + DeleteOp + SearchOp {}

/// Opaque synchronization position.
///
/// Different systems use different token formats: an LDAP sync cookie, a
/// changelog number, a database sequence or timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncToken(String);

impl SyncToken {
    /// Create a token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type of change detected during synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDeltaType {
    /// A new object was created.
    Create,
    /// An existing object was updated.
    Update,
    /// The object was created or updated; the target cannot tell which.
    CreateOrUpdate,
    /// An object was deleted.
    Delete,
}

impl fmt::Display for SyncDeltaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDeltaType::Create => write!(f, "create"),
            SyncDeltaType::Update => write!(f, "update"),
            SyncDeltaType::CreateOrUpdate => write!(f, "create_or_update"),
            SyncDeltaType::Delete => write!(f, "delete"),
        }
    }
}

/// A detected change from a target system during live synchronization.
///
/// Non-delete deltas always carry the current object; their UID is the
/// object's UID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncDelta {
    token: SyncToken,
    delta_type: SyncDeltaType,
    uid: Uid,
    object: Option<ConnectorObject>,
    timestamp: Option<DateTime<Utc>>,
}

impl SyncDelta {
    fn with_object(token: SyncToken, delta_type: SyncDeltaType, object: ConnectorObject) -> Self {
        Self {
            token,
            delta_type,
            uid: object.uid().clone(),
            object: Some(object),
            timestamp: None,
        }
    }

    /// Create a new sync delta for a created object.
    pub fn created(token: SyncToken, object: ConnectorObject) -> Self {
        Self::with_object(token, SyncDeltaType::Create, object)
    }

    /// Create a new sync delta for an updated object.
    pub fn updated(token: SyncToken, object: ConnectorObject) -> Self {
        Self::with_object(token, SyncDeltaType::Update, object)
    }

    /// Create a new sync delta for an object that was created or updated.
    pub fn created_or_updated(token: SyncToken, object: ConnectorObject) -> Self {
        Self::with_object(token, SyncDeltaType::CreateOrUpdate, object)
    }

    /// Create a new sync delta for a deleted object.
    pub fn deleted(token: SyncToken, uid: Uid) -> Self {
        Self {
            token,
            delta_type: SyncDeltaType::Delete,
            uid,
            object: None,
            timestamp: None,
        }
    }

    /// Set the timestamp of the change.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Position of this change; resume after it with this token.
    pub fn token(&self) -> &SyncToken {
        &self.token
    }

    pub fn delta_type(&self) -> SyncDeltaType {
        self.delta_type
    }

    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Current state of the object, `None` for deletions.
    pub fn object(&self) -> Option<&ConnectorObject> {
        self.object.as_ref()
    }

    /// Timestamp of the change (if provided by the source system).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

/// Receives sync deltas one at a time.
///
/// Returning `false` asks the connector to stop.
pub trait SyncResultsHandler: Send {
    fn handle(&mut self, delta: SyncDelta) -> bool;
}

impl<F> SyncResultsHandler for F
where
    F: FnMut(SyncDelta) -> bool + Send,
{
    fn handle(&mut self, delta: SyncDelta) -> bool {
        self(delta)
    }
}

/// Capability for live synchronization from target systems.
///
/// Connectors implementing this trait can detect changes made in the target
/// system and report them in order.
#[async_trait]
pub trait SyncOp: Connector {
    /// Report changes after `token` in order.
    ///
    /// With no token the connector reports changes from the start of its
    /// change log. Returns the token of the last change handed to `handler`,
    /// or `None` when there was nothing to report.
    async fn sync(
        &self,
        object_class: &ObjectClass,
        token: Option<&SyncToken>,
        handler: &mut dyn SyncResultsHandler,
        options: &OperationOptions,
    ) -> ConnectorResult<Option<SyncToken>>;

    /// Token of the most recent change, so a caller can start syncing from
    /// "now" without replaying history.
    async fn latest_sync_token(
        &self,
        object_class: &ObjectClass,
    ) -> ConnectorResult<Option<SyncToken>>;
}
