//! # Connector Framework
//!
//! Core abstractions for connecting xavyo to external identity systems.
//!
//! Every target system (LDAP directory, database, REST API) is exposed
//! through the same record model: objects of an [`ObjectClass`] made of
//! named, multi-valued [`Attribute`]s, identified by a [`Uid`] and a
//! [`Name`]. Searches are expressed as [`Filter`] trees and translated into
//! each target's native query language by a connector-supplied
//! [`FilterTranslator`].
//!
//! ## Architecture
//!
//! The framework uses a capability-based trait system inspired by `ConnId`:
//!
//! - [`Connector`] - Base trait all connectors implement
//! - [`SearchOp`] - Native query execution plus a filter translator
//! - [`CreateOp`], [`UpdateOp`], [`DeleteOp`] - CRUD operations
//! - [`SyncOp`] - Change detection with sync tokens
//!
//! ## Example
//!
//! ```ignore
//! use xavyo_connector::prelude::*;
//!
//! let filter = Filter::and(
//!     Filter::equals(Attribute::single("dept", "eng")?)?,
//!     Filter::starts_with(Attribute::single("title", "Sr")?)?,
//! );
//!
//! let mut found = Vec::new();
//! let summary = search(
//!     &connector,
//!     &ObjectClass::account(),
//!     Some(&filter),
//!     &mut |object: ConnectorObject| {
//!         found.push(object);
//!         true
//!     },
//!     &OperationOptions::new().with_attributes_to_get(["mail"]),
//!     &SearchSettings::default(),
//! )
//! .await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`value`] - Attribute value types
//! - [`guarded`] - Encrypted string values
//! - [`attribute`] - Attributes, `Uid` and `Name`
//! - [`object`] - Object classes and connector objects
//! - [`filter`] - Filter trees and in-memory evaluation
//! - [`translator`] - Filter translation into native queries
//! - [`traits`] - Connector capability traits
//! - [`search`] - Framework search pipeline
//! - [`operation`] - Operation options, deltas, search summary
//! - [`config`] - Search settings
//! - [`error`] - Error types with transient/permanent classification

pub mod attribute;
pub mod config;
pub mod error;
pub mod filter;
pub mod guarded;
pub mod object;
pub mod operation;
pub mod search;
pub mod traits;
pub mod translator;
pub mod value;

pub use attribute::{Attribute, Name, Uid};
pub use filter::Filter;
pub use object::{ConnectorObject, ObjectClass};
pub use traits::{Connector, CreateOp, DeleteOp, SearchOp, SyncOp, UpdateOp};
pub use translator::FilterTranslator;

/// Prelude module for convenient imports.
///
/// ```
/// use xavyo_connector::prelude::*;
/// ```
pub mod prelude {
    // Record model
    pub use crate::attribute::{
        Attribute, Name, Uid, ENABLE_NAME, NAME_NAME, PASSWORD_NAME, UID_NAME,
    };
    pub use crate::guarded::GuardedString;
    pub use crate::object::{ConnectorObject, ConnectorObjectBuilder, ObjectClass};
    pub use crate::value::AttributeValue;

    // Filters and translation
    pub use crate::filter::{
        ComparableFilter, ContainsAllValuesFilter, EqualsFilter, Filter, FilterKind, StringFilter,
    };
    pub use crate::translator::{normalize_not, FilterTranslator};

    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult};

    // Traits
    pub use crate::traits::{
        Connector, CreateOp, DeleteOp, FullCrud, ResultsHandler, SearchOp, SyncDelta,
        SyncDeltaType, SyncOp, SyncResultsHandler, SyncToken, UpdateOp,
    };

    // Operations
    pub use crate::operation::{AttributeDelta, OperationOptions, SearchSummary};
    pub use crate::search::search;

    // Configuration
    pub use crate::config::SearchSettings;
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;
