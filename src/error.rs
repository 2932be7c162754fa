//! Error types for entitystore
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityId;

/// Result type alias using EntityError
pub type Result<T> = std::result::Result<T, EntityError>;

/// Unified error type for entitystore operations
#[derive(Debug, Error)]
pub enum EntityError {
    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store access error on {path}: {source}")]
    StoreAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Persist failed for {path}: {reason}")]
    PersistFailure { path: PathBuf, reason: String },

    #[error("Store corrupted: {0}")]
    Corrupted(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Member Access Errors
    // -------------------------------------------------------------------------
    #[error("{entity_type} does not have a member named {member}")]
    UnknownMember { entity_type: String, member: String },

    #[error("{entity_type} data is missing member {member}")]
    MissingMember { entity_type: String, member: String },

    #[error("{entity_type} attribute {attribute} is read-only")]
    ReadOnlyAttribute { entity_type: String, attribute: String },

    // -------------------------------------------------------------------------
    // Registry Errors
    // -------------------------------------------------------------------------
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("{entity_type} field {field} is not a valid primary key (expected integer or text)")]
    InvalidPrimaryKey { entity_type: String, field: String },

    #[error("{entity_type} primary key {key} is already in use")]
    DuplicatePrimaryKey { entity_type: String, key: String },

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("No default entity manager has been set")]
    NoDefaultManager,

    #[error("Entity {id} has been deleted")]
    DetachedEntity { id: EntityId },

    #[error("Entity {id} belongs to a different manager")]
    ForeignEntity { id: EntityId },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
