//! Error types for worktrail operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Uniqueness conflict on {entity_type:?}.{field}: '{value}' already exists")]
    Conflict {
        entity_type: EntityType,
        field: String,
        value: String,
    },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all worktrail errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorktrailError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Export error: {reason}")]
    Export { reason: String },
}

impl WorktrailError {
    /// Shorthand for a not-found storage error.
    pub fn not_found(entity_type: EntityType, id: Uuid) -> Self {
        WorktrailError::Storage(StorageError::NotFound { entity_type, id })
    }

    /// Shorthand for an invalid-value validation error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        WorktrailError::Validation(ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Shorthand for a missing-field validation error.
    pub fn required(field: impl Into<String>) -> Self {
        WorktrailError::Validation(ValidationError::RequiredFieldMissing {
            field: field.into(),
        })
    }

    /// True when the error is a uniqueness conflict raised by a store.
    pub fn is_conflict(&self) -> bool {
        matches!(self, WorktrailError::Storage(StorageError::Conflict { .. }))
    }

    /// True when the error is a not-found raised by a store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WorktrailError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for worktrail operations.
pub type WorktrailResult<T> = Result<T, WorktrailError>;

// =============================================================================
// TESTS
// =============================================================================
