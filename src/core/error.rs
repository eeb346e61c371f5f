//! Typed error handling for bindery
//!
//! Every failure the crate can report falls into one of three categories:
//!
//! - [`ConfigurationError`]: a malformed field declaration, schema or store
//!   setup. Surfaced at build time and never recoverable.
//! - [`ModelError`]: misuse of a model (unknown field) or the structured,
//!   recoverable list of validation failures.
//! - [`StorageError`]: a backend reported that a write or delete failed.
//!
//! [`BinderyError`] wraps all of them and knows how to turn itself into an
//! HTTP response, so the REST layer can return it directly from handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! match controller.create(&payload) {
//!     Ok(response) => response,
//!     Err(BinderyError::Model(ModelError::Validation(errors))) => {
//!         // errors.failures() lists every invalid field
//!     }
//!     Err(other) => return Err(other),
//! }
//! ```

use crate::core::validation::ValidationErrors;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Convenience alias used across the crate
pub type BinderyResult<T> = Result<T, BinderyError>;

/// The main error type for bindery
#[derive(Debug, Error)]
pub enum BinderyError {
    /// Malformed declarations or store wiring
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Unknown fields and validation failures
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Backend write/delete failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl BinderyError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BinderyError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BinderyError::Model(e) => e.status_code(),
            BinderyError::Storage(e) => e.status_code(),
            BinderyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            BinderyError::Configuration(_) => "CONFIG_ERROR",
            BinderyError::Model(e) => e.error_code(),
            BinderyError::Storage(e) => e.error_code(),
            BinderyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Validation failures carried by this error, if any
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            BinderyError::Model(ModelError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            BinderyError::Model(ModelError::Validation(errors)) => {
                Some(json!({ "fields": errors }))
            }
            BinderyError::Model(ModelError::UnknownField { model, field }) => {
                Some(json!({ "model": model, "field": field }))
            }
            BinderyError::Storage(StorageError::NotFound { model, id }) => {
                Some(json!({ "model": model, "id": id }))
            }
            BinderyError::Storage(StorageError::UpsertFailed { keys, .. }) => {
                Some(json!({ "keys": keys }))
            }
            BinderyError::Storage(StorageError::DeleteFailed { key, .. }) => {
                Some(json!({ "key": key }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for BinderyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<ValidationErrors> for BinderyError {
    fn from(errors: ValidationErrors) -> Self {
        BinderyError::Model(ModelError::Validation(errors))
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// A field declaration, schema or store was set up incorrectly
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// `field("")` was built
    #[error("Field declarations require a non-empty name")]
    EmptyFieldName,

    /// A derived field has nothing to compute its value from
    #[error("Derived field '{field}' has no reader")]
    MissingReader { field: String },

    /// Two declarations share the same name within one model
    #[error("Field '{field}' is declared more than once on model '{model}'")]
    DuplicateField { model: String, field: String },

    /// Settings metadata refers to a type the registry does not know
    #[error("Unknown type '{type_name}' for field '{field}'")]
    UnknownType { field: String, type_name: String },

    /// A data store was built without the schema it serves
    #[error("Data store of kind '{kind}' was built without a model schema")]
    MissingSchema { kind: String },

    /// A data store was built without the host backend it needs
    #[error("Data store of kind '{kind}' requires a {backend} backend")]
    MissingBackend { kind: String, backend: String },

    /// The store kind name is not one of the known strategies
    #[error("Unknown data store kind: {name}")]
    UnknownStoreKind { name: String },
}

// =============================================================================
// Model Errors
// =============================================================================

/// Errors raised while reading, writing or validating a model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// get/set on a field the model never declared
    #[error("Field '{field}' is not defined on model '{model}'")]
    UnknownField { model: String, field: String },

    /// One or more fields failed validation
    #[error("{0}")]
    Validation(ValidationErrors),
}

impl ModelError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ModelError::UnknownField { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ModelError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::UnknownField { .. } => "UNKNOWN_FIELD",
            ModelError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors reported by data stores and their host backends
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// One or more keys could not be written; earlier writes are not undone
    #[error("Failed to upsert {model}: keys {keys:?} were not written")]
    UpsertFailed { model: String, keys: Vec<String> },

    /// The backend refused to delete a key or record
    #[error("Failed to delete {model}: backend rejected '{key}'")]
    DeleteFailed { model: String, key: String },

    /// Entity targeted by an update/delete does not exist
    #[error("{model} with id '{id}' not found")]
    NotFound { model: String, id: Value },

    /// Any other backend failure
    #[error("Storage error: {message}")]
    Backend { message: String },
}

impl StorageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
            StorageError::UpsertFailed { .. }
            | StorageError::DeleteFailed { .. }
            | StorageError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::UpsertFailed { .. } => "UPSERT_FAILED",
            StorageError::DeleteFailed { .. } => "DELETE_FAILED",
            StorageError::NotFound { .. } => "ENTITY_NOT_FOUND",
            StorageError::Backend { .. } => "STORAGE_ERROR",
        }
    }
}

impl From<anyhow::Error> for BinderyError {
    fn from(err: anyhow::Error) -> Self {
        BinderyError::Internal(err.to_string())
    }
}
