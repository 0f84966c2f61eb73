//! Error types for the reconciliation engine.
//!
//! [`ReconcileError`] covers the error kinds named in the service's error
//! handling design: signature rejection, malformed webhook payloads,
//! unknown payment lookups, and storage failures. "No match found" is a
//! normal outcome of reconciliation, not an error, so it never appears here.

use thiserror::Error;

/// Errors surfaced by the intake pipeline and repository.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("payment not found")]
    PaymentNotFound,

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
