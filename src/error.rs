//! Error handling types for the projection engine.
//!
//! Errors are reserved for contract violations by collaborators. A wait that
//! gives up (timeout, version-exceeded, external cancellation, teardown) is
//! not an error: it is the normal `Ok(false)` result of
//! [`wait_for_version`](crate::sync::DocumentSynchronizer::wait_for_version).

use thiserror::Error;

/// Errors surfaced by projection and synchronization operations.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An edit batch contains an invalid range; the update was rejected
    /// before mutating any buffer state.
    #[error("malformed edit batch: {message}")]
    MalformedEdit { message: String },

    /// A wait referenced a virtual document the synchronizer has never been
    /// told about. The registry must announce a document before it can be
    /// synchronized against.
    #[error("unknown virtual document: {uri}")]
    UnknownDocument { uri: String },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Helper functions for common error patterns
impl ProjectionError {
    /// Create a malformed edit error
    pub fn malformed_edit(message: impl Into<String>) -> Self {
        ProjectionError::MalformedEdit {
            message: message.into(),
        }
    }

    /// Create an unknown document error
    pub fn unknown_document(uri: impl Into<String>) -> Self {
        ProjectionError::UnknownDocument { uri: uri.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ProjectionError::Internal(message.into())
    }
}
