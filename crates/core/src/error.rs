//! Domain error type shared by every layer above `core`.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A household-scoped entity does not exist (or belongs to another household).
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed input. The message may carry field-level detail; the HTTP
    /// layer decides whether to expose it.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No caller identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller identity is known but lacks membership or role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
