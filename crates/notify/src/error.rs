//! Engine error types.
//!
//! Authority failures are never surfaced to callers directly; the
//! resolution layers catch [`AuthorityError`] and apply the injected
//! degradation policy. Store failures always propagate.

/// Error from the job store (persistence layer).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend-agnostic failure, used by non-SQL stores.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Error from the preference authority.
#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend-agnostic failure, used by non-SQL authorities.
    #[error("authority unavailable: {0}")]
    Unavailable(String),
}
