use thiserror::Error;

/// Errors surfaced by the admin-facing service operations.
///
/// The state machine itself never errors — unrecognized events are silent
/// no-ops — but the admin channel reports a rejected command back to its
/// caller instead of swallowing it.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided through the admin channel.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// No question bank is installed.
    #[error("question bank unavailable")]
    BankUnavailable,
}
