//! Error types surfaced by the aggregation engine and the login session.

use thiserror::Error;

/// Failures the aggregation engine reports instead of panicking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("missing column: {column}")]
    MissingColumn { column: String },

    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("unknown analysis category: {0}")]
    UnknownCategory(String),

    #[error("unknown display mode: {0}")]
    UnknownDisplayMode(String),
}

/// Failures of the login step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("not logged in")]
    NotLoggedIn,
}
