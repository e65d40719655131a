//! Typed error hierarchy for the siteboard core.
//!
//! Two enums cover the two failure surfaces:
//! - `ApiError` — remote call failures (transport, rejection, decode)
//! - `StoreError` — coordinator operation failures, wrapping `ApiError`
//!   plus local draft validation
//!
//! Errors are values end to end: the store never lets one escape as a
//! panic, and every variant renders to the single human-readable string
//! the presentation and notification layers display.

use thiserror::Error;

/// Failures of a single remote API call.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response received (DNS, refused connection, timeout, ...).
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-2xx status. `message` is the
    /// server-supplied `error` body field, or the operation's generic
    /// fallback when the body carried none.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A 2xx response whose body could not be decoded as expected.
    #[error("{0}")]
    Decode(String),
}

impl ApiError {
    /// The message shown to users, identical to the `Display` output.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(message) | Self::Decode(message) => message,
            Self::Rejected { message, .. } => message,
        }
    }
}

/// Local validation failures caught before any network traffic.
#[derive(Debug, Clone, Error)]
pub enum DraftError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("start date {start} is after {end}")]
    DateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// Failures of a coordinator operation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    InvalidDraft(#[from] DraftError),
}

impl StoreError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}
