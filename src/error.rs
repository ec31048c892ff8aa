//! Wayback error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The input is neither a numeric timestamp nor one of the known date/time
    /// layouts.
    #[error("invalid time/timestamp value: {0}")]
    InvalidTimestamp(String),
    #[error("cannot parse {input:?} with layout {layout:?}: {source}")]
    Layout {
        input: String,
        layout: String,
        source: chrono::ParseError,
    },
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("{}", .0.canonical_reason().unwrap_or("unexpected HTTP status"))]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
    /// The archive answered, but holds no snapshot for the requested URL.
    #[error("no snapshot is available for the given url")]
    NotAvailable,
}

impl Error {
    /// Returns true if the archive has no snapshot, as opposed to the request
    /// itself failing.
    #[must_use]
    pub fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
