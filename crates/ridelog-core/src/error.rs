//! Error types for the ridelog-core library.
//!
//! Receipt field extraction never fails with an error: unmatched fields are
//! represented by [`crate::models::ride::Field::Unparseable`] or `None`. The
//! errors below cover the I/O collaborators around the parser.

use thiserror::Error;

/// Main error type for the ridelog library.
#[derive(Error, Debug)]
pub enum RidelogError {
    /// Mail message decoding error.
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Routing service error.
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    /// Ride database error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to turning an email message into a receipt.
#[derive(Error, Debug)]
pub enum MailError {
    /// The message could not be parsed as RFC 822.
    #[error("failed to parse message: {0}")]
    Parse(#[from] mailparse::MailParseError),

    /// No `text/plain` part was found.
    #[error("message has no text/plain body")]
    NoTextBody,

    /// The `Date` header is missing or unreadable.
    #[error("message has no usable Date header")]
    NoDate,
}

/// Errors raised by a routing collaborator.
#[derive(Error, Debug)]
pub enum RoutingError {
    /// Transport failure talking to the service.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered but refused the request.
    #[error("service returned status {status}: {message}")]
    Service { status: String, message: String },

    /// The service answer did not contain a usable route.
    #[error("malformed routing response: {0}")]
    Malformed(String),

    /// A single attempt exceeded its deadline.
    #[error("routing request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Errors related to the ride database.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for the ridelog library.
pub type Result<T> = std::result::Result<T, RidelogError>;
