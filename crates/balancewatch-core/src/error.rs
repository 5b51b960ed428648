//! Error types for BalanceWatch

use thiserror::Error;

/// Result type alias using BalanceWatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for BalanceWatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// No credential is flagged active (or the store holds an inconsistent set)
    #[error("No active exchange credential configured")]
    NoActiveCredential,

    /// The balance source failed
    #[error("Upstream balance fetch failed: {0}")]
    UpstreamFetchFailed(#[from] FetchError),

    /// The balance source returned text that is not a number
    #[error("Invalid balance value: {0:?}")]
    InvalidBalance(String),

    /// The notification sink failed to deliver an alert
    #[error("Notification delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record
        entity: String,
        /// Identifier looked up
        id: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Errors raised by a [`BalanceSource`](crate::monitor::BalanceSource)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status from the source
    #[error("source returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Body was not a balance payload
    #[error("could not decode balance response: {0}")]
    Decode(String),
}

/// Errors raised by a [`NotificationSink`](crate::monitor::NotificationSink)
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status from the channel
    #[error("channel returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Channel is misconfigured
    #[error("Configuration error: {0}")]
    Config(String),
}
