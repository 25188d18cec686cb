use thiserror::Error;

/// Top-level error type for Herald.
///
/// Nothing here is process-fatal: store and delivery failures are reported
/// to the user or operator and the surrounding turn or broadcast continues.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Backing store read failure.
    #[error("store read error: {0}")]
    StoreRead(String),

    /// Backing store write failure.
    #[error("store write error: {0}")]
    StoreWrite(String),

    /// Proactive delivery to one conversation failed.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Error from a messaging channel adapter.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
