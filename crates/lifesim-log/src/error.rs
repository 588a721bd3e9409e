//! Error types for the log and persistence layer.

/// Errors that can occur while persisting or restoring the event log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Reading or writing a save blob failed.
    #[error("save I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A save blob exists but does not decode to a log.
    #[error("corrupt save under key {key:?}: {source}")]
    Corrupt {
        /// Key the blob was stored under.
        key: String,
        /// The underlying decode error.
        source: serde_json::Error,
    },

    /// The log could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The save key cannot be used as a storage name.
    #[error("invalid save key: {0:?}")]
    InvalidKey(String),
}
