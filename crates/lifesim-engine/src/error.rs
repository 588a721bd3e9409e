//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during session startup, play, and shutdown.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lifesim_core::ConfigError,
    },

    /// Restoring or saving the event log failed.
    #[error("log error: {source}")]
    Log {
        /// The underlying log error.
        #[from]
        source: lifesim_log::LogError,
    },

    /// Reading input failed.
    #[error("input error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
