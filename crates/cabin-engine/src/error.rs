//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cabin_core::config::ConfigError,
    },

    /// The channel dictionary could not be loaded.
    #[error("dictionary error: {source}")]
    Dictionary {
        /// The underlying dictionary error.
        #[from]
        source: cabin_core::dictionary::DictionaryError,
    },

    /// The client server failed to start.
    #[error("server error: {source}")]
    Server {
        /// The underlying startup error.
        #[from]
        source: cabin_server::startup::StartupError,
    },
}
