//! Error types for the Aura assistant

use thiserror::Error;

/// Result type alias for Aura operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the assistant
///
/// None of these reach the caller of `ControlLoop::process_command`; they are
/// caught at the branch boundary and turned into a spoken sentence.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote call failed (transport, HTTP status, malformed body)
    #[error("remote error: {0}")]
    Remote(String),

    /// Local or generated-code execution failed
    #[error("executor error: {0}")]
    Executor(String),

    /// Function name is not in the catalog
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Argument failed catalog validation
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Parameter name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
