use thiserror::Error;

/// Errors surfaced by policy construction, problems and run configuration.
///
/// Callback hooks never produce these: a callback communicates only through
/// [`Control`](super::Control).
#[derive(Debug, Error)]
pub enum Error {
    /// A constructor or configuration received a value it cannot work with,
    /// e.g. a non-positive timeout.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The objective failed to evaluate.
    #[error("objective evaluation failed: {0}")]
    Objective(String),

    #[error("malformed run configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to read run configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
