use thiserror::Error;

/// Errors surfaced by the retrieval and generation pipeline.
///
/// An empty retrieval result is not an error; callers receive an empty
/// passage list instead.
#[derive(Debug, Error)]
pub enum RagError {
    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network failure, rate limiting or a 5xx answer. Worth retrying.
    #[error("transient service error: {message}")]
    Transient { message: String },

    /// Any other failure of the search or model service.
    #[error("service error: {message}")]
    Service { message: String },
}

impl RagError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
