use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompletionError>;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No completion choice in response")]
    Empty,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::Parse(err.to_string())
    }
}
