use thiserror::Error;

pub type Result<T> = std::result::Result<T, NewsError>;

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Search query is empty")]
    EmptyQuery,
}

impl From<reqwest::Error> for NewsError {
    fn from(err: reqwest::Error) -> Self {
        NewsError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for NewsError {
    fn from(err: serde_json::Error) -> Self {
        NewsError::Parse(err.to_string())
    }
}
