use thiserror::Error;

#[derive(Debug, Error)]
pub enum FundChatError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Upstream credential is not configured")]
    Credential,

    #[error("Session is not authorized")]
    Unauthorized,

    #[error("Request rejected with status {status}")]
    Rejected { status: u16, message: Option<String> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FundChatError {
    pub fn api_error(msg: impl Into<String>) -> Self {
        FundChatError::Api(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        FundChatError::Config(msg.into())
    }

    pub fn storage_error(msg: impl Into<String>) -> Self {
        FundChatError::Storage(msg.into())
    }
}

pub type FundChatResult<T> = Result<T, FundChatError>;
