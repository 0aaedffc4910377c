use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DingTalkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} got error {code}: {message}")]
    RemoteApi {
        url: String,
        code: i64,
        message: String,
        payload: serde_json::Value,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Expected a JSON envelope but got a raw response with status {0}")]
    UnexpectedResponse(StatusCode),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DingTalkError {
    /// Remote error code, if this is an envelope error
    pub fn code(&self) -> Option<i64> {
        match self {
            DingTalkError::RemoteApi { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this is a remote error carrying one of `codes`
    pub fn is_remote_code(&self, codes: &[i64]) -> bool {
        self.code().is_some_and(|code| codes.contains(&code))
    }
}

pub type Result<T> = std::result::Result<T, DingTalkError>;

/// Fail with `InvalidArgument` unless `cond` holds
pub(crate) fn ensure(cond: bool, message: &str) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(DingTalkError::InvalidArgument(message.to_string()))
    }
}
