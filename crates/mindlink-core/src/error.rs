//! Error types for MindLink

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Entry store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Unexpected reply format: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Wrap a transport failure from a generation backend
    pub(crate) fn generation(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Generation(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Error::Generation(format!("connection failed: {}", err))
        } else {
            Error::Generation(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
