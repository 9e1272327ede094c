use thiserror::Error;

/// エラー型
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Audio decode error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
}
