//! Error handling for the skillpath client

use std::fmt;
use thiserror::Error;

/// Unified error type for the skillpath client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Identity provider errors
    #[error("Auth error: {0}")]
    Auth(#[from] skillpath_auth::AuthError),

    /// Session layer errors
    #[error("Session error: {0}")]
    Session(#[from] skillpath_session::SessionError),

    /// AI service errors
    #[error("Content error: {0}")]
    Content(#[from] skillpath_content::ContentError),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }
}
