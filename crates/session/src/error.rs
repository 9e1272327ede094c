use skillpath_auth::AuthError;
use thiserror::Error;

/// エラー型
///
/// Internal to the session layer: the synchronizer itself degrades to a
/// signed-out view instead of surfacing these to its consumers.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Provider error: {0}")]
    Provider(#[from] AuthError),

    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
