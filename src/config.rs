//! Configuration for the skillpath client

use std::path::PathBuf;
use std::time::Duration;

/// Service endpoints and keys for a skillpath deployment
#[derive(Debug, Clone)]
pub struct SkillpathConfig {
    /// Base URL of the hosted identity provider
    pub auth_url: String,

    /// Anonymous API key for the identity provider
    pub auth_key: String,

    /// Base URL of the generative content API
    pub content_api_url: String,

    /// API key for the generative content API
    pub content_api_key: String,

    /// Model used for module content generation
    pub content_model: String,

    /// Model used for the career chat
    pub chat_model: String,

    /// Base URL of the text-to-speech API
    pub tts_url: String,

    /// API key for the text-to-speech API
    pub tts_key: String,

    /// Path of the durable user snapshot slot
    pub snapshot_path: PathBuf,

    /// Redirect target appended to OAuth sign-in URLs
    pub oauth_redirect_to: Option<String>,
}

impl SkillpathConfig {
    /// Create a configuration with the hosted defaults for the AI services
    pub fn new(auth_url: &str, auth_key: &str) -> Self {
        Self {
            auth_url: auth_url.to_string(),
            auth_key: auth_key.to_string(),
            content_api_url: "https://generativelanguage.googleapis.com".to_string(),
            content_api_key: String::new(),
            content_model: "gemini-1.5-flash".to_string(),
            chat_model: "gemini-1.5-flash".to_string(),
            tts_url: "https://texttospeech.googleapis.com".to_string(),
            tts_key: String::new(),
            snapshot_path: PathBuf::from("skillpath_user.json"),
            oauth_redirect_to: None,
        }
    }

    /// Set the generative content API base URL
    pub fn with_content_api_url(mut self, value: &str) -> Self {
        self.content_api_url = value.to_string();
        self
    }

    /// Set the generative content API key
    pub fn with_content_api_key(mut self, value: &str) -> Self {
        self.content_api_key = value.to_string();
        self
    }

    /// Set the content generation model
    pub fn with_content_model(mut self, value: &str) -> Self {
        self.content_model = value.to_string();
        self
    }

    /// Set the career chat model
    pub fn with_chat_model(mut self, value: &str) -> Self {
        self.chat_model = value.to_string();
        self
    }

    /// Set the text-to-speech API base URL
    pub fn with_tts_url(mut self, value: &str) -> Self {
        self.tts_url = value.to_string();
        self
    }

    /// Set the text-to-speech API key
    pub fn with_tts_key(mut self, value: &str) -> Self {
        self.tts_key = value.to_string();
        self
    }

    /// Set the user snapshot path
    pub fn with_snapshot_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.snapshot_path = value.into();
        self
    }

    /// Set the OAuth redirect target
    pub fn with_oauth_redirect_to(mut self, value: &str) -> Self {
        self.oauth_redirect_to = Some(value.to_string());
        self
    }
}

/// Configuration options for the skillpath client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to automatically refresh the token
    pub auto_refresh_token: bool,

    /// Whether to keep the session in memory between calls
    pub persist_session: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}
