//! Skillpath Rust Client Library
//!
//! A Rust client for the skillpath learning platform, wiring together the
//! hosted identity provider, the session synchronization core, and the
//! AI content, chat, and speech services.

pub mod config;
pub mod error;

use std::sync::Arc;

use reqwest::Client;

use crate::config::{ClientOptions, SkillpathConfig};
use crate::error::Error;
use skillpath_auth::{AuthClient, AuthOptions};
use skillpath_content::{ChatClient, ContentClient, SpeechClient};
use skillpath_session::{AuthActions, LogNotifier, Notifier, SessionSynchronizer, SnapshotStore};

/// The main entry point for the skillpath client
pub struct Skillpath {
    /// Service endpoints and keys
    pub config: SkillpathConfig,
    /// Client options
    pub options: ClientOptions,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Identity provider client
    pub auth: Arc<AuthClient>,
}

impl Skillpath {
    /// Create a new skillpath client with default options
    ///
    /// # Example
    ///
    /// ```no_run
    /// use skillpath::config::SkillpathConfig;
    /// use skillpath::Skillpath;
    ///
    /// let config = SkillpathConfig::new("https://id.skillpath.app", "anon-key");
    /// let client = Skillpath::new(config);
    /// ```
    pub fn new(config: SkillpathConfig) -> Self {
        let options = ClientOptions::default();
        let http_client = Client::new();
        let auth = Arc::new(AuthClient::new(
            &config.auth_url,
            &config.auth_key,
            http_client.clone(),
            AuthOptions {
                auto_refresh_token: options.auto_refresh_token,
                persist_session: options.persist_session,
            },
        ));

        Self {
            config,
            options,
            http_client,
            auth,
        }
    }

    /// Create a new skillpath client with custom options
    ///
    /// Fails only when the underlying HTTP client cannot be constructed
    /// with the requested timeout.
    pub fn new_with_options(
        config: SkillpathConfig,
        options: ClientOptions,
    ) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = Arc::new(AuthClient::new(
            &config.auth_url,
            &config.auth_key,
            http_client.clone(),
            AuthOptions {
                auto_refresh_token: options.auto_refresh_token,
                persist_session: options.persist_session,
            },
        ));

        Ok(Self {
            config,
            options,
            http_client,
            auth,
        })
    }

    /// Get the identity provider client
    pub fn auth(&self) -> &Arc<AuthClient> {
        &self.auth
    }

    /// Get the durable user snapshot store
    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.config.snapshot_path)
    }

    /// Create the session synchronizer for this client
    ///
    /// The synchronizer is wired to the identity provider and the
    /// configured snapshot slot; call `initialize` and `subscribe` on it
    /// to start reconciling.
    pub fn session(&self) -> SessionSynchronizer {
        SessionSynchronizer::new(self.auth.clone(), self.snapshot_store())
    }

    /// Create the auth action facade with log-based notices
    pub fn actions(&self) -> AuthActions {
        self.actions_with_notifier(Arc::new(LogNotifier))
    }

    /// Create the auth action facade with a custom notifier
    pub fn actions_with_notifier(&self, notifier: Arc<dyn Notifier>) -> AuthActions {
        AuthActions::new(
            self.auth.clone(),
            self.snapshot_store(),
            notifier,
            self.config.oauth_redirect_to.clone(),
        )
    }

    /// Create a content generation client
    pub fn content(&self) -> ContentClient {
        ContentClient::new(
            &self.config.content_api_url,
            &self.config.content_api_key,
            &self.config.content_model,
            self.http_client.clone(),
        )
    }

    /// Create a career chat client
    pub fn chat(&self) -> ChatClient {
        ChatClient::new(
            &self.config.content_api_url,
            &self.config.content_api_key,
            &self.config.chat_model,
            self.http_client.clone(),
        )
    }

    /// Create a text-to-speech client
    pub fn speech(&self) -> SpeechClient {
        SpeechClient::new(
            &self.config.tts_url,
            &self.config.tts_key,
            self.http_client.clone(),
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, SkillpathConfig};
    pub use crate::error::Error;
    pub use crate::Skillpath;
    pub use skillpath_auth::{AuthEvent, AuthProvider, Session};
    pub use skillpath_session::{AppUser, Notice, NoticeKind, SessionView};
}
