//! Identity provider client for the skillpath learning platform.
//!
//! This crate talks to the hosted identity service: sign up, sign in,
//! OAuth redirects, sign out, and an auth-state-change notification
//! stream that the session layer subscribes to.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;

/// エラー型
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing session")]
    MissingSession,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// ユーザー情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    pub identities: Option<Vec<Identity>>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// リンク済みアイデンティティ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub provider: String,
}

/// セッション情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
    pub user: UserRecord,
}

/// 認証状態変更イベント
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

/// サインアップ設定
#[derive(Debug, Clone, Serialize, Default)]
pub struct SignUpOptions {
    pub email_redirect_to: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// サインアップ結果
///
/// The wire shape branches: an auto-confirmed signup answers with a full
/// session envelope, a pending signup answers with a bare user object.
#[derive(Debug, Clone)]
pub struct SignUpResponse {
    pub session: Option<Session>,
    pub user: Option<UserRecord>,
}

impl SignUpResponse {
    /// サインアップAPIのレスポンスをパース
    pub fn from_value(value: serde_json::Value) -> Result<Self, AuthError> {
        if value.get("access_token").is_some() {
            let session: Session = serde_json::from_value(value)?;
            let user = session.user.clone();
            return Ok(Self {
                session: Some(session),
                user: Some(user),
            });
        }

        if let Some(user_value) = value.get("user") {
            if !user_value.is_null() {
                let user: UserRecord = serde_json::from_value(user_value.clone())?;
                return Ok(Self {
                    session: None,
                    user: Some(user),
                });
            }
        }

        if value.get("id").is_some() {
            let user: UserRecord = serde_json::from_value(value)?;
            return Ok(Self {
                session: None,
                user: Some(user),
            });
        }

        Ok(Self {
            session: None,
            user: None,
        })
    }
}

/// クライアントオプション
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub auto_refresh_token: bool,
    pub persist_session: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
        }
    }
}

/// OAuth プロバイダ
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OAuthProvider {
    Google,
    Github,
    Apple,
}

impl OAuthProvider {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
            Self::Apple => "apple",
        }
    }
}

/// OAuth サインイン設定
#[derive(Debug, Clone, Serialize, Default)]
pub struct OAuthSignInOptions {
    pub redirect_to: Option<String>,
    pub scopes: Option<String>,
    pub skip_browser_redirect: Option<bool>,
}

/// 認証プロバイダインターフェース
///
/// The session layer depends on this trait rather than on `AuthClient`
/// directly, so a fake provider can stand in during tests.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// 現在のセッションを取得
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// 認証状態変更の通知を受け取るためのレシーバーを取得
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent>;

    /// メール・パスワードでログイン
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    /// ユーザー登録
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: Option<SignUpOptions>,
    ) -> Result<SignUpResponse, AuthError>;

    /// OAuthで認証をリクエスト
    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        options: Option<OAuthSignInOptions>,
    ) -> Result<String, AuthError>;

    /// サインアウト
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Auth クライアント
pub struct AuthClient {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    /// 新しい Auth クライアントを作成
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            url: url.to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// ユーザー登録
    ///
    /// The raw response is returned to the caller untouched; only a
    /// session-bearing response changes the client's own state.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: Option<SignUpOptions>,
    ) -> Result<SignUpResponse, AuthError> {
        let url = format!("{}/auth/v1/signup", self.url);

        let mut payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        if let Some(opts) = options {
            if let Some(data) = opts.data {
                payload["data"] = data;
            }
            if let Some(redirect) = opts.email_redirect_to {
                payload["options"] = serde_json::json!({ "email_redirect_to": redirect });
            }
        }

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let body = response.json::<serde_json::Value>().await?;
        let signup = SignUpResponse::from_value(body)?;

        // セッション付きのレスポンスのみ状態を更新
        if let Some(session) = &signup.session {
            self.store_session(session.clone());
            let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        }

        Ok(signup)
    }

    /// メール・パスワードでログイン
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.url);

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let session: Session = response.json().await?;

        // セッションを保存
        self.store_session(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));

        Ok(session)
    }

    /// 現在のセッションを取得
    ///
    /// Returns the in-memory session, refreshing it first when the access
    /// token has expired and a refresh token is available. An expired
    /// session with nothing to refresh it yields `None`.
    pub async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let current = { self.current_session.read().unwrap().clone() };

        let Some(session) = current else {
            return Ok(None);
        };

        if !session_expired(&session) {
            return Ok(Some(session));
        }

        if self.options.auto_refresh_token && !session.refresh_token.is_empty() {
            let refreshed = self.refresh_session().await?;
            return Ok(Some(refreshed));
        }

        // 期限切れでリフレッシュできないセッションは破棄
        let mut guard = self.current_session.write().unwrap();
        *guard = None;
        Ok(None)
    }

    /// セッションをリフレッシュ
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let session = {
            self.current_session
                .read()
                .unwrap()
                .clone()
                .ok_or(AuthError::MissingSession)?
        };

        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.url);

        let payload = serde_json::json!({
            "refresh_token": session.refresh_token,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let new_session: Session = response.json().await?;

        // セッションを更新
        self.store_session(new_session.clone());
        let _ = self.events.send(AuthEvent::TokenRefreshed(new_session.clone()));

        Ok(new_session)
    }

    /// サインアウト
    ///
    /// The local session is cleared and `SignedOut` is broadcast whether or
    /// not the revocation call succeeds.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = { self.current_session.write().unwrap().take() };

        let http_result = match session {
            Some(session) => {
                let url = format!("{}/auth/v1/logout", self.url);

                match self
                    .http_client
                    .post(&url)
                    .header("apikey", &self.key)
                    .header("Authorization", format!("Bearer {}", session.access_token))
                    .send()
                    .await
                {
                    Ok(response) if response.status().is_success() => Ok(()),
                    Ok(response) => {
                        let error_text = response.text().await.unwrap_or_default();
                        Err(AuthError::ApiError(error_text))
                    }
                    Err(e) => Err(AuthError::NetworkError(e)),
                }
            }
            None => Ok(()),
        };

        let _ = self.events.send(AuthEvent::SignedOut);

        http_result
    }

    /// 認証状態変更の通知を受け取るためのレシーバーを取得
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// OAuth プロバイダを通じたサインインのためのURL生成
    pub fn get_oauth_sign_in_url(
        &self,
        provider: OAuthProvider,
        options: Option<OAuthSignInOptions>,
    ) -> String {
        let provider_id = provider.as_str();
        let options = options.unwrap_or_default();

        let mut url = format!("{}/auth/v1/authorize?provider={}", self.url, provider_id);

        if let Some(redirect_to) = options.redirect_to {
            url.push_str(&format!(
                "&redirect_to={}",
                urlencoding::encode(&redirect_to)
            ));
        }

        if let Some(scopes) = options.scopes {
            url.push_str(&format!("&scopes={}", urlencoding::encode(&scopes)));
        }

        url
    }

    /// OAuthで認証をリクエスト
    ///
    /// Success means the redirect URL was issued; authentication itself
    /// completes later through `exchange_code_for_session` and the event
    /// stream, once the user returns.
    pub async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        options: Option<OAuthSignInOptions>,
    ) -> Result<String, AuthError> {
        let url = self.get_oauth_sign_in_url(provider, options);
        Ok(url)
    }

    /// OAuthコールバックからのコードを処理してセッション取得
    pub async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=authorization_code", self.url);

        let payload = serde_json::json!({
            "code": code,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let session: Session = response.json().await?;

        // セッションを保存
        self.store_session(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));

        Ok(session)
    }

    fn store_session(&self, session: Session) {
        if self.options.persist_session {
            let mut guard = self.current_session.write().unwrap();
            *guard = Some(session);
        }
    }
}

#[async_trait::async_trait]
impl AuthProvider for AuthClient {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        AuthClient::get_session(self).await
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        AuthClient::on_auth_state_change(self)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        AuthClient::sign_in_with_password(self, email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: Option<SignUpOptions>,
    ) -> Result<SignUpResponse, AuthError> {
        AuthClient::sign_up(self, email, password, options).await
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        options: Option<OAuthSignInOptions>,
    ) -> Result<String, AuthError> {
        AuthClient::sign_in_with_oauth(self, provider, options).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        AuthClient::sign_out(self).await
    }
}

#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    exp: i64,
}

/// アクセストークンの有効期限を読み取る
///
/// The signature is not verified; only the `exp` claim is of interest.
fn decode_token_expiry(token: &str) -> Result<i64, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(&[]),
        &validation,
    )
    .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(data.claims.exp)
}

fn session_expired(session: &Session) -> bool {
    match decode_token_expiry(&session.access_token) {
        Ok(exp) => exp <= chrono::Utc::now().timestamp(),
        Err(e) => {
            // An unreadable token is left for the server to reject.
            warn!("Could not read access token expiry: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token_with_exp(exp: i64) -> String {
        let claims = json!({ "sub": "user-1", "exp": exp });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    fn session_with_token(token: String) -> Session {
        Session {
            access_token: token,
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            token_type: "bearer".to_string(),
            user: UserRecord {
                id: "user-1".to_string(),
                email: Some("user@example.com".to_string()),
                phone: None,
                app_metadata: json!({}),
                user_metadata: json!({}),
                identities: None,
                created_at: "2024-01-01T00:00:00Z".to_string(),
                updated_at: "2024-01-01T00:00:00Z".to_string(),
            },
        }
    }

    #[test]
    fn test_token_expiry() {
        let future = chrono::Utc::now().timestamp() + 3600;
        let past = chrono::Utc::now().timestamp() - 3600;

        assert!(!session_expired(&session_with_token(token_with_exp(future))));
        assert!(session_expired(&session_with_token(token_with_exp(past))));
        // 解析できないトークンは期限切れ扱いにしない
        assert!(!session_expired(&session_with_token(
            "not-a-jwt".to_string()
        )));
    }

    #[test]
    fn test_oauth_sign_in_url() {
        let client = Client::new();
        let auth = AuthClient::new(
            "https://id.skillpath.app",
            "test-key",
            client,
            AuthOptions::default(),
        );

        let url = auth.get_oauth_sign_in_url(OAuthProvider::Google, None);
        assert!(url.contains("provider=google"));

        let options = OAuthSignInOptions {
            redirect_to: Some("https://skillpath.app/callback".to_string()),
            scopes: Some("email profile".to_string()),
            ..Default::default()
        };

        let url_with_options = auth.get_oauth_sign_in_url(OAuthProvider::Google, Some(options));
        assert!(url_with_options.contains("redirect_to="));
        assert!(url_with_options.contains("scopes="));
    }

    #[test]
    fn test_sign_up_response_parsing() {
        // 確認済みサインアップ: セッション付きレスポンス
        let with_session = json!({
            "access_token": token_with_exp(chrono::Utc::now().timestamp() + 3600),
            "refresh_token": "refresh",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": { "id": "user-1", "email": "a@b.c", "phone": null }
        });
        let parsed = SignUpResponse::from_value(with_session).unwrap();
        assert!(parsed.session.is_some());
        assert_eq!(parsed.user.unwrap().id, "user-1");

        // メール確認待ち: ユーザーのみのレスポンス
        let user_only = json!({
            "id": "user-2",
            "email": "b@c.d",
            "phone": null,
            "identities": [{ "id": "ident-1", "provider": "email" }]
        });
        let parsed = SignUpResponse::from_value(user_only).unwrap();
        assert!(parsed.session.is_none());
        let user = parsed.user.unwrap();
        assert_eq!(user.id, "user-2");
        assert_eq!(user.identities.unwrap().len(), 1);

        // 既存アドレス: identities が空のユーザー
        let existing = json!({
            "id": "user-3",
            "email": "c@d.e",
            "phone": null,
            "identities": []
        });
        let parsed = SignUpResponse::from_value(existing).unwrap();
        assert!(parsed.session.is_none());
        assert!(parsed.user.unwrap().identities.unwrap().is_empty());
    }
}
