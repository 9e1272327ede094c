use crate::notify::{Notice, Notifier};
use crate::snapshot::SnapshotStore;
use log::error;
use skillpath_auth::{
    AuthError, AuthProvider, OAuthProvider, OAuthSignInOptions, SignUpOptions, SignUpResponse,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 認証アクションのファサード
///
/// Each operation is one request/response call against the provider,
/// wrapped with a shared busy flag and a user-facing notice. State
/// propagation happens through the provider's event stream, not here:
/// callers must not assume the synchronized view has already updated
/// when an action returns.
pub struct AuthActions {
    provider: Arc<dyn AuthProvider>,
    store: SnapshotStore,
    notifier: Arc<dyn Notifier>,
    busy: Arc<AtomicBool>,
    oauth_redirect_to: Option<String>,
}

/// Busyフラグの解除ガード
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AuthActions {
    /// 新しいファサードを作成
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        store: SnapshotStore,
        notifier: Arc<dyn Notifier>,
        oauth_redirect_to: Option<String>,
    ) -> Self {
        Self {
            provider,
            store,
            notifier,
            busy: Arc::new(AtomicBool::new(false)),
            oauth_redirect_to,
        }
    }

    /// 処理中かどうか
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn begin(&self) -> BusyGuard {
        self.busy.store(true, Ordering::SeqCst);
        BusyGuard(self.busy.clone())
    }

    /// メール・パスワードでログイン
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let _busy = self.begin();

        match self.provider.sign_in_with_password(email, password).await {
            Ok(_) => {
                self.notifier.notify(Notice::success("Logged in"));
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Login failed: {}", e)));
                Err(e)
            }
        }
    }

    /// ユーザー登録
    ///
    /// Branches on the provider's response shape: an already-registered
    /// address is a failure notice but not an error, a session-bearing
    /// response means the account is immediately active, and a bare user
    /// record means a confirmation email is pending. The raw response is
    /// returned to the caller in every non-error case.
    pub async fn signup(&self, email: &str, password: &str) -> Result<SignUpResponse, AuthError> {
        let _busy = self.begin();

        let options = SignUpOptions {
            email_redirect_to: self.oauth_redirect_to.clone(),
            data: None,
        };

        let response = match self.provider.sign_up(email, password, Some(options)).await {
            Ok(response) => response,
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Signup failed: {}", e)));
                return Err(e);
            }
        };

        if account_already_exists(&response) {
            self.notifier
                .notify(Notice::error("This email is already registered"));
        } else if response.session.is_some() {
            self.notifier.notify(Notice::success("Account created"));
        } else {
            self.notifier.notify(Notice::success(
                "Account created. Check your email to confirm.",
            ));
        }

        Ok(response)
    }

    /// Googleアカウントでサインイン
    ///
    /// Success is the redirect URL being issued; authentication completes
    /// later through the provider's event stream.
    pub async fn sign_in_with_google(&self) -> Result<String, AuthError> {
        let _busy = self.begin();

        let options = OAuthSignInOptions {
            redirect_to: self.oauth_redirect_to.clone(),
            ..Default::default()
        };

        match self
            .provider
            .sign_in_with_oauth(OAuthProvider::Google, Some(options))
            .await
        {
            Ok(url) => {
                self.notifier.notify(Notice::info("Redirecting to Google"));
                Ok(url)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Google sign-in failed: {}", e)));
                Err(e)
            }
        }
    }

    /// ログアウト
    ///
    /// Provider failures are logged and shown, never re-raised. The user
    /// snapshot is removed in every case.
    pub async fn logout(&self) {
        let _busy = self.begin();

        match self.provider.sign_out().await {
            Ok(()) => {
                self.notifier.notify(Notice::success("Logged out"));
            }
            Err(e) => {
                error!("Sign out failed: {}", e);
                self.notifier
                    .notify(Notice::error(format!("Logout failed: {}", e)));
            }
        }

        self.store.clear();
    }
}

/// 既存アドレスへのサインアップか判定
///
/// The provider reports an already-registered address as a user record
/// with an empty identities list and no session.
fn account_already_exists(response: &SignUpResponse) -> bool {
    if response.session.is_some() {
        return false;
    }
    response
        .user
        .as_ref()
        .and_then(|user| user.identities.as_ref())
        .map(|identities| identities.is_empty())
        .unwrap_or(false)
}
