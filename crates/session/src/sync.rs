use crate::snapshot::SnapshotStore;
use crate::user::AppUser;
use log::{debug, error, warn};
use skillpath_auth::{AuthEvent, AuthProvider, Session};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// 同期されたセッションビュー
///
/// The single consistent `(user, session, is_loading)` triple the rest
/// of the application reads. Replaced wholesale on every update.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub user: Option<AppUser>,
    pub session: Option<Session>,
    pub is_loading: bool,
}

/// セッション同期コンポーネント
///
/// Reconciles two asynchronous sources of truth, the one-shot session
/// fetch at startup and the provider's change-notification stream, plus
/// the durable snapshot fallback. Updates are last-write-wins: the two
/// sources are deliberately not sequenced against each other.
pub struct SessionSynchronizer {
    provider: Arc<dyn AuthProvider>,
    store: SnapshotStore,
    view: Arc<RwLock<SessionView>>,
    view_change: broadcast::Sender<SessionView>,
    initialized: AtomicBool,
}

impl SessionSynchronizer {
    /// 新しい同期コンポーネントを作成
    pub fn new(provider: Arc<dyn AuthProvider>, store: SnapshotStore) -> Self {
        let (view_change, _) = broadcast::channel(16);
        Self {
            provider,
            store,
            view: Arc::new(RwLock::new(SessionView {
                user: None,
                session: None,
                is_loading: true,
            })),
            view_change,
            initialized: AtomicBool::new(false),
        }
    }

    /// 現在のビューを取得
    pub async fn current_view(&self) -> SessionView {
        self.view.read().await.clone()
    }

    /// ビュー変更の通知を受け取るためのレシーバーを取得
    pub fn on_view_change(&self) -> broadcast::Receiver<SessionView> {
        self.view_change.subscribe()
    }

    /// 初期化プロトコルを実行
    ///
    /// Runs at most once per instance. Never fails visibly: a provider
    /// error is logged and degrades to a signed-out view, and
    /// `is_loading` is cleared on every path.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("initialize() called again, ignoring");
            return;
        }

        Self::apply(
            &self.view,
            &self.view_change,
            SessionView {
                user: None,
                session: None,
                is_loading: true,
            },
        )
        .await;

        let next = match self.provider.get_session().await {
            Ok(Some(session)) => self.hydrate(session),
            Ok(None) => {
                // 生きたセッションがなければスナップショットにフォールバック
                let user = self.store.read();
                SessionView {
                    user,
                    session: None,
                    is_loading: false,
                }
            }
            Err(e) => {
                error!("Initial session fetch failed: {}", e);
                SessionView {
                    user: None,
                    session: None,
                    is_loading: false,
                }
            }
        };

        Self::apply(&self.view, &self.view_change, next).await;
    }

    /// 認証状態変更ストリームの購読を開始
    ///
    /// The returned guard owns the consuming task; dropping it tears the
    /// subscription down.
    pub fn subscribe(&self) -> Subscription {
        let mut events = self.provider.on_auth_state_change();
        let store = self.store.clone();
        let view = self.view.clone();
        let view_change = self.view_change.clone();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let next = match event {
                            AuthEvent::SignedIn(session)
                            | AuthEvent::TokenRefreshed(session) => {
                                hydrate_into(&store, session)
                            }
                            AuthEvent::SignedOut => {
                                store.clear();
                                SessionView {
                                    user: None,
                                    session: None,
                                    is_loading: false,
                                }
                            }
                        };
                        Self::apply(&view, &view_change, next).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Intermediate states were missed; the next event
                        // carries the full session either way.
                        warn!("Auth event stream lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Auth event stream closed, subscription task exiting");
                        break;
                    }
                }
            }
        });

        Subscription { handle }
    }

    fn hydrate(&self, session: Session) -> SessionView {
        hydrate_into(&self.store, session)
    }

    /// ビューを置き換えて変更を通知
    async fn apply(
        view: &Arc<RwLock<SessionView>>,
        view_change: &broadcast::Sender<SessionView>,
        next: SessionView,
    ) {
        {
            let mut guard = view.write().await;
            *guard = next.clone();
        }
        // Ignore send error if no receivers are listening
        let _ = view_change.send(next);
    }
}

/// セッションからビューを構築し、スナップショットを更新
fn hydrate_into(store: &SnapshotStore, session: Session) -> SessionView {
    let user = AppUser::from_session(&session);
    if let Err(e) = store.write(&user) {
        warn!("Could not persist user snapshot: {}", e);
    }
    SessionView {
        user: Some(user),
        session: Some(session),
        is_loading: false,
    }
}

/// 購読ハンドル
///
/// Scoped acquisition with guaranteed release: dropping the handle
/// aborts the consuming task so the subscription never outlives its
/// owner.
pub struct Subscription {
    handle: tokio::task::JoinHandle<()>,
}

impl Subscription {
    /// 購読を明示的に解除
    pub fn unsubscribe(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
