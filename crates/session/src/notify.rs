use log::{error, info};
use tokio::sync::broadcast;

/// 通知の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// ユーザー向け通知
///
/// The toast analog: every auth action outcome becomes one of these.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// 成功通知を作成
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// エラー通知を作成
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// 情報通知を作成
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }
}

/// 通知の出力先
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// ログに出力する Notifier
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => error!("{}", notice.message),
            NoticeKind::Success | NoticeKind::Info => info!("{}", notice.message),
        }
    }
}

/// ブロードキャストチャンネルに流す Notifier
///
/// UI layers subscribe and drain these into whatever toast surface they
/// have. Sending with no receivers is not an error.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Notice>,
}

impl ChannelNotifier {
    /// 新しい Notifier を作成
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// 通知を受け取るためのレシーバーを取得
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }
}
