use crate::error::SessionError;
use crate::user::AppUser;
use log::warn;
use std::fs;
use std::path::PathBuf;

/// ユーザースナップショットの保存先
///
/// Single-slot durable store of one JSON-serialized user. The slot is
/// overwritten on every write, read once during startup, and removed on
/// sign-out. No expiry, no versioning: one active user per device.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// 新しいストアを作成
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// スナップショットを書き込む
    pub fn write(&self, user: &AppUser) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let serialized = serde_json::to_vec(user)?;

        // Write through a sibling temp file so a crash never leaves a
        // half-written snapshot at the real path.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &serialized)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }

    /// スナップショットを読み込む
    ///
    /// A snapshot that fails to parse is treated as corrupt: it is
    /// deleted on the spot and reported as absent.
    pub fn read(&self) -> Option<AppUser> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read user snapshot: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<AppUser>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Discarding corrupt user snapshot: {}", e);
                self.clear();
                None
            }
        }
    }

    /// スナップショットを削除
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove user snapshot: {}", e);
            }
        }
    }

    /// スナップショットが存在するか
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}
