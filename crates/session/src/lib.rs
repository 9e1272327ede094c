//! Session state for the skillpath learning platform.
//!
//! This crate reconciles the identity provider's authoritative session
//! with a durable local snapshot of the derived user, and exposes the
//! request/response auth actions the application drives.

// Declare modules
mod actions;
mod error;
mod notify;
mod snapshot;
mod sync;
mod user;

// Re-export key public types
pub use actions::AuthActions;
pub use error::SessionError;
pub use notify::{ChannelNotifier, LogNotifier, Notice, NoticeKind, Notifier};
pub use snapshot::SnapshotStore;
pub use sync::{SessionSynchronizer, SessionView, Subscription};
pub use user::AppUser;
