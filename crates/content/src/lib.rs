//! Hosted AI service clients for the skillpath learning platform.
//!
//! This crate provides thin request/response clients for the generative
//! content API, the career chat API, and the text-to-speech API. Every
//! call is a single round trip with no retry logic.

// Declare modules
mod chat;
mod error;
mod generate;
mod speech;

// Re-export key public types
pub use chat::{ChatClient, CHAT_SYSTEM_INSTRUCTION};
pub use error::ContentError;
pub use generate::{ContentClient, ModuleContent, ModuleContentRequest, VisualItem};
pub use speech::{SpeechClient, MAX_SPEECH_INPUT_CHARS};

/// 結果型
pub type Result<T> = std::result::Result<T, ContentError>;
