//! User-visible feedback messages

use std::sync::Arc;
use tokio::sync::RwLock;

/// A message waiting to be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Error(m) | Notice::Success(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Latest notice for a view; a new notice replaces the previous one
#[derive(Debug, Clone, Default)]
pub struct Feedback {
    notice: Arc<RwLock<Option<Notice>>>,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn show_error(&self, message: impl Into<String>) {
        *self.notice.write().await = Some(Notice::Error(message.into()));
    }

    pub async fn show_success(&self, message: impl Into<String>) {
        *self.notice.write().await = Some(Notice::Success(message.into()));
    }

    pub async fn current(&self) -> Option<Notice> {
        self.notice.read().await.clone()
    }

    /// Take the current notice, leaving the slot empty
    pub async fn take(&self) -> Option<Notice> {
        self.notice.write().await.take()
    }

    pub async fn clear(&self) {
        *self.notice.write().await = None;
    }
}
