use crate::domain::model::{Category, Recipient};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// 渲染後的郵件內容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything the mailer needs for a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<Attachment>,
}

/// 單次寄送失敗的種類，controller 依此決定是否重試
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

impl SendError {
    pub fn is_encoding(&self) -> bool {
        matches!(self, SendError::Encoding(_))
    }
}

pub trait Renderer: Send + Sync {
    /// Must be pure: identical inputs always yield identical output.
    fn render(&self, category: Category, recipient: &Recipient) -> RenderedEmail;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> std::result::Result<(), SendError>;
}

pub trait CertificateStore: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseKind {
    BetweenEmails,
    BetweenChunks,
    BetweenGroups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Completed,
    Cancelled,
}

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(
        &self,
        kind: PauseKind,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> PauseOutcome;
}
