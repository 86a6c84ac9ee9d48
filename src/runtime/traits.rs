//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use super::ChatId;
use crate::state_machine::MediaRef;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure to deliver an outbound message
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("Send failed: {0}")]
    Failed(String),
}

/// Failure of the link enrichment lookup. Always recoverable.
#[derive(Debug, Error)]
#[error("Link enrichment failed: {0}")]
pub struct EnrichError(pub String);

/// Outbound side of the messaging platform
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message; `rich` enables the platform's HTML subset
    async fn send_text(&self, chat_id: ChatId, text: &str, rich: bool)
        -> Result<(), TransportError>;

    /// Send media as one group. Callers keep groups within the platform
    /// maximum and never mix media kinds in one group.
    async fn send_media_group(
        &self,
        chat_id: ChatId,
        media: &[MediaRef],
    ) -> Result<(), TransportError>;
}

/// External lookup that may annotate paid-link lines before rendering.
///
/// Must preserve order and be safe to call twice on the same input.
#[async_trait]
pub trait LinkEnricher: Send + Sync {
    async fn enrich(&self, lines: Vec<String>) -> Result<Vec<String>, EnrichError>;
}

/// Decides who may start a report
pub trait AccessGuard: Send + Sync {
    fn allows(&self, identity: i64) -> bool;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        rich: bool,
    ) -> Result<(), TransportError> {
        (**self).send_text(chat_id, text, rich).await
    }

    async fn send_media_group(
        &self,
        chat_id: ChatId,
        media: &[MediaRef],
    ) -> Result<(), TransportError> {
        (**self).send_media_group(chat_id, media).await
    }
}

#[async_trait]
impl<T: LinkEnricher + ?Sized> LinkEnricher for Arc<T> {
    async fn enrich(&self, lines: Vec<String>) -> Result<Vec<String>, EnrichError> {
        (**self).enrich(lines).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Enricher that leaves links as entered
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEnricher;

#[async_trait]
impl LinkEnricher for PassthroughEnricher {
    async fn enrich(&self, lines: Vec<String>) -> Result<Vec<String>, EnrichError> {
        Ok(lines)
    }
}

/// Allow-list of identities; an empty list lets everyone in
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    ids: HashSet<i64>,
}

impl AllowList {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.ids.is_empty()
    }
}

impl AccessGuard for AllowList {
    fn allows(&self, identity: i64) -> bool {
        self.ids.is_empty() || self.ids.contains(&identity)
    }
}
