//! Conversation runtime executor

use super::traits::{LinkEnricher, Transport, TransportError};
use super::{ChatId, Envelope};

use crate::report::{chunk_text, format_report, ReportFields};
use crate::state_machine::{transition, Effect, MediaRef, ReportDraft, WizardState};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Longest we are willing to wait on a rate limit before a single retry
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(30);

/// Limits and timeouts the runtime applies to every conversation
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSettings {
    /// Maximum characters per outbound text message
    pub max_message_len: usize,
    /// Maximum items per media group
    pub max_media_batch: usize,
    /// Bound on the link enrichment call
    pub enrich_timeout: Duration,
    /// Reclaim a conversation after this long without events
    pub idle_timeout: Option<Duration>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_message_len: 4096,
            max_media_batch: 10,
            enrich_timeout: Duration::from_secs(10),
            idle_timeout: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}

/// Runtime for one conversation: owns its wizard state and executes the
/// effects of each transition
pub struct ConversationRuntime<T, E>
where
    T: Transport + 'static,
    E: LinkEnricher + 'static,
{
    chat_id: ChatId,
    state: WizardState,
    transport: Arc<T>,
    enricher: Arc<E>,
    settings: RuntimeSettings,
    event_rx: mpsc::UnboundedReceiver<Envelope>,
}

impl<T, E> ConversationRuntime<T, E>
where
    T: Transport + 'static,
    E: LinkEnricher + 'static,
{
    pub fn new(
        chat_id: ChatId,
        transport: Arc<T>,
        enricher: Arc<E>,
        settings: RuntimeSettings,
        event_rx: mpsc::UnboundedReceiver<Envelope>,
    ) -> Self {
        Self {
            chat_id,
            state: WizardState::Idle,
            transport,
            enricher,
            settings,
            event_rx,
        }
    }

    pub async fn run(mut self) {
        tracing::debug!(chat_id = self.chat_id, "Conversation runtime running");

        loop {
            let next = match self.settings.idle_timeout {
                Some(idle) => match timeout(idle, self.event_rx.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        self.reclaim().await;
                        break;
                    }
                },
                None => self.event_rx.recv().await,
            };

            let Some(envelope) = next else { break };
            self.process_event(envelope).await;
        }

        tracing::info!(chat_id = self.chat_id, "Conversation runtime stopped");
    }

    /// Stop accepting events, finish whatever was already queued, then let
    /// the draft go.
    async fn reclaim(&mut self) {
        self.event_rx.close();
        while let Some(envelope) = self.event_rx.recv().await {
            self.process_event(envelope).await;
        }
        if let Some(step) = self.state.step() {
            tracing::info!(
                chat_id = self.chat_id,
                step = ?step,
                "Reclaiming abandoned draft after idle timeout"
            );
        }
        self.state = WizardState::Idle;
    }

    async fn process_event(&mut self, envelope: Envelope) {
        let Envelope { context, event } = envelope;
        let state = std::mem::take(&mut self.state);
        let from = state.step();

        // Pure state transition; the new state is stored before any effect
        // runs so a failing effect cannot leave a half-updated draft behind
        let result = transition(state, &context, event);
        self.state = result.new_state;

        let to = self.state.step();
        if from != to {
            tracing::debug!(chat_id = self.chat_id, from = ?from, to = ?to, "Step changed");
        }

        for effect in result.effects {
            self.execute_effect(effect).await;
        }
    }

    async fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::Reply { text, rich } => self.send_text(&text, rich).await,
            Effect::PublishReport { draft } => self.publish(&draft).await,
        }
    }

    async fn publish(&self, draft: &ReportDraft) {
        let paid_links = self.enrich(&draft.paid_links).await;
        let fields = ReportFields {
            paid_links: &paid_links,
            ..draft.fields()
        };
        let report = format_report(&fields);
        let chunks = chunk_text(&report, self.settings.max_message_len);
        let media = draft.media();

        tracing::info!(
            chat_id = self.chat_id,
            chunks = chunks.len(),
            media = media.len(),
            "Publishing report"
        );

        for chunk in &chunks {
            self.send_text(chunk, true).await;
        }
        for batch in media_batches(media, self.settings.max_media_batch) {
            let result = self
                .with_retry(|| self.transport.send_media_group(self.chat_id, batch))
                .await;
            if let Err(e) = result {
                tracing::error!(
                    chat_id = self.chat_id,
                    error = %e,
                    size = batch.len(),
                    "Failed to send media group"
                );
            }
        }
    }

    /// Run the enricher over the paid links, falling back to the lines as
    /// entered on error or timeout
    async fn enrich(&self, lines: &[String]) -> Vec<String> {
        if lines.is_empty() {
            return Vec::new();
        }

        match timeout(self.settings.enrich_timeout, self.enricher.enrich(lines.to_vec())).await {
            Ok(Ok(enriched)) => enriched,
            Ok(Err(e)) => {
                tracing::warn!(chat_id = self.chat_id, error = %e, "Using links as entered");
                lines.to_vec()
            }
            Err(_) => {
                tracing::warn!(
                    chat_id = self.chat_id,
                    timeout = ?self.settings.enrich_timeout,
                    "Link enrichment timed out, using links as entered"
                );
                lines.to_vec()
            }
        }
    }

    async fn send_text(&self, text: &str, rich: bool) {
        let result = self
            .with_retry(|| self.transport.send_text(self.chat_id, text, rich))
            .await;
        if let Err(e) = result {
            tracing::error!(chat_id = self.chat_id, error = %e, "Failed to send message");
        }
    }

    /// Retry once after a rate limit; other failures are returned as is
    async fn with_retry<F, Fut>(&self, mut send: F) -> Result<(), TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), TransportError>>,
    {
        match send().await {
            Err(TransportError::RateLimited { retry_after }) => {
                let wait = retry_after.min(MAX_RATE_LIMIT_WAIT);
                tracing::warn!(chat_id = self.chat_id, wait = ?wait, "Rate limited, retrying");
                tokio::time::sleep(wait).await;
                send().await
            }
            other => other,
        }
    }
}

/// Split media into groups of at most `max` items. A group never mixes
/// photos with documents; order is preserved.
pub fn media_batches(media: &[MediaRef], max: usize) -> Vec<&[MediaRef]> {
    let max = max.max(1);
    let mut batches = Vec::new();
    let mut rest = media;

    while let Some(first) = rest.first() {
        let run = rest
            .iter()
            .take(max)
            .take_while(|m| m.kind == first.kind)
            .count();
        let (batch, tail) = rest.split_at(run);
        batches.push(batch);
        rest = tail;
    }
    batches
}
