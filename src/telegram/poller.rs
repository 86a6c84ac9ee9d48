//! Long-polling loop feeding updates into the runtime manager

use super::client::{TelegramClient, TelegramError};
use super::types::{Message, Update};
use crate::runtime::{AccessGuard, InboundEvent, LinkEnricher, RuntimeManager, Transport};
use crate::state_machine::{Command, Event, MediaRef};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff after consecutive polling failures: 1s, 2s, 4s, ...
fn backoff_delay(failures: u32) -> Duration {
    let secs = 1u64 << failures.saturating_sub(1).min(6);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// Translate one platform message into a wizard event.
///
/// Text starting with a known `/command` becomes a command; other text is
/// input as typed. Photos resolve to their largest size; documents count
/// as media only when they are images. Everything else is not for us.
pub fn inbound_event(message: &Message) -> Option<InboundEvent> {
    let event = if let Some(text) = &message.text {
        text_event(text)
    } else if let Some(sizes) = &message.photo {
        let largest = sizes
            .iter()
            .max_by_key(|p| (u64::from(p.width) * u64::from(p.height), p.file_size))?;
        Event::media(MediaRef::photo(largest.file_id.as_str()))
    } else if let Some(document) = message.document.as_ref().filter(|d| d.is_image()) {
        Event::media(MediaRef::document(document.file_id.as_str()))
    } else {
        return None;
    };

    Some(InboundEvent {
        chat_id: message.chat.id,
        sender_id: message.from.as_ref().map(|u| u.id),
        event,
    })
}

fn text_event(text: &str) -> Event {
    text.strip_prefix('/')
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(Command::parse)
        .map_or_else(|| Event::text(text), Event::Command)
}

/// Pulls updates with `getUpdates` and hands them to the manager in
/// arrival order
pub struct Poller {
    client: TelegramClient,
    poll_timeout: Duration,
    offset: Option<i64>,
}

impl Poller {
    pub fn new(client: TelegramClient, poll_timeout: Duration) -> Self {
        Self {
            client,
            poll_timeout,
            offset: None,
        }
    }

    /// Poll until `cancel` fires. Failures are logged and retried with
    /// backoff; they never end the loop.
    pub async fn run<T, E, G>(mut self, manager: &RuntimeManager<T, E, G>, cancel: CancellationToken)
    where
        T: Transport + 'static,
        E: LinkEnricher + 'static,
        G: AccessGuard,
    {
        tracing::info!(poll_timeout = ?self.poll_timeout, "Polling for updates");
        let mut failures: u32 = 0;

        loop {
            let polled = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                polled = self.client.get_updates(self.offset, self.poll_timeout) => polled,
            };

            match polled {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        self.deliver(manager, update).await;
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = match &e {
                        TelegramError::RateLimited { retry_after } => *retry_after,
                        _ => backoff_delay(failures),
                    };
                    tracing::error!(error = %e, failures, delay = ?delay, "Polling failed");
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        tracing::info!("Polling stopped");
    }

    async fn deliver<T, E, G>(&mut self, manager: &RuntimeManager<T, E, G>, update: Update)
    where
        T: Transport + 'static,
        E: LinkEnricher + 'static,
        G: AccessGuard,
    {
        self.offset = Some(update.update_id + 1);
        let Some(message) = update.message else {
            return;
        };
        match inbound_event(&message) {
            Some(inbound) => manager.dispatch(inbound).await,
            None => tracing::debug!(
                chat_id = message.chat.id,
                message_id = message.message_id,
                "Ignoring unsupported message"
            ),
        }
    }
}
