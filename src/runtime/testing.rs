//! Mock implementations for testing
//!
//! These mocks enable runtime testing without a real messaging platform.

use super::traits::*;
use super::ChatId;
use crate::state_machine::MediaRef;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Transport
// ============================================================================

/// A message the mock transport accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        rich: bool,
    },
    Media {
        chat_id: ChatId,
        media: Vec<MediaRef>,
    },
}

/// Failure to inject on an upcoming send
#[derive(Debug, Clone, Copy)]
enum Injected {
    Fail,
    RateLimit(Duration),
}

/// Mock transport that records everything sent through it
pub struct MockTransport {
    sent: Mutex<Vec<Sent>>,
    failures: Mutex<VecDeque<Injected>>,
    attempts: Mutex<usize>,
    stalled: Mutex<HashSet<ChatId>>,
    notify: Notify,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            attempts: Mutex::new(0),
            stalled: Mutex::new(HashSet::new()),
            notify: Notify::new(),
        }
    }

    /// Make the next send fail outright
    pub fn fail_next(&self) {
        self.failures.lock().unwrap().push_back(Injected::Fail);
    }

    /// Make the next send report a rate limit
    pub fn rate_limit_next(&self, retry_after: Duration) {
        self.failures
            .lock()
            .unwrap()
            .push_back(Injected::RateLimit(retry_after));
    }

    /// Make every send to `chat_id` hang forever
    pub fn stall(&self, chat_id: ChatId) {
        self.stalled.lock().unwrap().insert(chat_id);
    }

    async fn hang_if_stalled(&self, chat_id: ChatId) {
        let stalled = self.stalled.lock().unwrap().contains(&chat_id);
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    /// Successfully sent messages, in order
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts successfully sent to one conversation
    pub fn texts_for(&self, chat: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { chat_id, text, .. } if chat_id == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Send attempts, including failed ones
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Wait until at least `count` messages were sent
    pub async fn wait_for(&self, count: usize) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().unwrap().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {count} sent messages"));
    }

    fn record(&self, sent: Sent) -> Result<(), TransportError> {
        *self.attempts.lock().unwrap() += 1;
        match self.failures.lock().unwrap().pop_front() {
            Some(Injected::Fail) => return Err(TransportError::Failed("injected".to_string())),
            Some(Injected::RateLimit(retry_after)) => {
                return Err(TransportError::RateLimited { retry_after })
            }
            None => {}
        }
        self.sent.lock().unwrap().push(sent);
        self.notify.notify_waiters();
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        rich: bool,
    ) -> Result<(), TransportError> {
        self.hang_if_stalled(chat_id).await;
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
            rich,
        })
    }

    async fn send_media_group(
        &self,
        chat_id: ChatId,
        media: &[MediaRef],
    ) -> Result<(), TransportError> {
        self.hang_if_stalled(chat_id).await;
        self.record(Sent::Media {
            chat_id,
            media: media.to_vec(),
        })
    }
}

// ============================================================================
// Mock Enricher
// ============================================================================

enum Behavior {
    Map(Box<dyn Fn(&str) -> String + Send + Sync>),
    Fail,
    Slow(Duration),
}

/// Mock enricher with a fixed behavior that records its inputs
pub struct MockEnricher {
    behavior: Behavior,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockEnricher {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn passthrough() -> Self {
        Self::with(Behavior::Map(Box::new(str::to_string)))
    }

    /// Rewrite every line with `f`
    pub fn mapping(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::with(Behavior::Map(Box::new(f)))
    }

    pub fn failing() -> Self {
        Self::with(Behavior::Fail)
    }

    /// Answer unchanged, but only after `delay`
    pub fn slow(delay: Duration) -> Self {
        Self::with(Behavior::Slow(delay))
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkEnricher for MockEnricher {
    async fn enrich(&self, lines: Vec<String>) -> Result<Vec<String>, EnrichError> {
        self.calls.lock().unwrap().push(lines.clone());
        match &self.behavior {
            Behavior::Map(f) => Ok(lines.iter().map(|line| f(line)).collect()),
            Behavior::Fail => Err(EnrichError("lookup unavailable".to_string())),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(lines)
            }
        }
    }
}
