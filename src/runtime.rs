//! Runtime for executing report conversations
//!
//! Each conversation gets its own task that owns the wizard state and
//! processes inbound events strictly one at a time. Distinct conversations
//! run concurrently; nothing is shared between them except the transport
//! and the enricher, which are stateless from the wizard's point of view.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ConversationRuntime, RuntimeSettings};
pub use traits::*;

use crate::state_machine::{Event, WizardContext};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio_util::task::TaskTracker;

/// Conversation identity as assigned by the platform
pub type ChatId = i64;

/// An inbound event as delivered by the transport
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    /// Sender identity, when the platform provides one
    pub sender_id: Option<i64>,
    pub event: Event,
}

/// An event paired with what the access guard said about its sender
#[derive(Debug)]
pub struct Envelope {
    pub context: WizardContext,
    pub event: Event,
}

/// Routes inbound events to per-conversation runtimes, spawning them on
/// demand.
///
/// The map from conversation to runtime is the only place drafts can be
/// reached from; a conversation's draft lives inside its runtime task.
/// Queues are unbounded so a stalled conversation never holds up delivery
/// to the others.
pub struct RuntimeManager<T, E, G>
where
    T: Transport + 'static,
    E: LinkEnricher + 'static,
    G: AccessGuard,
{
    transport: Arc<T>,
    enricher: Arc<E>,
    guard: G,
    settings: RuntimeSettings,
    runtimes: RwLock<HashMap<ChatId, mpsc::UnboundedSender<Envelope>>>,
    tasks: TaskTracker,
}

impl<T, E, G> RuntimeManager<T, E, G>
where
    T: Transport + 'static,
    E: LinkEnricher + 'static,
    G: AccessGuard,
{
    pub fn new(transport: Arc<T>, enricher: Arc<E>, guard: G, settings: RuntimeSettings) -> Self {
        Self {
            transport,
            enricher,
            guard,
            settings,
            runtimes: RwLock::new(HashMap::new()),
            tasks: TaskTracker::new(),
        }
    }

    /// Deliver an event to its conversation without waiting on it.
    ///
    /// The transport must call this in the order events arrived for any
    /// one conversation; that order is what the runtime processes.
    pub async fn dispatch(&self, inbound: InboundEvent) {
        let InboundEvent {
            chat_id,
            sender_id,
            event,
        } = inbound;

        let identity = sender_id.unwrap_or(chat_id);
        let context = WizardContext {
            authorized: self.guard.allows(identity),
        };
        if !context.authorized {
            tracing::debug!(chat_id, identity, "Sender not on allow-list");
        }

        let mut envelope = Envelope { context, event };
        // A runtime that hit its idle timeout closes its queue; respawn once
        for _ in 0..2 {
            let tx = self.sender_for(chat_id).await;
            match tx.send(envelope) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    let mut runtimes = self.runtimes.write().await;
                    if runtimes.get(&chat_id).is_some_and(|cur| cur.same_channel(&tx)) {
                        runtimes.remove(&chat_id);
                    }
                    envelope = returned;
                }
            }
        }
        tracing::error!(chat_id, "Could not deliver event to conversation runtime");
    }

    /// Number of conversations with a live runtime
    pub async fn active_conversations(&self) -> usize {
        self.runtimes
            .read()
            .await
            .values()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    /// Stop accepting events and wait up to `grace` for every runtime to
    /// finish what it already has queued. Returns whether all of them did.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let active = self.active_conversations().await;
        tracing::info!(active, "Shutting down conversation runtimes");
        // Dropping the senders lets each runtime drain its queue and exit
        self.runtimes.write().await.clear();
        self.tasks.close();
        let drained = tokio::time::timeout(grace, self.tasks.wait()).await.is_ok();
        if !drained {
            tracing::warn!(
                remaining = self.tasks.len(),
                grace = ?grace,
                "Conversation runtimes still busy at shutdown"
            );
        }
        drained
    }

    async fn sender_for(&self, chat_id: ChatId) -> mpsc::UnboundedSender<Envelope> {
        if let Some(tx) = self.runtimes.read().await.get(&chat_id) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another dispatch may have spawned it while we waited for the lock
        if let Some(tx) = runtimes.get(&chat_id) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }

        // Forget runtimes that were reclaimed and never heard from again
        runtimes.retain(|_, tx| !tx.is_closed());

        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = ConversationRuntime::new(
            chat_id,
            Arc::clone(&self.transport),
            Arc::clone(&self.enricher),
            self.settings,
            rx,
        );
        self.tasks.spawn(runtime.run());
        runtimes.insert(chat_id, tx.clone());
        tracing::info!(chat_id, "Started conversation runtime");
        tx
    }
}
