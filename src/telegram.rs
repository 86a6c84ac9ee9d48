//! Telegram Bot API adapter
//!
//! The client implements the runtime's `Transport`; the poller turns
//! updates into inbound events for the runtime manager.

mod client;
mod poller;
pub mod types;

pub use client::TelegramClient;
pub use poller::Poller;
