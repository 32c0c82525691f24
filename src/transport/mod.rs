//! Channel message transport abstraction
//!
//! The bot core does not speak any chat-platform protocol itself. It
//! consumes a transport capability: outbound channel sends, best-effort
//! direct messages, and an inbound event stream of
//! `(sender, channel, text)` messages delivered one at a time per
//! client.

pub mod console;
pub mod mock;

use async_trait::async_trait;

/// One inbound chat message as seen by a client session
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: u64,
    pub channel_id: u64,
    pub text: String,
}

/// Display metadata for a channel, used by status reports. Missing
/// fields render as "DM".
#[derive(Debug, Clone, Default)]
pub struct ChannelInfo {
    pub guild_name: Option<String>,
    pub channel_name: Option<String>,
}

/// Error types for channel sends
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("channel send failed: {0}")]
    SendFailed(String),
    #[error("transport connection closed")]
    Closed,
}

/// Error types for direct-message delivery
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("direct message delivery failed: {0}")]
    Undeliverable(String),
    #[error("transport connection closed")]
    Closed,
}

/// Outbound surface of a chat connection
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a message to a channel
    async fn send(&self, channel_id: u64, text: &str) -> Result<(), TransportError>;

    /// Send a private message directly to a user
    async fn send_direct(&self, user_id: u64, text: &str) -> Result<(), DeliveryError>;

    /// Look up display metadata for a channel
    async fn channel_info(&self, channel_id: u64) -> Option<ChannelInfo>;
}
