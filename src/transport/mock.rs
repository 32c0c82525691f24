//! Mock transport implementation
//! Used for testing where no real chat-platform connection is available

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{ChannelInfo, ChatTransport, DeliveryError, InboundMessage, TransportError};

/// One recorded outbound message
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Channel id for sends, user id for direct messages
    pub target: u64,
    pub text: String,
    pub at: Instant,
}

/// Recording transport with per-target failure injection
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentMessage>>,
    direct: Mutex<Vec<SentMessage>>,
    failing_channels: Mutex<HashSet<u64>>,
    failing_direct: Mutex<bool>,
    send_delay: Mutex<Option<Duration>>,
    channels: Mutex<HashMap<u64, ChannelInfo>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register display metadata for a channel
    pub fn set_channel_info(&self, channel_id: u64, info: ChannelInfo) {
        self.channels.lock().unwrap().insert(channel_id, info);
    }

    /// Make sends to a channel fail until cleared
    pub fn fail_channel(&self, channel_id: u64, failing: bool) {
        let mut failing_channels = self.failing_channels.lock().unwrap();
        if failing {
            failing_channels.insert(channel_id);
        } else {
            failing_channels.remove(&channel_id);
        }
    }

    /// Make all direct-message deliveries fail until cleared
    pub fn fail_direct(&self, failing: bool) {
        *self.failing_direct.lock().unwrap() = failing;
    }

    /// Add artificial latency to every channel send, so tests can
    /// observe a tick while it is still mid-send
    pub fn set_send_delay(&self, delay: Option<Duration>) {
        *self.send_delay.lock().unwrap() = delay;
    }

    /// Snapshot of every recorded channel send
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts sent to one channel, in order
    pub fn sent_to(&self, channel_id: u64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.target == channel_id)
            .map(|m| m.text.clone())
            .collect()
    }

    /// Texts direct-messaged to one user, in order
    pub fn direct_to(&self, user_id: u64) -> Vec<String> {
        self.direct
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.target == user_id)
            .map(|m| m.text.clone())
            .collect()
    }

    /// Build an inbound message for handler tests
    pub fn inbound(sender_id: u64, channel_id: u64, text: &str) -> InboundMessage {
        InboundMessage {
            sender_id,
            channel_id,
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send(&self, channel_id: u64, text: &str) -> Result<(), TransportError> {
        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_channels.lock().unwrap().contains(&channel_id) {
            return Err(TransportError::SendFailed(format!(
                "injected failure for channel {}",
                channel_id
            )));
        }

        self.sent.lock().unwrap().push(SentMessage {
            target: channel_id,
            text: text.to_string(),
            at: Instant::now(),
        });

        Ok(())
    }

    async fn send_direct(&self, user_id: u64, text: &str) -> Result<(), DeliveryError> {
        if *self.failing_direct.lock().unwrap() {
            return Err(DeliveryError::Undeliverable(format!(
                "injected failure for user {}",
                user_id
            )));
        }

        self.direct.lock().unwrap().push(SentMessage {
            target: user_id,
            text: text.to_string(),
            at: Instant::now(),
        });

        Ok(())
    }

    async fn channel_info(&self, channel_id: u64) -> Option<ChannelInfo> {
        self.channels.lock().unwrap().get(&channel_id).cloned()
    }
}
