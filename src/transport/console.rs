//! Console transport for local interactive use
//!
//! Lines typed on stdin become owner-authored inbound messages on a
//! fixed console channel; channel sends and direct messages are echoed
//! to stdout. Lets the bot run end to end without a chat-platform
//! connection.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{ChannelInfo, ChatTransport, DeliveryError, InboundMessage, TransportError};

/// Channel id every console line is attributed to
pub const CONSOLE_CHANNEL_ID: u64 = 1;

/// Local stdin/stdout transport shared by all client sessions
pub struct ConsoleTransport {
    owner_id: u64,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<InboundMessage>>>,
}

impl ConsoleTransport {
    pub fn new(owner_id: u64) -> Self {
        Self {
            owner_id,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a session for the inbound event stream. Every session
    /// sees every message; command namespacing does the filtering.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<InboundMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .push(tx);
        rx
    }

    /// Spawn the stdin reader that fans lines out to all subscribers
    pub fn spawn_stdin_reader(self: Arc<Self>) {
        let transport = self;

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            info!("Console transport reading commands from stdin");

            while let Ok(Some(line)) = lines.next_line().await {
                let message = InboundMessage {
                    sender_id: transport.owner_id,
                    channel_id: CONSOLE_CHANNEL_ID,
                    text: line,
                };
                transport.fan_out(message);
            }

            info!("Console input closed");
        });
    }

    fn fan_out(&self, message: InboundMessage) {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber list lock poisoned");

        // Drop subscribers whose sessions have gone away
        subscribers.retain(|tx| match tx.send(message.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!("Dropping closed console subscriber");
                false
            }
        });
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send(&self, channel_id: u64, text: &str) -> Result<(), TransportError> {
        println!("{} {}", format!("[channel {}]", channel_id).cyan(), text);
        Ok(())
    }

    async fn send_direct(&self, user_id: u64, text: &str) -> Result<(), DeliveryError> {
        println!("{} {}", format!("[dm -> {}]", user_id).dimmed(), text);
        Ok(())
    }

    async fn channel_info(&self, channel_id: u64) -> Option<ChannelInfo> {
        if channel_id == CONSOLE_CHANNEL_ID {
            Some(ChannelInfo {
                guild_name: None,
                channel_name: Some("console".to_string()),
            })
        } else {
            None
        }
    }
}
