//! Client session: inbound event routing and command dispatch
//!
//! One session binds one credential's connection, owns one macro
//! manager, and routes owner-issued commands to it. All command
//! failures are local to the invoking message; nothing here tears down
//! the session loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::{CommandError, CommandKind, CommandSet, tokenize};
use crate::interval::parse_interval;
use crate::macros::MacroManager;
use crate::transport::{ChatTransport, InboundMessage};

/// One chat client: owner filter, command parsing, macro bookkeeping
pub struct ClientSession {
    index: usize,
    owner_id: u64,
    transport: Arc<dyn ChatTransport>,
    commands: CommandSet,
    macros: MacroManager,
}

impl ClientSession {
    /// Create a session for a 1-based client index
    pub fn new(index: usize, owner_id: u64, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            index,
            owner_id,
            commands: CommandSet::new(index),
            macros: MacroManager::new(transport.clone()),
            transport,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The session's macro manager, for introspection
    pub fn macros(&self) -> &MacroManager {
        &self.macros
    }

    /// Consume the inbound event stream until the transport closes it,
    /// then stop all macros owned by this session.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<InboundMessage>) {
        info!("Client {} session loop started", self.index);

        while let Some(message) = events.recv().await {
            self.handle_message(message).await;
        }

        info!("Client {} event stream closed", self.index);
        self.macros.shutdown().await;
    }

    /// Route a single inbound message
    pub async fn handle_message(&self, message: InboundMessage) {
        // Authorization boundary: anyone but the owner is ignored
        // entirely, with no reply
        if message.sender_id != self.owner_id {
            return;
        }

        let tokens = match tokenize(message.text.trim()) {
            Ok(tokens) => tokens,
            Err(CommandError::UnbalancedQuote) => {
                self.reply(message.channel_id, "❌ Invalid command format.")
                    .await;
                return;
            }
        };

        let Some(first) = tokens.first() else {
            return;
        };

        let Some(kind) = self.commands.classify(first) else {
            return;
        };

        debug!("Client {} handling {:?} command", self.index, kind);

        match kind {
            CommandKind::StartMacro => self.handle_macro(&message, &tokens).await,
            CommandKind::Stop => self.handle_stop(&message).await,
            CommandKind::StopAll => self.handle_stop_all(&message).await,
            CommandKind::Status => self.handle_status(&message).await,
        }
    }

    async fn handle_macro(&self, message: &InboundMessage, tokens: &[String]) {
        if tokens.len() != 3 {
            self.reply(message.channel_id, &self.commands.macro_usage())
                .await;
            return;
        }

        let item = &tokens[1];
        let interval_raw = &tokens[2];

        let Some(interval) = parse_interval(interval_raw) else {
            self.reply(
                message.channel_id,
                "❌ Invalid interval format. Use like `2s`, `1.5m`, `0.5h`, `1d`.",
            )
            .await;
            return;
        };

        self.macros
            .start(message.channel_id, item, interval_raw, interval)
            .await;

        self.reply(
            message.channel_id,
            &format!(
                "**✓ [Bot {}] Macroing `{}` every `{}`**",
                self.index, item, interval_raw
            ),
        )
        .await;
    }

    async fn handle_stop(&self, message: &InboundMessage) {
        if self.macros.stop(message.channel_id).await {
            self.reply(
                message.channel_id,
                &format!("**🛑 [Bot {}] Stopped macroing.**", self.index),
            )
            .await;
        } else {
            self.reply(message.channel_id, "⚠️ No active macro in this channel.")
                .await;
        }
    }

    async fn handle_stop_all(&self, message: &InboundMessage) {
        if self.macros.stop_all().await > 0 {
            self.reply(
                message.channel_id,
                &format!("**🛑 [Bot {}] Stopped all macros.**", self.index),
            )
            .await;
        } else {
            self.reply(message.channel_id, "📭 No active macros to stop.")
                .await;
        }
    }

    async fn handle_status(&self, message: &InboundMessage) {
        let statuses = self.macros.list().await;

        if statuses.is_empty() {
            self.notify_owner(
                message.sender_id,
                &format!("📭 [Bot {}] No active macros.", self.index),
            )
            .await;
            return;
        }

        let mut lines = vec![format!("### Active Macros (Bot {}):", self.index)];

        for status in statuses {
            let info = self
                .transport
                .channel_info(status.channel_id)
                .await
                .unwrap_or_default();

            let guild_name = info.guild_name.unwrap_or_else(|| "DM".to_string());
            let channel_name = info
                .channel_name
                .map(|name| format!("#{}", name))
                .unwrap_or_else(|| "DM".to_string());

            lines.push(format!(
                "- Server: {} | Channel: {}\n  → Macroing `{}` every `{}`",
                guild_name, channel_name, status.item, status.interval_raw
            ));
        }

        self.notify_owner(message.sender_id, &lines.join("\n")).await;
    }

    /// Best-effort direct notice to the owner. Delivery failures are
    /// acknowledged here and dropped; they are never retried and never
    /// surfaced to the triggering channel.
    async fn notify_owner(&self, user_id: u64, text: &str) {
        if let Err(e) = self.transport.send_direct(user_id, text).await {
            debug!("Dropped direct notice to {}: {}", user_id, e);
        }
    }

    /// Reply in the invoking channel; failures are logged and contained
    async fn reply(&self, channel_id: u64, text: &str) {
        if let Err(e) = self.transport.send(channel_id, text).await {
            warn!("Failed to reply in channel {}: {}", channel_id, e);
        }
    }
}
