//! Supervisor for client session lifecycles
//!
//! Owns the explicit collection of client sessions (no process-wide
//! registry), starts each session's event loop as its own task, and
//! keeps the process alive until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::{StreamExt, stream::FuturesUnordered};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::session::ClientSession;
use crate::transport::InboundMessage;
use crate::transport::console::ConsoleTransport;

/// Runs one session loop per launched client
pub struct Supervisor {
    sessions: Vec<Arc<ClientSession>>,
    handles: Vec<JoinHandle<()>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Build a supervisor with every configured credential running over
    /// a shared console transport. Empty credential slots are skipped
    /// but still consume their 1-based index.
    pub fn start_console(config: &Config) -> Result<Self> {
        let transport = Arc::new(ConsoleTransport::new(config.owner_id));
        let mut supervisor = Self::new();

        for (slot, token) in config.tokens.iter().enumerate() {
            if token.trim().is_empty() {
                continue;
            }

            let index = slot + 1;
            let events = transport.subscribe();
            let session = ClientSession::new(index, config.owner_id, transport.clone());
            supervisor.launch(session, events);
        }

        if supervisor.session_count() == 0 {
            anyhow::bail!("No non-empty credentials configured; nothing to run");
        }

        transport.spawn_stdin_reader();

        Ok(supervisor)
    }

    /// Start one session's event loop as an independent task
    pub fn launch(
        &mut self,
        session: ClientSession,
        events: mpsc::UnboundedReceiver<InboundMessage>,
    ) {
        info!("Launching client {}", session.index());

        let session = Arc::new(session);
        self.sessions.push(session.clone());
        self.handles.push(tokio::spawn(async move {
            session.run(events).await;
        }));
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Block until an external termination signal, then shut down
    pub async fn wait_for_shutdown(&mut self) -> Result<()> {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;

        info!("Shutdown signal received");
        self.shutdown().await;

        Ok(())
    }

    /// Stop every session loop and cancel all macros they own
    pub async fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }

        let mut teardowns = FuturesUnordered::new();
        for session in self.sessions.drain(..) {
            teardowns.push(async move {
                session.macros().shutdown().await;
            });
        }
        while teardowns.next().await.is_some() {}

        info!("All client sessions stopped");
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
