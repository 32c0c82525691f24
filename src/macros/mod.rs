//! Repeating macro task management
//!
//! Owns, per client session, the mapping from channel id to its active
//! repeating task. At most one task exists per channel at any instant;
//! starting a macro in a channel that already has one replaces it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::transport::ChatTransport;

/// Human-readable echo of one active macro, as reported by `list`
#[derive(Debug, Clone)]
pub struct MacroStatus {
    pub channel_id: u64,
    pub item: String,
    /// Interval text exactly as the owner typed it
    pub interval_raw: String,
}

/// One active repeating task. Handle and metadata live and die together
/// under the manager's table lock.
struct MacroTask {
    handle: JoinHandle<()>,
    status: MacroStatus,
}

/// Channel-keyed repeating task table for one client session
pub struct MacroManager {
    transport: Arc<dyn ChatTransport>,
    tasks: Mutex<HashMap<u64, MacroTask>>,
}

impl MacroManager {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Start a macro in a channel, replacing any existing one.
    ///
    /// The previous task (if any) is aborted before the new one is
    /// recorded, so once this returns the superseded task can never
    /// send again. Returns as soon as bookkeeping is updated; never
    /// waits on a send. The first send happens immediately, then the
    /// loop waits a full interval between repeats.
    pub async fn start(&self, channel_id: u64, item: &str, interval_raw: &str, interval: Duration) {
        let mut tasks = self.tasks.lock().await;

        if let Some(previous) = tasks.remove(&channel_id) {
            previous.handle.abort();
            debug!(
                "Replaced macro in channel {}: `{}` canceled",
                channel_id, previous.status.item
            );
        }

        let handle = tokio::spawn(repeat_loop(
            self.transport.clone(),
            channel_id,
            item.to_string(),
            interval,
        ));

        tasks.insert(
            channel_id,
            MacroTask {
                handle,
                status: MacroStatus {
                    channel_id,
                    item: item.to_string(),
                    interval_raw: interval_raw.to_string(),
                },
            },
        );

        info!(
            "Started macro in channel {}: `{}` every {}",
            channel_id, item, interval_raw
        );
    }

    /// Stop the macro in a channel. Returns false when the channel had
    /// no active macro (a user-visible notice, not an error).
    pub async fn stop(&self, channel_id: u64) -> bool {
        let mut tasks = self.tasks.lock().await;

        match tasks.remove(&channel_id) {
            Some(task) => {
                task.handle.abort();
                info!("Stopped macro in channel {}", channel_id);
                true
            }
            None => {
                debug!("No active macro in channel {}", channel_id);
                false
            }
        }
    }

    /// Stop every macro owned by this session. Returns how many were
    /// stopped; zero means the table was already empty.
    pub async fn stop_all(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        let stopped = tasks.len();

        for (channel_id, task) in tasks.drain() {
            task.handle.abort();
            debug!("Stopped macro in channel {}", channel_id);
        }

        if stopped > 0 {
            info!("Stopped all {} macros", stopped);
        }

        stopped
    }

    /// Snapshot of all active macros. The returned copies are detached
    /// from the live table.
    pub async fn list(&self) -> Vec<MacroStatus> {
        let tasks = self.tasks.lock().await;
        let mut statuses: Vec<MacroStatus> = tasks.values().map(|t| t.status.clone()).collect();
        statuses.sort_by_key(|s| s.channel_id);
        statuses
    }

    /// Stop everything at session teardown
    pub async fn shutdown(&self) {
        let stopped = self.stop_all().await;
        if stopped > 0 {
            warn!("Session shut down with {} macros still active", stopped);
        }
    }
}

/// Tick protocol for one macro: send, wait one full interval, repeat.
/// A send failure is logged and the loop keeps retrying on schedule.
/// Cancellation is a task abort, observed at the send and sleep await
/// points.
async fn repeat_loop(
    transport: Arc<dyn ChatTransport>,
    channel_id: u64,
    item: String,
    interval: Duration,
) {
    loop {
        if let Err(e) = transport.send(channel_id, &item).await {
            warn!(
                "Macro send failed for channel {}: {}; retrying next tick",
                channel_id, e
            );
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn manager_with_mock() -> (Arc<MockTransport>, MacroManager) {
        let transport = Arc::new(MockTransport::new());
        let manager = MacroManager::new(transport.clone());
        (transport, manager)
    }

    #[tokio::test]
    async fn test_start_records_metadata() {
        let (_transport, manager) = manager_with_mock();

        manager
            .start(10, "banana", "2s", Duration::from_secs(2))
            .await;

        let statuses = manager.list().await;
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].channel_id, 10);
        assert_eq!(statuses[0].item, "banana");
        assert_eq!(statuses[0].interval_raw, "2s");
    }

    #[tokio::test]
    async fn test_replace_keeps_one_task_per_channel() {
        let (_transport, manager) = manager_with_mock();

        manager
            .start(10, "banana", "2s", Duration::from_secs(2))
            .await;
        manager.start(10, "apple", "1m", Duration::from_secs(60)).await;

        let statuses = manager.list().await;
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].item, "apple");
        assert_eq!(statuses[0].interval_raw, "1m");
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (_transport, manager) = manager_with_mock();

        manager
            .start(10, "banana", "2s", Duration::from_secs(2))
            .await;

        assert!(manager.stop(10).await);
        assert!(!manager.stop(10).await);
        assert!(manager.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_all_reports_count() {
        let (_transport, manager) = manager_with_mock();

        manager.start(10, "a", "2s", Duration::from_secs(2)).await;
        manager.start(20, "b", "2s", Duration::from_secs(2)).await;

        assert_eq!(manager.stop_all().await, 2);
        assert_eq!(manager.stop_all().await, 0);
        assert!(manager.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_snapshot_is_detached() {
        let (_transport, manager) = manager_with_mock();

        manager.start(10, "a", "2s", Duration::from_secs(2)).await;
        let snapshot = manager.list().await;

        manager.start(20, "b", "1m", Duration::from_secs(60)).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(manager.list().await.len(), 2);
    }
}
