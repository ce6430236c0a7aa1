use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{FLAG_KEY, TRUE_SENTINEL};
use crate::storage::{StorageEvent, TabStorageEvents};

use super::monitor::{ActivityMonitor, GuardState, Trigger};

/// True when `event` reports the session flag changed to anything but `"true"`
pub fn signals_logout(event: &StorageEvent) -> bool {
    event.key.as_deref() == Some(FLAG_KEY) && event.new_value.as_deref() != Some(TRUE_SENTINEL)
}

/// Forwards logout signals from other tabs to a mounted page's monitor
pub struct CrossTabNotifier {
    events: TabStorageEvents,
}

impl CrossTabNotifier {
    pub fn new(events: TabStorageEvents) -> Self {
        Self { events }
    }

    /// Listen until the monitor logs out, the origin goes away or the task is aborted
    pub fn spawn(mut self, monitor: Arc<ActivityMonitor>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = self.events.recv().await {
                if !signals_logout(&event) {
                    continue;
                }
                tracing::debug!(
                    "Tab {} signalled logout while {} is mounted",
                    event.source,
                    monitor.route()
                );
                if monitor.evaluate(&Trigger::Storage(event)) == GuardState::LoggedOut {
                    break;
                }
            }
        })
    }
}
