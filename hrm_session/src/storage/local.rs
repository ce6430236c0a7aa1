use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Same-origin string key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str);

    fn remove_item(&self, key: &str);

    /// Remove every key in the namespace, including data the guard does not own.
    fn clear(&self);
}

/// Identity of one browser tab (or window) within an origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Storage mutation broadcast to the other tabs of the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub source: TabId,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Origin-wide storage shared by every tab.
///
/// Tabs access it through [`LocalStorage::tab`]. Each mutation is broadcast
/// to the origin; a tab never receives the events it caused itself.
pub struct LocalStorage {
    entries: Mutex<BTreeMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl LocalStorage {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            entries: Mutex::new(BTreeMap::new()),
            events,
        })
    }

    /// Handle for a single tab of this origin
    pub fn tab(self: &Arc<Self>, tab: TabId) -> TabStorage {
        TabStorage {
            origin: Arc::clone(self),
            tab,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    fn publish(&self, event: StorageEvent) {
        // No subscribers simply means no other tab is listening
        if self.events.send(event).is_err() {
            tracing::trace!("Storage event dropped, no listening tabs");
        }
    }
}

/// One tab's view of [`LocalStorage`]
#[derive(Clone)]
pub struct TabStorage {
    origin: Arc<LocalStorage>,
    tab: TabId,
}

impl TabStorage {
    pub fn tab_id(&self) -> TabId {
        self.tab
    }

    /// Subscribe to mutations made by the other tabs of the origin
    pub fn subscribe(&self) -> TabStorageEvents {
        TabStorageEvents {
            receiver: self.origin.events.subscribe(),
            tab: self.tab,
        }
    }

    fn event(&self, key: &str, old_value: Option<String>, new_value: Option<String>) -> StorageEvent {
        StorageEvent {
            key: Some(key.to_string()),
            old_value,
            new_value,
            source: self.tab,
        }
    }
}

impl KeyValueStore for TabStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.origin.entries).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        let old_value = lock(&self.origin.entries).insert(key.to_string(), value.to_string());
        if old_value.as_deref() != Some(value) {
            self.origin
                .publish(self.event(key, old_value, Some(value.to_string())));
        }
    }

    fn remove_item(&self, key: &str) {
        let old_value = lock(&self.origin.entries).remove(key);
        if old_value.is_some() {
            self.origin.publish(self.event(key, old_value, None));
        }
    }

    fn clear(&self) {
        let removed = std::mem::take(&mut *lock(&self.origin.entries));
        // One removal event per key so that listeners watching a single key
        // see the clear as well
        for (key, old_value) in removed {
            self.origin.publish(self.event(&key, Some(old_value), None));
        }
    }
}

/// Storage events of other tabs, as seen from one tab
pub struct TabStorageEvents {
    receiver: broadcast::Receiver<StorageEvent>,
    tab: TabId,
}

impl TabStorageEvents {
    /// Next foreign event, or `None` once the origin is gone
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.source == self.tab => continue,
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Tab {} missed {} storage events", self.tab, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Storage for contexts where no key/value store exists (server rendering).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStorage;

impl KeyValueStore for NoStorage {
    fn get_item(&self, _key: &str) -> Option<String> {
        None
    }

    fn set_item(&self, _key: &str, _value: &str) {}

    fn remove_item(&self, _key: &str) {}

    fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_share_origin_entries() {
        let origin = LocalStorage::new();
        let first = origin.tab(TabId::new());
        let second = origin.tab(TabId::new());

        first.set_item("lastActivity", "30000");

        assert_eq!(second.get_item("lastActivity").as_deref(), Some("30000"));
        assert_eq!(origin.len(), 1);
    }

    #[test]
    fn test_clear_removes_unrelated_data() {
        let origin = LocalStorage::new();
        let tab = origin.tab(TabId::new());
        tab.set_item("isLoggedIn", "true");
        tab.set_item("employeeDirectory", r#"[{"id":1,"name":"Ana"}]"#);

        tab.clear();

        assert!(origin.is_empty());
        assert_eq!(tab.get_item("employeeDirectory"), None);
    }

    #[tokio::test]
    async fn test_events_reach_other_tabs_only() {
        // Given two tabs of the same origin, both listening
        let origin = LocalStorage::new();
        let writer = origin.tab(TabId::new());
        let reader = origin.tab(TabId::new());
        let mut writer_events = writer.subscribe();
        let mut reader_events = reader.subscribe();

        // When the writer updates a key and the reader updates another one
        writer.set_item("isLoggedIn", "false");
        reader.set_item("lastActivity", "1");

        // Then the reader sees only the writer's change
        let event = reader_events.recv().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("isLoggedIn"));
        assert_eq!(event.new_value.as_deref(), Some("false"));
        assert_eq!(event.source, writer.tab_id());

        // And the writer sees only the reader's change
        let event = writer_events.recv().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("lastActivity"));
    }

    #[tokio::test]
    async fn test_clear_emits_removal_per_key() {
        let origin = LocalStorage::new();
        let writer = origin.tab(TabId::new());
        let mut events = origin.tab(TabId::new()).subscribe();
        writer.set_item("isLoggedIn", "true");
        writer.set_item("lastActivity", "5");

        writer.clear();

        let mut removed = Vec::new();
        for _ in 0..4 {
            let event = events.recv().await.unwrap();
            if event.new_value.is_none() {
                removed.push(event.key.unwrap());
            }
        }
        assert_eq!(removed, vec!["isLoggedIn".to_string(), "lastActivity".to_string()]);
    }

    #[tokio::test]
    async fn test_unchanged_value_is_not_broadcast() {
        let origin = LocalStorage::new();
        let writer = origin.tab(TabId::new());
        let mut events = origin.tab(TabId::new()).subscribe();

        writer.set_item("isLoggedIn", "true");
        writer.set_item("isLoggedIn", "true");
        writer.set_item("isLoggedIn", "false");

        let first = events.recv().await.unwrap();
        let second = events.recv().await.unwrap();
        assert_eq!(first.new_value.as_deref(), Some("true"));
        assert_eq!(second.old_value.as_deref(), Some("true"));
        assert_eq!(second.new_value.as_deref(), Some("false"));
    }

    #[test]
    fn test_storage_event_serialization() {
        let event = StorageEvent {
            key: Some("isLoggedIn".to_string()),
            old_value: Some("true".to_string()),
            new_value: None,
            source: TabId::new(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let decoded: StorageEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, event);
    }

    #[test]
    fn test_no_storage_is_neutral() {
        let storage = NoStorage;
        storage.set_item("isLoggedIn", "true");

        assert_eq!(storage.get_item("isLoggedIn"), None);
    }
}
