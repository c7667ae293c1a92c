//! Session bus — in-process change feed for the key-value store.
//!
//! DESIGN
//! ======
//! Every successful session write publishes a `StorageEvent` carrying the
//! full new record and the writing connection. Each websocket connection
//! subscribes once and filters by its own session key, so delivery has the
//! same shape as a browser storage event: whole record, other writers only.
//!
//! A lagging subscriber drops events; that is recoverable because the next
//! event still carries the whole record and receivers diff by length.

use tokio::sync::broadcast;
use uuid::Uuid;

/// One committed write to a session record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Namespaced storage key (`<prefix><code>`).
    pub key: String,
    /// Full JSON record after the write.
    pub new_value: String,
    /// Connection that performed the write. `None` for HTTP writers.
    pub origin: Option<Uuid>,
}

#[derive(Clone)]
pub struct SessionBus {
    tx: broadcast::Sender<StorageEvent>,
}

impl SessionBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns how many subscribers were live.
    pub fn publish(&self, event: StorageEvent) -> usize {
        // No subscribers is normal when no tab is connected.
        self.tx.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(key: &str) -> StorageEvent {
        StorageEvent { key: key.into(), new_value: "{}".into(), origin: None }
    }

    #[test]
    fn publish_without_subscribers_reports_zero() {
        let bus = SessionBus::new(4);
        assert_eq!(bus.publish(event("k")), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = SessionBus::new(4);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.publish(event("k1")), 2);

        assert_eq!(a.recv().await.unwrap().key, "k1");
        assert_eq!(b.recv().await.unwrap().key, "k1");
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = SessionBus::new(4);
        let _early = bus.subscribe();
        bus.publish(event("before"));

        let mut late = bus.subscribe();
        bus.publish(event("after"));
        assert_eq!(late.recv().await.unwrap().key, "after");
    }
}
