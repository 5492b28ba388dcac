//! Usage: Publish/subscribe registry for settings invalidations, keyed by resource key.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::shared::mutex_ext::MutexExt;
use crate::shared::time;

/// Buffered events per key. Late subscribers that lag past this see a
/// `Lagged` recv error and should simply refetch.
const CHANNEL_CAPACITY: usize = 16;

/// Broadcast after every successful save: observers of the same resource key
/// must refetch before showing data again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invalidation {
    pub key: String,
    pub revision: u64,
    pub at_ms: u64,
}

/// One sender per resource key, created lazily. Receivers with no live
/// sender activity simply stay pending, so subscribing before the first
/// publish is fine.
#[derive(Default)]
pub struct InvalidationHub {
    channels: Mutex<HashMap<String, broadcast::Sender<Invalidation>>>,
}

impl InvalidationHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, key: &str) -> broadcast::Sender<Invalidation> {
        let mut channels = self.channels.lock_or_recover();
        channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    pub fn subscribe(&self, key: &str) -> broadcast::Receiver<Invalidation> {
        self.sender(key).subscribe()
    }

    /// Fire-and-forget: a publish with no current subscribers is not an
    /// error, it just means no other view is open on this resource.
    pub fn publish(&self, key: &str, revision: u64) -> usize {
        let event = Invalidation {
            key: key.to_string(),
            revision,
            at_ms: time::unix_ms(),
        };
        let delivered = self.sender(key).send(event).unwrap_or(0);
        tracing::debug!(key, revision, delivered, "settings invalidation published");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_publish_for_its_key() {
        let hub = InvalidationHub::new();
        let mut rx = hub.subscribe("security");

        assert_eq!(hub.publish("security", 3), 1);

        let event = rx.recv().await.expect("recv");
        assert_eq!(event.key, "security");
        assert_eq!(event.revision, 3);
        assert!(event.at_ms > 0);
    }

    #[tokio::test]
    async fn publish_does_not_cross_keys() {
        let hub = InvalidationHub::new();
        let mut security_rx = hub.subscribe("security");
        let _connection_rx = hub.subscribe("connection");

        hub.publish("connection", 1);

        assert!(matches!(
            security_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let hub = InvalidationHub::new();
        assert_eq!(hub.publish("email", 1), 0);
    }

    #[tokio::test]
    async fn every_subscriber_of_a_key_is_notified() {
        let hub = InvalidationHub::new();
        let mut a = hub.subscribe("system");
        let mut b = hub.subscribe("system");

        assert_eq!(hub.publish("system", 7), 2);
        assert_eq!(a.recv().await.expect("a").revision, 7);
        assert_eq!(b.recv().await.expect("b").revision, 7);
    }
}
