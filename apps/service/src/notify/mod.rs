/// Status change notifications
///
/// Components that need to react when a site flips between available and
/// unavailable subscribe to the bus. Delivery is best-effort: a subscriber
/// that errors is logged and skipped, never retried.

pub mod log;
pub mod users;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::monitoring::types::SiteStatus;

/// A status transition for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub url: String,
    pub status: SiteStatus,
}

/// Receiver of status change notifications
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Name used in delivery failure logs
    fn name(&self) -> &str;

    /// Handle one status change
    async fn notify(&self, change: &StatusChange) -> Result<()>;
}

/// Fan-out point for status changes
pub struct NotificationBus {
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self { subscribers: RwLock::new(Vec::new()) }
    }

    /// Register a subscriber
    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.write().await.push(subscriber);
    }

    /// Remove a previously registered subscriber
    pub async fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber>) {
        self.subscribers
            .write()
            .await
            .retain(|s| !Arc::ptr_eq(s, subscriber));
    }

    /// Deliver a status change to every subscriber in registration order
    pub async fn publish(&self, change: &StatusChange) {
        // Snapshot so a subscriber can unsubscribe itself mid-delivery
        let subscribers = self.subscribers.read().await.clone();

        debug!(
            "Publishing {} for {} to {} subscribers",
            change.status,
            change.url,
            subscribers.len()
        );

        for subscriber in subscribers {
            if let Err(e) = subscriber.notify(change).await {
                warn!("Subscriber {} failed to handle {}: {}", subscriber.name(), change.url, e);
            }
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        received: Mutex<Vec<StatusChange>>,
    }

    impl Recording {
        fn new() -> Self {
            Self { received: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Subscriber for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, change: &StatusChange) -> Result<()> {
            self.received.lock().unwrap().push(change.clone());
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Subscriber for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }

        async fn notify(&self, _change: &StatusChange) -> Result<()> {
            Err(anyhow::anyhow!("delivery rejected"))
        }
    }

    fn change(url: &str, status: SiteStatus) -> StatusChange {
        StatusChange { url: url.to_string(), status }
    }

    #[tokio::test]
    async fn failing_subscriber_does_not_block_the_rest() {
        let bus = NotificationBus::new();
        let recording = Arc::new(Recording::new());

        bus.subscribe(Arc::new(AlwaysFails)).await;
        bus.subscribe(recording.clone()).await;

        bus.publish(&change("https://example.com", SiteStatus::Unavailable)).await;

        let received = recording.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].status, SiteStatus::Unavailable);
    }

    #[tokio::test]
    async fn unsubscribed_subscriber_stops_receiving() {
        let bus = NotificationBus::new();
        let recording = Arc::new(Recording::new());
        let as_subscriber: Arc<dyn Subscriber> = recording.clone();

        bus.subscribe(as_subscriber.clone()).await;
        bus.publish(&change("https://example.com", SiteStatus::Unavailable)).await;

        bus.unsubscribe(&as_subscriber).await;
        bus.publish(&change("https://example.com", SiteStatus::Available)).await;

        assert_eq!(recording.received.lock().unwrap().len(), 1);
    }
}
