//! Outbound notification dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::AlertNotice;
use crate::EngineError;

use super::ReconcileOutcome;

/// Transport collaborator that accepts published alert notices.
#[async_trait]
pub trait NoticePublisher: Send + Sync {
    /// Publisher name, used in failure logs.
    fn name(&self) -> &str;

    /// Publish one notice to a condition channel (`alerts/...`).
    async fn publish(&self, channel: &str, notice: &AlertNotice) -> Result<(), EngineError>;
}

/// Emergency voice/SMS collaborator. Fire-and-forget.
#[async_trait]
pub trait EmergencyDialer: Send + Sync {
    /// Trigger the external emergency call to the given number.
    async fn notify(&self, phone: &str) -> Result<(), EngineError>;
}

/// Fires notices and the emergency call for a reconciliation outcome.
///
/// Dispatch is best-effort and runs strictly after the alert has been
/// persisted: a publish or dial failure is logged and neither retried here
/// nor allowed to roll back the stored alert.
pub struct NotificationDispatcher {
    publisher: Arc<dyn NoticePublisher>,
    dialer: Arc<dyn EmergencyDialer>,
    emergency_contact: String,
}

impl NotificationDispatcher {
    /// Create a dispatcher over the transport and dialer collaborators.
    pub fn new(
        publisher: Arc<dyn NoticePublisher>,
        dialer: Arc<dyn EmergencyDialer>,
        emergency_contact: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            dialer,
            emergency_contact: emergency_contact.into(),
        }
    }

    /// Publish one notice per newly-added condition; place the emergency
    /// call exactly once when the reconciliation opened the alert.
    pub async fn dispatch(&self, outcome: &ReconcileOutcome) {
        if outcome.newly_added.is_empty() {
            return;
        }

        let notice = outcome.alert.notice();

        for condition in &outcome.newly_added {
            let channel = condition.channel();
            if let Err(error) = self.publisher.publish(&channel, &notice).await {
                tracing::warn!(
                    device_code = %notice.device_code,
                    %channel,
                    publisher = self.publisher.name(),
                    %error,
                    "failed to publish alert notice"
                );
            } else {
                tracing::debug!(
                    device_code = %notice.device_code,
                    %channel,
                    "published alert notice"
                );
            }
        }

        if outcome.created {
            if let Err(error) = self.dialer.notify(&self.emergency_contact).await {
                tracing::warn!(
                    device_code = %notice.device_code,
                    %error,
                    "failed to trigger emergency call"
                );
            } else {
                tracing::info!(
                    device_code = %notice.device_code,
                    "triggered emergency call"
                );
            }
        }
    }
}

/// A notice together with the channel it was published to.
#[derive(Debug, Clone)]
pub struct PublishedNotice {
    /// Channel name derived from the condition kind.
    pub channel: String,
    /// The published notice.
    pub notice: AlertNotice,
}

/// In-process publisher backed by a tokio broadcast channel.
///
/// Stands in for the real message transport: downstream consumers subscribe
/// and receive every published notice. Sends to a channel with no subscribers
/// are not an error.
pub struct BroadcastPublisher {
    tx: broadcast::Sender<PublishedNotice>,
}

impl BroadcastPublisher {
    /// Create a publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Get a receiver for published notices.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedNotice> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl NoticePublisher for BroadcastPublisher {
    fn name(&self) -> &str {
        "broadcast"
    }

    async fn publish(&self, channel: &str, notice: &AlertNotice) -> Result<(), EngineError> {
        // Ignore send errors (no subscribers)
        let _ = self.tx.send(PublishedNotice {
            channel: channel.to_string(),
            notice: notice.clone(),
        });
        Ok(())
    }
}

/// Dialer that only logs the call it would place.
pub struct LoggingDialer;

#[async_trait]
impl EmergencyDialer for LoggingDialer {
    async fn notify(&self, phone: &str) -> Result<(), EngineError> {
        // In production this invokes the external voice dispatch flow
        tracing::info!(phone, "would place emergency call");
        Ok(())
    }
}
