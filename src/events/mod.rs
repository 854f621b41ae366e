use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::notifications::{Notification, NotificationDispatcher};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Events emitted by the core after a transaction commits. Notification
/// dispatch hangs off these; nothing here runs inside a DB transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        wholesaler_id: Uuid,
        order_number: String,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),
    StockMovementRecorded {
        product_id: Uuid,
        movement_type: String,
        quantity: i64,
        stock_after: i64,
    },
    StockAlertRaised {
        alert_id: Uuid,
        product_id: Uuid,
        wholesaler_id: Uuid,
        alert_type: String,
        current_stock: i64,
        threshold: i64,
    },
    StockAlertResolved(Uuid),
}

impl Event {
    /// Maps an event to the outbound notification it should produce, if any.
    fn to_notification(&self) -> Option<Notification> {
        match self {
            Event::OrderCreated {
                order_id,
                wholesaler_id,
                order_number,
            } => Some(Notification {
                wholesaler_id: *wholesaler_id,
                subject: format!("New order {}", order_number),
                body: format!("Order {} ({}) was placed", order_number, order_id),
                occurred_at: Utc::now(),
            }),
            Event::StockAlertRaised {
                product_id,
                wholesaler_id,
                alert_type,
                current_stock,
                threshold,
                ..
            } => Some(Notification {
                wholesaler_id: *wholesaler_id,
                subject: format!("Stock alert: {}", alert_type),
                body: format!(
                    "Product {} is at {} (threshold {})",
                    product_id, current_stock, threshold
                ),
                occurred_at: Utc::now(),
            }),
            _ => None,
        }
    }
}

/// Consumes events from the channel and forwards notification-worthy ones to
/// the configured dispatchers. Dispatch failures are logged, never retried
/// here: dispatchers are idempotent/retryable by contract.
pub async fn process_events(
    mut receiver: mpsc::Receiver<Event>,
    dispatchers: Vec<Arc<dyn NotificationDispatcher>>,
) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "Processing event");

        if let Some(notification) = event.to_notification() {
            let sends = dispatchers
                .iter()
                .map(|d| d.dispatch(notification.clone()))
                .collect::<Vec<_>>();
            for result in join_all(sends).await {
                if let Err(e) = result {
                    warn!(error = %e, "Notification dispatch failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::MockNotificationDispatcher;

    #[tokio::test]
    async fn order_created_events_reach_the_dispatcher() {
        let mut mock = MockNotificationDispatcher::new();
        mock.expect_dispatch()
            .withf(|n| n.subject.contains("SF-004"))
            .times(1)
            .returning(|_| Ok(()));

        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let dispatchers: Vec<Arc<dyn NotificationDispatcher>> = vec![Arc::new(mock)];
        let worker = tokio::spawn(process_events(rx, dispatchers));

        sender
            .send(Event::OrderCreated {
                order_id: Uuid::new_v4(),
                wholesaler_id: Uuid::new_v4(),
                order_number: "SF-004".to_string(),
            })
            .await
            .expect("send");

        drop(sender);
        worker.await.expect("event loop exits cleanly");
    }

    #[tokio::test]
    async fn status_changes_produce_no_notification() {
        let mut mock = MockNotificationDispatcher::new();
        mock.expect_dispatch().times(0);

        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let dispatchers: Vec<Arc<dyn NotificationDispatcher>> = vec![Arc::new(mock)];
        let worker = tokio::spawn(process_events(rx, dispatchers));

        sender
            .send(Event::OrderStatusChanged {
                order_id: Uuid::new_v4(),
                old_status: "pending".to_string(),
                new_status: "confirmed".to_string(),
            })
            .await
            .expect("send");

        drop(sender);
        worker.await.expect("event loop exits cleanly");
    }
}
