use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Outbound message produced after a committed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub wholesaler_id: Uuid,
    pub subject: String,
    pub body: String,
    pub occurred_at: DateTime<Utc>,
}

/// Narrow seam to the external SMS/WhatsApp/email dispatcher. Implementations
/// are expected to be independently idempotent and retryable; the core never
/// awaits them inside a database transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> Result<(), ServiceError>;
}

/// Default dispatcher that only records the notification in the log stream.
/// Real channels are wired in deployment-specific binaries.
#[derive(Debug, Default, Clone)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notification: Notification) -> Result<(), ServiceError> {
        info!(
            wholesaler_id = %notification.wholesaler_id,
            subject = %notification.subject,
            "notification dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_dispatcher_accepts_notifications() {
        let dispatcher = LogDispatcher;
        let result = dispatcher
            .dispatch(Notification {
                wholesaler_id: Uuid::new_v4(),
                subject: "New order SF-004".into(),
                body: "Order SF-004 was placed".into(),
                occurred_at: Utc::now(),
            })
            .await;
        assert!(result.is_ok());
    }
}
