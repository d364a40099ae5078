use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{NotificationSender, NotificationSenderError};
use crate::domain::{Notification, Recipient};

/// Sender that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotificationSender;

#[async_trait]
impl NotificationSender for LoggingNotificationSender {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationSenderError> {
        let (role, recipient_id) = match notification.recipient {
            Recipient::Customer(id) => ("customer", id.to_string()),
            Recipient::Mechanic(id) => ("mechanic", id.to_string()),
        };
        info!(
            kind = %notification.kind,
            role,
            recipient_id,
            title = notification.title.as_str(),
            "notification dispatched"
        );
        Ok(())
    }
}
