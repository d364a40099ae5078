//! Driven port for push notification delivery.
//!
//! Delivery is best effort. Callers log failures and carry on; a failed push
//! never rolls back the state change that triggered it.

use async_trait::async_trait;

use crate::domain::Notification;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while delivering a notification.
    pub enum NotificationSenderError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "notification transport failed: {message}",
        /// The push gateway answered with a non-success status.
        Rejected { status: u16, message: String } =>
            "push gateway rejected notification ({status}): {message}",
    }
}

/// Port for sending notifications to customers and mechanics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver one notification to its recipient.
    async fn send(&self, notification: &Notification) -> Result<(), NotificationSenderError>;
}

/// Fixture sender that accepts and discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationSender;

#[async_trait]
impl NotificationSender for FixtureNotificationSender {
    async fn send(&self, _notification: &Notification) -> Result<(), NotificationSenderError> {
        Ok(())
    }
}
