//! Notification sender adapters.
//!
//! - [`LoggingNotificationSender`] records each notification as a structured
//!   log line; used when no push gateway is configured.
//! - [`HttpPushGateway`] posts notifications as JSON to a push relay.

mod logging;
mod push_gateway;

pub use logging::LoggingNotificationSender;
pub use push_gateway::HttpPushGateway;
