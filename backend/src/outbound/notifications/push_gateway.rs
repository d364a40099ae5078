//! Reqwest-backed push gateway adapter.
//!
//! The gateway owns device tokens and fan-out to mobile platforms; this side
//! only posts the notification payload and maps HTTP failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::domain::Notification;
use crate::domain::ports::{NotificationSender, NotificationSenderError};

/// Push gateway adapter that POSTs one JSON document per notification.
pub struct HttpPushGateway {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpPushGateway {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl NotificationSender for HttpPushGateway {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationSenderError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(notification);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(kind = %notification.kind, "push gateway accepted notification");
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}

fn map_transport_error(error: reqwest::Error) -> NotificationSenderError {
    NotificationSenderError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> NotificationSenderError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        preview
    };
    if status.is_client_error() {
        NotificationSenderError::rejected(status.as_u16(), message)
    } else {
        NotificationSenderError::transport(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
