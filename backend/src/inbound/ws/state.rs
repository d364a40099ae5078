//! Shared WebSocket adapter state.
//!
//! The feed socket depends on the request query port only, so tests can
//! drive it with the in-memory store or a mock.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::domain::ports::ServiceRequestQuery;

/// Default period between unsolicited snapshot refreshes.
///
/// Live requests age out of the feed without any write happening, so the
/// socket re-reads on a timer as well as on change events.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Origins permitted to open a feed socket.
///
/// With no configured origins only `http://localhost:<port>` is accepted,
/// which keeps local development working.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    origins: Vec<url::Origin>,
}

impl OriginAllowList {
    /// Parse configured origins, skipping entries that are not URLs.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .filter_map(|raw| match Url::parse(raw.as_ref().trim()) {
                Ok(url) => Some(url.origin()),
                Err(error) => {
                    tracing::warn!(
                        origin = raw.as_ref(),
                        %error,
                        "ignoring malformed allowed origin"
                    );
                    None
                }
            })
            .collect();
        Self { origins }
    }

    pub fn allows(&self, origin: &Url) -> bool {
        if self.origins.is_empty() {
            return origin.scheme() == "http"
                && origin.host_str() == Some("localhost")
                && matches!(origin.port(), Some(port) if port != 0);
        }
        let candidate = origin.origin();
        self.origins.iter().any(|allowed| *allowed == candidate)
    }
}

/// Dependency bundle for the feed socket.
#[derive(Clone)]
pub struct WsState {
    pub requests_query: Arc<dyn ServiceRequestQuery>,
    pub allowed_origins: OriginAllowList,
    pub refresh_interval: Duration,
}

impl WsState {
    pub fn new(
        requests_query: Arc<dyn ServiceRequestQuery>,
        allowed_origins: OriginAllowList,
    ) -> Self {
        Self {
            requests_query,
            allowed_origins,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }
}
