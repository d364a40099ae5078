//! Runtime settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `MARKETPLACE_*` environment variables over an
//! optional configuration file. Every field is optional; accessors apply the
//! defaults.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use marketplace::domain::{DEFAULT_FAN_OUT, DEFAULT_LIVE_WINDOW_MINUTES, DEFAULT_RADIUS_KM};
use marketplace::domain::{FeedPolicy, MatchingPolicy};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_FEED_REFRESH_SECS: u64 = 30;
const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 5;
const DEFAULT_ATTACHMENTS_BASE_URL: &str = "/attachments";

/// Settings rejected before the server starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("{field} is not a valid URL: {message}")]
    InvalidUrl { field: &'static str, message: String },
}

/// Marketplace server settings.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKETPLACE")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Minutes an unscheduled request stays in the live feed.
    pub live_window_minutes: Option<i64>,
    /// Matching radius around the customer, in kilometres.
    pub radius_km: Option<f64>,
    /// Maximum mechanics considered per request.
    pub fan_out: Option<usize>,
    /// Periodically mark stale live requests as expired.
    #[ortho_config(default = false)]
    pub expiry_sweep_enabled: bool,
    pub expiry_sweep_interval_secs: Option<u64>,
    /// Push relay endpoint; notifications are only logged when absent.
    pub push_gateway_url: Option<String>,
    pub push_gateway_api_key: Option<String>,
    /// Google Directions key; straight-line estimates are used when absent.
    pub directions_api_key: Option<String>,
    /// Timeout for calls to the push relay and directions API.
    pub outbound_timeout_secs: Option<u64>,
    /// Directory receiving uploaded photos and voice notes.
    pub attachments_dir: Option<PathBuf>,
    /// URL prefix under which stored attachments are served.
    pub attachments_base_url: Option<String>,
    /// Comma-separated origins allowed to open the feed socket.
    pub ws_allowed_origins: Option<String>,
    /// Seconds between unsolicited feed snapshots.
    pub ws_refresh_secs: Option<u64>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::UNSPECIFIED,
            DEFAULT_PORT,
        )))
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn feed_policy(&self) -> FeedPolicy {
        FeedPolicy {
            live_window: chrono::Duration::minutes(
                self.live_window_minutes
                    .unwrap_or(DEFAULT_LIVE_WINDOW_MINUTES),
            ),
        }
    }

    pub fn matching_policy(&self) -> MatchingPolicy {
        MatchingPolicy {
            radius_km: self.radius_km.unwrap_or(DEFAULT_RADIUS_KM),
            fan_out: self.fan_out.unwrap_or(DEFAULT_FAN_OUT),
        }
    }

    /// Sweep period, or `None` when the sweeper is disabled.
    pub fn expiry_sweep_interval(&self) -> Option<Duration> {
        self.expiry_sweep_enabled.then(|| {
            Duration::from_secs(
                self.expiry_sweep_interval_secs
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            )
        })
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(
            self.outbound_timeout_secs
                .unwrap_or(DEFAULT_OUTBOUND_TIMEOUT_SECS),
        )
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.attachments_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("marketplace-attachments"))
    }

    pub fn attachments_base_url(&self) -> &str {
        self.attachments_base_url
            .as_deref()
            .unwrap_or(DEFAULT_ATTACHMENTS_BASE_URL)
    }

    /// Allowed WebSocket origins; empty means local development only.
    pub fn ws_allowed_origins(&self) -> Vec<String> {
        self.ws_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn ws_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.ws_refresh_secs.unwrap_or(DEFAULT_FEED_REFRESH_SECS))
    }

    /// Reject values that would make the service misbehave.
    ///
    /// # Errors
    ///
    /// Returns the first offending setting.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.live_window_minutes.is_some_and(|minutes| minutes <= 0) {
            return Err(SettingsError::NotPositive {
                field: "live_window_minutes",
            });
        }
        if self
            .radius_km
            .is_some_and(|radius| radius.is_nan() || radius <= 0.0)
        {
            return Err(SettingsError::NotPositive { field: "radius_km" });
        }
        let zero_fields = [
            ("fan_out", self.fan_out.map(|value| u64::try_from(value).unwrap_or(u64::MAX))),
            ("expiry_sweep_interval_secs", self.expiry_sweep_interval_secs),
            ("outbound_timeout_secs", self.outbound_timeout_secs),
            ("ws_refresh_secs", self.ws_refresh_secs),
            ("db_max_connections", self.db_max_connections.map(u64::from)),
        ];
        if let Some((field, _)) = zero_fields
            .into_iter()
            .find(|(_, value)| *value == Some(0))
        {
            return Err(SettingsError::NotPositive { field });
        }
        if let Some(raw) = self.push_gateway_url.as_deref() {
            url::Url::parse(raw).map_err(|err| SettingsError::InvalidUrl {
                field: "push_gateway_url",
                message: err.to_string(),
            })?;
        }
        Ok(())
    }
}
