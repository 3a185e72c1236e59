use std::time::Duration;

use url::Url;

use crate::error::ClientError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_DISPLAY_NAME: &str = "Guest";

const HEALTH_PATH: &str = "/healthz";
const USERS_PATH: &str = "/api/users";
const REALTIME_PATH: &str = "/ws";

/// Settings supplied by the host application.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: String,
    pub poll_interval: Duration,
    /// Capacity of the loop's input queue and of the event broadcast.
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            event_buffer: 1024,
        }
    }
}

/// A validated backend base URL and the endpoints derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrl {
    http_base: String,
    realtime: Url,
}

impl BackendUrl {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let trimmed = raw.trim().trim_end_matches('/');
        let http_base = if trimmed.is_empty() {
            DEFAULT_BACKEND_URL.to_string()
        } else {
            trimmed.to_string()
        };

        let ws_base = if let Some(rest) = http_base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = http_base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(ClientError::UnsupportedScheme(http_base));
        };

        let realtime = Url::parse(&format!("{ws_base}{REALTIME_PATH}")).map_err(|err| {
            ClientError::InvalidBackendUrl {
                url: http_base.clone(),
                reason: err.to_string(),
            }
        })?;

        Ok(Self {
            http_base,
            realtime,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.http_base
    }

    pub fn health_url(&self) -> String {
        format!("{}{HEALTH_PATH}", self.http_base)
    }

    pub fn users_url(&self) -> String {
        format!("{}{USERS_PATH}", self.http_base)
    }

    /// Realtime endpoint with the display name as the `username` query parameter.
    pub fn realtime_url(&self, display_name: &str) -> String {
        let mut url = self.realtime.clone();
        url.query_pairs_mut().append_pair("username", display_name);
        url.to_string()
    }
}

/// Trims the requested name; an empty name falls back to [`DEFAULT_DISPLAY_NAME`].
pub fn normalize_display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_DISPLAY_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
