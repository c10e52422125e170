use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{LiveError, Result};

/// Connection and presentation settings for a [`LiveClient`](crate::LiveClient).
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// STOMP-over-WebSocket endpoint.
    pub server_url: String,
    /// Base URL the fallback collection paths are resolved against.
    pub api_base_url: String,
    /// Value of the STOMP `host` header. Defaults to the server URL's host.
    pub host: Option<String>,
    pub login: Option<String>,
    pub passcode: Option<String>,
    /// Delay before a failed or dropped session is retried.
    pub reconnect_delay_ms: u64,
    /// Deadline for opening the socket and receiving `CONNECTED`.
    pub handshake_timeout_ms: u64,
    /// Upper bound on one fallback collection fetch.
    pub reload_timeout_ms: u64,
    /// How long the `stock-updated` highlight stays on a patched stock cell.
    pub highlight_ms: u64,
    /// How long a toast is shown before it starts fading.
    pub toast_ms: u64,
    /// Delay between the fade starting and the toast being removed.
    pub toast_fade_ms: u64,
    /// Id of the element that hosts toasts.
    pub toast_container_id: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8080/ws-native".to_string(),
            api_base_url: "http://localhost:8080".to_string(),
            host: None,
            login: None,
            passcode: None,
            reconnect_delay_ms: 5000,
            handshake_timeout_ms: 10_000,
            reload_timeout_ms: 10_000,
            highlight_ms: 2000,
            toast_ms: 5000,
            toast_fade_ms: 500,
            toast_container_id: "notifications".to_string(),
        }
    }
}

impl LiveConfig {
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn with_credentials(
        mut self,
        login: impl Into<String>,
        passcode: impl Into<String>,
    ) -> Self {
        self.login = Some(login.into());
        self.passcode = Some(passcode.into());
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_reload_timeout(mut self, timeout: Duration) -> Self {
        self.reload_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_toast_container_id(mut self, id: impl Into<String>) -> Self {
        self.toast_container_id = id.into();
        self
    }

    /// Read a JSON config file and validate it.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: LiveConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        log::info!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let server = Url::parse(&self.server_url)?;
        if !matches!(server.scheme(), "ws" | "wss") {
            return Err(LiveError::Config(format!(
                "server_url must use ws or wss, got {}",
                server.scheme()
            )));
        }

        let api = self.api_base()?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(LiveError::Config(format!(
                "api_base_url must use http or https, got {}",
                api.scheme()
            )));
        }

        if self.toast_container_id.is_empty() {
            return Err(LiveError::Config("toast_container_id is empty".to_string()));
        }
        Ok(())
    }

    pub fn api_base(&self) -> Result<Url> {
        Ok(Url::parse(&self.api_base_url)?)
    }

    /// The STOMP `host` header: explicit value, else the server URL's host.
    pub fn stomp_host(&self) -> String {
        self.host.clone().unwrap_or_else(|| {
            Url::parse(&self.server_url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| "localhost".to_string())
        })
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn reload_timeout(&self) -> Duration {
        Duration::from_millis(self.reload_timeout_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn toast_fade(&self) -> Duration {
        Duration::from_millis(self.toast_fade_ms)
    }
}
