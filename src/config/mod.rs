use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time to wait for the native host before failing a request.
/// Signing waits on a user approval sheet, so this is generous.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

pub const DEFAULT_WALLET_NAME: &str = "Unruggable";

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name announced to pages through the wallet standard
    pub wallet_name: String,
    /// Icon data URI; the built-in icon is used when unset
    pub wallet_icon: Option<String>,
    /// Host request timeout in milliseconds (`None` waits forever)
    pub request_timeout_ms: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            wallet_name: DEFAULT_WALLET_NAME.to_string(),
            wallet_icon: None,
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl BridgeConfig {
    /// Load bridge configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            wallet_name: std::env::var("BRIDGE_WALLET_NAME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.wallet_name),
            wallet_icon: std::env::var("BRIDGE_WALLET_ICON").ok(),
            request_timeout_ms: match std::env::var("BRIDGE_REQUEST_TIMEOUT_MS") {
                Ok(v) => match v.trim().parse::<u64>() {
                    Ok(0) => None,
                    Ok(ms) => Some(ms),
                    Err(_) => {
                        log::warn!("Ignoring invalid BRIDGE_REQUEST_TIMEOUT_MS={:?}", v);
                        defaults.request_timeout_ms
                    }
                },
                Err(_) => defaults.request_timeout_ms,
            },
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(|d| d.as_millis() as u64);
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
