use super::identity::Credentials;
use crate::constants;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TelegramTarget {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramTarget {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

/// Tunables persisted in `settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
    #[serde(default = "default_telegram_api_base_url")]
    pub telegram_api_base_url: String,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    #[serde(default = "default_failure_cooldown_ms")]
    pub failure_cooldown_ms: u64,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_notify_queue_capacity")]
    pub notify_queue_capacity: usize,
}

fn default_api_base_url() -> String {
    constants::DEFAULT_API_BASE_URL.to_string()
}

fn default_app_base_url() -> String {
    constants::DEFAULT_APP_BASE_URL.to_string()
}

fn default_telegram_api_base_url() -> String {
    constants::DEFAULT_TELEGRAM_API_BASE_URL.to_string()
}

fn default_polling_interval_ms() -> u64 {
    constants::DEFAULT_POLLING_INTERVAL_MS
}

fn default_failure_cooldown_ms() -> u64 {
    constants::DEFAULT_FAILURE_COOLDOWN_MS
}

fn default_max_consecutive_failures() -> u32 {
    constants::DEFAULT_MAX_CONSECUTIVE_FAILURES
}

fn default_request_timeout_secs() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_notify_queue_capacity() -> usize {
    constants::DEFAULT_NOTIFY_QUEUE_CAPACITY
}

impl Settings {
    pub fn new() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            app_base_url: default_app_base_url(),
            telegram_api_base_url: default_telegram_api_base_url(),
            polling_interval_ms: default_polling_interval_ms(),
            failure_cooldown_ms: default_failure_cooldown_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            request_timeout_secs: default_request_timeout_secs(),
            notify_queue_capacity: default_notify_queue_capacity(),
        }
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_millis(self.failure_cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Fully resolved configuration handed to the fleet.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub main_ip: String,
    pub proxy_addresses: Vec<String>,
    pub credentials: Credentials,
    pub telegram: TelegramTarget,
    pub cookies: String,
    pub settings: Settings,
}

impl AppConfig {
    pub fn identity_count(&self) -> usize {
        1 + self.proxy_addresses.len()
    }
}
