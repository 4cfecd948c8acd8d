use crate::models::AppConfig;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
    pub actual_value: Option<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actual_value {
            Some(val) => write!(f, "  • {}: {} (got: {})", self.field, self.message, val),
            None => write!(f, "  • {}: {}", self.field, self.message),
        }
    }
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual_value: None,
        }
    }

    fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual_value: Some(value.to_string()),
        }
    }
}

pub fn validate_app_config(config: &AppConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.credentials.email.trim().is_empty() {
        errors.push(ConfigError::new("user.email", "must not be empty"));
    }
    if config.credentials.password.is_empty() {
        errors.push(ConfigError::new("user.password", "must not be empty"));
    }
    if config.main_ip.trim().is_empty() {
        errors.push(ConfigError::new("proxy.main_ip", "must not be empty"));
    }
    validate_proxy_addresses(&config.proxy_addresses, &mut errors);

    let settings = &config.settings;
    if settings.polling_interval_ms == 0 {
        errors.push(ConfigError::with_value(
            "settings.polling_interval_ms",
            "must be greater than 0",
            settings.polling_interval_ms,
        ));
    }
    if settings.failure_cooldown_ms == 0 {
        errors.push(ConfigError::with_value(
            "settings.failure_cooldown_ms",
            "must be greater than 0",
            settings.failure_cooldown_ms,
        ));
    }
    if settings.max_consecutive_failures == 0 {
        errors.push(ConfigError::with_value(
            "settings.max_consecutive_failures",
            "must be greater than 0",
            settings.max_consecutive_failures,
        ));
    }
    if settings.request_timeout_secs == 0 {
        errors.push(ConfigError::with_value(
            "settings.request_timeout_secs",
            "must be greater than 0",
            settings.request_timeout_secs,
        ));
    } else if settings.request_timeout_secs > 600 {
        errors.push(ConfigError::with_value(
            "settings.request_timeout_secs",
            "should not exceed 600 seconds (10 minutes)",
            settings.request_timeout_secs,
        ));
    }
    if settings.notify_queue_capacity == 0 {
        errors.push(ConfigError::with_value(
            "settings.notify_queue_capacity",
            "must be greater than 0",
            settings.notify_queue_capacity,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_proxy_addresses(addresses: &[String], errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();
    for (index, raw) in addresses.iter().enumerate() {
        let address = raw.trim();
        let field = format!("proxy.addresses[{}]", index);

        let host_port = address
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(address);
        let host_port = host_port
            .rsplit_once('@')
            .map(|(_, rest)| rest)
            .unwrap_or(host_port);

        match host_port.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                if port.parse::<u16>().map_or(true, |p| p == 0) {
                    errors.push(ConfigError::with_value(
                        field.clone(),
                        "port must be between 1 and 65535",
                        port,
                    ));
                }
            }
            _ => errors.push(ConfigError::with_value(
                field.clone(),
                "must be in host:port form",
                address,
            )),
        }

        if !seen.insert(address) {
            errors.push(ConfigError::with_value(field, "duplicate proxy address", address));
        }
    }
}
