// Wire types and endpoint layout of the rewards API.

use crate::models::Settings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    api_base_url: String,
    app_base_url: String,
}

impl ApiEndpoints {
    pub fn new(api_base_url: impl Into<String>, app_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_base_url, &settings.app_base_url)
    }

    pub fn origin(&self) -> &str {
        &self.app_base_url
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/get_token", self.api_base_url)
    }

    pub fn report_uptime_url(&self) -> String {
        format!("{}/api/report_uptime", self.app_base_url)
    }

    pub fn dashboard_url(&self) -> String {
        format!("{}/dashboard", self.app_base_url)
    }

    pub fn referer(&self, path: &str) -> String {
        format!("{}{}", self.app_base_url, path)
    }
}

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportQuery<'a> {
    pub email: &'a str,
    pub api_token: &'a str,
    pub ip: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub status_code: Option<u16>,
}

impl ReportResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == Some(200)
    }
}
