use std::sync::Arc;

use reqwest::header::{ACCEPT, COOKIE, ORIGIN, REFERER, SET_COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{error, info, warn};

use super::api::{ApiEndpoints, ReportQuery, ReportResponse, TokenRequest, TokenResponse};
use super::retry::{RetryDecision, RetryPolicy};
use crate::constants::random_user_agent;
use crate::error::{AppError, AppResult};
use crate::models::{Credentials, DashboardSnapshot, EgressBinding, IdentityKey};
use crate::modules::notify::{format_stats_message, NotificationSink};

/// Result of one successful uptime report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub reported_ip: String,
    pub snapshot: Option<DashboardSnapshot>,
}

/// Authentication state and request plumbing for one (account, egress
/// binding) pair. Only the owning polling loop mutates it.
pub struct IdentitySession {
    key: IdentityKey,
    credentials: Arc<Credentials>,
    binding: EgressBinding,
    endpoints: ApiEndpoints,
    client: Client,
    api_token: Option<String>,
    cookies: String,
    retry: RetryPolicy,
    reports_dashboard: bool,
    sink: Option<NotificationSink>,
    login_attempts: u64,
}

impl IdentitySession {
    pub fn new(
        credentials: Arc<Credentials>,
        binding: EgressBinding,
        endpoints: ApiEndpoints,
        client: Client,
        cookies: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            key: IdentityKey::new(&credentials.email, &binding),
            credentials,
            binding,
            endpoints,
            client,
            api_token: None,
            cookies: cookies.into(),
            retry,
            reports_dashboard: false,
            sink: None,
            login_attempts: 0,
        }
    }

    /// Turns on the dashboard fetch after each successful report. Stats are
    /// pushed to `sink` when one is given.
    pub fn with_dashboard_reporting(mut self, sink: Option<NotificationSink>) -> Self {
        self.reports_dashboard = true;
        self.sink = sink;
        self
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    pub fn email(&self) -> &str {
        &self.credentials.email
    }

    pub fn reported_ip(&self) -> &str {
        self.binding.reported_ip()
    }

    pub fn reports_dashboard(&self) -> bool {
        self.reports_dashboard
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_token.is_some()
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn cookies(&self) -> &str {
        &self.cookies
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.retry.consecutive_failures()
    }

    pub fn login_attempts(&self) -> u64 {
        self.login_attempts
    }

    fn browser_headers(&self, request: RequestBuilder, referer_path: &str) -> RequestBuilder {
        request
            .header(ACCEPT, "*/*")
            .header(USER_AGENT, random_user_agent())
            .header(ORIGIN, self.endpoints.origin())
            .header(REFERER, self.endpoints.referer(referer_path))
    }

    /// Exchanges credentials for an API token. A failed attempt keeps any
    /// previously issued token.
    pub async fn login(&mut self) -> AppResult<()> {
        self.login_attempts += 1;
        match self.request_token().await {
            Ok((token, cookies)) => {
                self.api_token = Some(token);
                if let Some(cookies) = cookies {
                    self.cookies = cookies;
                }
                self.retry.record_success();
                info!(
                    email = %self.credentials.email,
                    ip = %self.reported_ip(),
                    "Login successful for {}",
                    self.credentials.email
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    email = %self.credentials.email,
                    ip = %self.reported_ip(),
                    "Login error for {}: {}",
                    self.credentials.email,
                    e
                );
                Err(e)
            }
        }
    }

    async fn request_token(&self) -> AppResult<(String, Option<String>)> {
        let body = TokenRequest {
            email: &self.credentials.email,
            password: &self.credentials.password,
        };
        let request = self.client.post(self.endpoints.token_url()).json(&body);
        let response = self
            .browser_headers(request, "/")
            .send()
            .await
            .map_err(|e| AppError::AuthenticationFailed(e.to_string()))?;

        let cookies = session_cookies(&response);
        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::AuthenticationFailed(format!("invalid token response: {}", e)))?;

        match parsed.api_token.filter(|token| !token.is_empty()) {
            Some(token) => Ok((token, cookies)),
            None => Err(AppError::AuthenticationFailed(
                "Login failed: No API token received".to_string(),
            )),
        }
    }

    /// Sends one authenticated uptime report. Failures feed the retry
    /// policy; reaching its threshold triggers a login before the original
    /// error is returned.
    pub async fn report_uptime(&mut self) -> AppResult<ReportOutcome> {
        let token = self.api_token.clone().ok_or(AppError::NotAuthenticated)?;
        let ip = self.reported_ip().to_string();

        match self.send_report(&token, &ip).await {
            Ok(()) => {
                info!(
                    email = %self.credentials.email,
                    ip = %ip,
                    "Uptime reported successfully for IP: {}",
                    ip
                );
                let snapshot = if self.reports_dashboard {
                    self.publish_dashboard().await
                } else {
                    None
                };
                self.retry.record_success();
                Ok(ReportOutcome {
                    reported_ip: ip,
                    snapshot,
                })
            }
            Err(e) => {
                error!(
                    email = %self.credentials.email,
                    ip = %ip,
                    "Uptime report error for IP {}: {}",
                    ip,
                    e
                );
                if self.retry.record_failure() == RetryDecision::ForceReauth {
                    warn!(
                        email = %self.credentials.email,
                        ip = %ip,
                        "Max retries reached for IP {}, attempting to re-login...",
                        ip
                    );
                    // login() logs its own failure
                    let _ = self.login().await;
                    self.retry.finish_reauth();
                }
                Err(e)
            }
        }
    }

    async fn send_report(&self, token: &str, ip: &str) -> AppResult<()> {
        let query = ReportQuery {
            email: &self.credentials.email,
            api_token: token,
            ip,
        };
        let request = self
            .client
            .post(self.endpoints.report_uptime_url())
            .query(&query)
            .header(COOKIE, format!("id={}", token));
        let response = self
            .browser_headers(request, "/")
            .send()
            .await
            .map_err(|e| AppError::ReportFailed(e.to_string()))?;

        let parsed: ReportResponse = response
            .json()
            .await
            .map_err(|e| AppError::ReportFailed(format!("invalid report response: {}", e)))?;

        if parsed.is_success() {
            Ok(())
        } else {
            Err(AppError::ReportFailed(format!(
                "Uptime report failed with status: {}",
                parsed
                    .status_code
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "missing".to_string())
            )))
        }
    }

    /// Best-effort read of account metrics. A failure triggers a login and
    /// yields `None`; it is never propagated.
    pub async fn get_dashboard_stats(&mut self) -> Option<DashboardSnapshot> {
        match self.fetch_dashboard().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                error!(
                    email = %self.credentials.email,
                    ip = %self.reported_ip(),
                    "Failed to get dashboard stats: {}",
                    e
                );
                let _ = self.login().await;
                None
            }
        }
    }

    async fn fetch_dashboard(&self) -> AppResult<DashboardSnapshot> {
        let mut request = self.client.post(self.endpoints.dashboard_url());
        if !self.cookies.is_empty() {
            request = request.header(COOKIE, self.cookies.as_str());
        }
        let response = self
            .browser_headers(request, "/ui/dashboard")
            .send()
            .await
            .map_err(|e| AppError::DashboardFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::DashboardFetchFailed(format!(
                "Failed to fetch: Status {}",
                status.as_u16()
            )));
        }

        response
            .json::<DashboardSnapshot>()
            .await
            .map_err(|e| AppError::DashboardFetchFailed(format!("invalid dashboard payload: {}", e)))
    }

    async fn publish_dashboard(&mut self) -> Option<DashboardSnapshot> {
        let snapshot = self.get_dashboard_stats().await?;
        if let Some(sink) = &self.sink {
            let updated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            sink.notify(format_stats_message(
                self.reported_ip(),
                &snapshot,
                &updated_at,
            ));
        }
        Some(snapshot)
    }

    #[cfg(test)]
    pub(crate) fn set_api_token_for_test(&mut self, token: Option<&str>) {
        self.api_token = token.map(str::to_string);
    }
}

/// Folds every `Set-Cookie` header into a single `Cookie` header value.
fn session_cookies(response: &Response) -> Option<String> {
    let pairs: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
