use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Uptime report failed: {0}")]
    ReportFailed(String),

    #[error("Dashboard fetch failed: {0}")]
    DashboardFetchFailed(String),

    #[error("Notification delivery failed: {0}")]
    NotificationDeliveryFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Errors the polling loop is expected to see and recover from by
    /// waiting out the cooldown.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::AuthenticationFailed(_) | AppError::ReportFailed(_) | AppError::Network(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_and_auth_failures_are_transient() {
        assert!(AppError::ReportFailed("status 500".into()).is_transient());
        assert!(AppError::AuthenticationFailed("no token".into()).is_transient());
        assert!(!AppError::NotAuthenticated.is_transient());
        assert!(!AppError::Config("bad".into()).is_transient());
    }
}
