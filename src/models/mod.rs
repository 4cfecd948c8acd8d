pub mod config;
pub mod dashboard;
pub mod identity;

pub use config::{AppConfig, Settings, TelegramTarget};
pub use dashboard::{DailyStat, DashboardSnapshot};
pub use identity::{Credentials, EgressBinding, IdentityKey};
