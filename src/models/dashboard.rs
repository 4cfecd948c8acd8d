use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub uptime: Option<f64>,
    #[serde(default)]
    pub points: Option<f64>,
}

/// Account-wide metrics as returned by the dashboard endpoint. Every field
/// is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub uptime: Option<f64>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub download: Option<f64>,
    #[serde(default)]
    pub upload: Option<f64>,
    #[serde(default)]
    pub daily_stats: Vec<DailyStat>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub verified_email: bool,
}

impl DashboardSnapshot {
    /// Most recent entry of `daily_stats`, which the API lists newest first.
    pub fn today(&self) -> Option<&DailyStat> {
        self.daily_stats.first()
    }
}
