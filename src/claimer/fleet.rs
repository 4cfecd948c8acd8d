use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::api::ApiEndpoints;
use super::polling::{PollingLoop, PollingSchedule, StartOutcome};
use super::retry::RetryPolicy;
use super::session::IdentitySession;
use crate::error::{AppError, AppResult};
use crate::models::{AppConfig, EgressBinding, IdentityKey};
use crate::modules::notify::NotificationSink;
use crate::utils::http::build_client;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetStartSummary {
    pub total: usize,
    pub started: usize,
    pub already_running: usize,
    pub failed: usize,
}

/// Owns one polling loop per configured identity: the direct main identity
/// first, then one per proxy address.
pub struct FleetOrchestrator {
    loops: Vec<PollingLoop>,
}

impl FleetOrchestrator {
    pub fn from_config(config: &AppConfig, sink: Option<NotificationSink>) -> AppResult<Self> {
        let credentials = Arc::new(config.credentials.clone());
        let endpoints = ApiEndpoints::from_settings(&config.settings);
        let schedule = PollingSchedule::from_settings(&config.settings);
        let timeout = config.settings.request_timeout();
        let threshold = config.settings.max_consecutive_failures;

        let build_session = |binding: EgressBinding| -> AppResult<IdentitySession> {
            let client = build_client(&binding, timeout)?;
            Ok(IdentitySession::new(
                credentials.clone(),
                binding,
                endpoints.clone(),
                client,
                config.cookies.clone(),
                RetryPolicy::new(threshold),
            ))
        };

        let mut fleet = Self {
            loops: Vec::with_capacity(config.identity_count()),
        };

        let main = build_session(EgressBinding::direct(config.main_ip.trim()))?
            .with_dashboard_reporting(sink);
        fleet.insert(PollingLoop::new(main, schedule))?;

        for address in &config.proxy_addresses {
            let session = build_session(EgressBinding::proxy(address.trim()))?;
            fleet.insert(PollingLoop::new(session, schedule))?;
        }

        info!(
            "Fleet assembled: {} identities (1 main + {} proxied)",
            fleet.len(),
            fleet.len() - 1
        );
        Ok(fleet)
    }

    fn insert(&mut self, polling: PollingLoop) -> AppResult<()> {
        if self.get(polling.key()).is_some() {
            return Err(AppError::Config(format!(
                "duplicate identity: {}",
                polling.key()
            )));
        }
        self.loops.push(polling);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.loops.iter().map(|polling| polling.key())
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&PollingLoop> {
        self.loops.iter().find(|polling| polling.key() == key)
    }

    pub fn running_count(&self) -> usize {
        self.loops.iter().filter(|polling| polling.is_running()).count()
    }

    /// Starts every loop concurrently so a slow login on one egress path
    /// never delays the others.
    pub async fn start_all(&mut self) -> FleetStartSummary {
        info!("Starting all instances...");
        let results = join_all(self.loops.iter_mut().map(|polling| polling.start())).await;

        let mut summary = FleetStartSummary {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result {
                Ok(StartOutcome::Started) => summary.started += 1,
                Ok(StartOutcome::AlreadyRunning) => summary.already_running += 1,
                Err(_) => summary.failed += 1,
            }
        }

        if summary.failed > 0 {
            warn!(
                "Fleet started with failures: total={}, started={}, failed={}",
                summary.total, summary.started, summary.failed
            );
        } else {
            info!(
                "Fleet started: total={}, started={}, already_running={}",
                summary.total, summary.started, summary.already_running
            );
        }
        summary
    }

    /// Signals every loop to stop. Does not wait for in-flight cycles.
    pub fn stop_all(&mut self) {
        for polling in &mut self.loops {
            polling.stop();
        }
    }
}
