use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::session::IdentitySession;
use crate::error::AppResult;
use crate::models::{IdentityKey, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Sleep after a successful report vs. after a failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingSchedule {
    pub interval: Duration,
    pub cooldown: Duration,
}

impl PollingSchedule {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            interval: settings.polling_interval(),
            cooldown: settings.failure_cooldown(),
        }
    }
}

impl Default for PollingSchedule {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

pub struct PollingLoop {
    key: IdentityKey,
    email: String,
    ip: String,
    session: Arc<Mutex<IdentitySession>>,
    schedule: PollingSchedule,
    stop_token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl PollingLoop {
    pub fn new(session: IdentitySession, schedule: PollingSchedule) -> Self {
        Self {
            key: session.key().clone(),
            email: session.email().to_string(),
            ip: session.reported_ip().to_string(),
            session: Arc::new(Mutex::new(session)),
            schedule,
            stop_token: None,
            handle: None,
        }
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    /// Shared handle to the driven session, for inspection.
    pub fn session(&self) -> Arc<Mutex<IdentitySession>> {
        self.session.clone()
    }

    pub fn state(&self) -> LoopState {
        match &self.stop_token {
            Some(token) if !token.is_cancelled() => LoopState::Running,
            _ => LoopState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Logs in and spawns the reporting cycle. A failed login leaves the
    /// loop stopped and returns the error.
    pub async fn start(&mut self) -> AppResult<StartOutcome> {
        if self.is_running() {
            warn!(
                email = %self.email,
                ip = %self.ip,
                "Auto claimer is already running"
            );
            return Ok(StartOutcome::AlreadyRunning);
        }

        info!(
            email = %self.email,
            ip = %self.ip,
            "Starting BlockMesh auto claimer for {}...",
            self.email
        );

        if let Err(e) = self.session.lock().await.login().await {
            error!(
                email = %self.email,
                ip = %self.ip,
                "Failed to initialize auto claimer: {}",
                e
            );
            return Err(e);
        }

        let stop_token = CancellationToken::new();
        let span = info_span!("claimer", email = %self.email, ip = %self.ip);
        let handle = tokio::spawn(
            run_cycle(self.session.clone(), stop_token.clone(), self.schedule).instrument(span),
        );

        self.stop_token = Some(stop_token);
        self.handle = Some(handle);
        Ok(StartOutcome::Started)
    }

    /// Signals the cycle to exit at its next loop-top check. In-flight
    /// requests and sleeps are not interrupted.
    pub fn stop(&mut self) {
        info!(
            email = %self.email,
            ip = %self.ip,
            "Stopping BlockMesh auto claimer for {}...",
            self.email
        );
        if let Some(token) = &self.stop_token {
            token.cancel();
        }
    }

    /// Waits for the current cycle task, if any, to finish.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(email = %self.email, ip = %self.ip, "Claim loop task error: {}", e);
            }
        }
    }
}

async fn run_cycle(
    session: Arc<Mutex<IdentitySession>>,
    stop: CancellationToken,
    schedule: PollingSchedule,
) {
    let mut cycles: u64 = 0;
    while !stop.is_cancelled() {
        cycles += 1;
        let result = session.lock().await.report_uptime().await;
        let pause = match result {
            Ok(_) => schedule.interval,
            Err(e) => {
                if e.is_transient() {
                    error!("Error in claim loop: {}", e);
                } else {
                    error!("Unexpected error in claim loop: {}", e);
                }
                schedule.cooldown
            }
        };
        debug!("Cycle {} done, next attempt in {:?}", cycles, pause);
        tokio::time::sleep(pause).await;
    }
    info!("Claim loop exited after {} cycle(s)", cycles);
}
