pub mod claimer;
pub mod constants;
pub mod error;
pub mod models;
pub mod modules;
pub mod utils;

#[cfg(test)]
mod test_utils;

use std::path::Path;

use claimer::FleetOrchestrator;
use models::{AppConfig, EgressBinding};
use modules::notify::{spawn_telegram_sink, NotificationSink, TelegramSender};
use modules::system::{config, logger, validation};
use tracing::{error, info, warn};

fn load_validated_config(data_dir: &Path) -> Result<AppConfig, String> {
    let created = config::initialize_config_files(data_dir)
        .map_err(|e| format!("failed_to_initialize_config_files: {}", e))?;
    if !created.is_empty() {
        warn!(
            "Created placeholder input files ({}). Edit them in {} before relying on the reports.",
            created.join(", "),
            data_dir.display()
        );
    }

    let config = config::load_app_config(data_dir)
        .map_err(|e| format!("failed_to_load_config: {}", e))?;
    validation::validate_app_config(&config).map_err(|errors| {
        format!(
            "configuration_validation_failed:\n{}",
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        )
    })?;
    Ok(config)
}

fn build_notification_sink(config: &AppConfig) -> Option<NotificationSink> {
    if !config.telegram.is_configured() {
        warn!("Telegram target is not configured; dashboard reports will only be logged");
        return None;
    }

    let binding = EgressBinding::direct(config.main_ip.trim());
    match utils::http::build_client(&binding, config.settings.request_timeout()) {
        Ok(client) => {
            let sender = TelegramSender::new(
                client,
                config.settings.telegram_api_base_url.clone(),
                config.telegram.clone(),
            );
            Some(spawn_telegram_sink(
                sender,
                config.settings.notify_queue_capacity,
            ))
        }
        Err(e) => {
            error!("Failed to build Telegram client: {}", e);
            None
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn start_fleet(config: AppConfig) -> Result<FleetOrchestrator, String> {
    info!(
        "Loaded {} identities for {} (main IP {})",
        config.identity_count(),
        config.credentials.email,
        config.main_ip
    );

    let sink = build_notification_sink(&config);
    let mut fleet = FleetOrchestrator::from_config(&config, sink)
        .map_err(|e| format!("failed_to_build_fleet: {}", e))?;
    let summary = fleet.start_all().await;
    if summary.started == 0 && summary.already_running == 0 {
        warn!("No identity could log in; every claimer is stopped");
    }
    Ok(fleet)
}

fn run_service(data_dir: &Path) -> Result<(), String> {
    let config = load_validated_config(data_dir)?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create Tokio runtime: {}", e))?;

    runtime.block_on(async {
        let mut fleet = start_fleet(config).await?;

        info!("Uptime reporter is running. Press Ctrl+C to exit.");
        wait_for_shutdown_signal().await;

        info!("Stopping all auto claimers...");
        fleet.stop_all();
        info!("All auto claimers stopped");
        Ok::<(), String>(())
    })
}

pub fn run() {
    let args: Vec<String> = std::env::args().collect();
    let data_dir = config::resolve_data_dir(&args);

    let log_guard = logger::init_logger(&data_dir);
    info!("Using data directory {}", data_dir.display());

    let code = match run_service(&data_dir) {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            1
        }
    };

    drop(log_guard);
    std::process::exit(code);
}
