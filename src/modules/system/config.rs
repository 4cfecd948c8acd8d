use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AppConfig, Credentials, Settings, TelegramTarget};

const PROXY_FILE: &str = "proxy.txt";
const USER_FILE: &str = "user.txt";
const TELEGRAM_FILE: &str = "config.txt";
const COOKIES_FILE: &str = "cookies.txt";
const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_FILES: [(&str, &str); 4] = [
    (PROXY_FILE, "103.133.63.4\n156.228.116.246:3128"),
    (USER_FILE, "email@example.com:password123"),
    (TELEGRAM_FILE, "bottoken:chatid"),
    (
        COOKIES_FILE,
        "_ga=GA1.1.123456789.0123456789; id=abcdefghijklmnop",
    ),
];

/// `--data-dir <path>` wins, then `MESHPULSE_DATA_DIR`, then `DATA_DIR`,
/// then the working directory.
pub fn resolve_data_dir(args: &[String]) -> PathBuf {
    if let Some(pos) = args.iter().position(|arg| arg == "--data-dir") {
        if let Some(path) = args.get(pos + 1) {
            return PathBuf::from(path);
        }
    }
    for key in ["MESHPULSE_DATA_DIR", "DATA_DIR"] {
        if let Ok(value) = std::env::var(key) {
            if !value.trim().is_empty() {
                return PathBuf::from(value.trim());
            }
        }
    }
    PathBuf::from(".")
}

/// Writes placeholder content for every missing input file. Returns the
/// names of the files it created.
pub fn initialize_config_files(data_dir: &Path) -> AppResult<Vec<&'static str>> {
    fs::create_dir_all(data_dir)?;

    let mut created = Vec::new();
    for (name, content) in DEFAULT_FILES {
        let path = data_dir.join(name);
        if path.exists() {
            continue;
        }
        match fs::write(&path, content) {
            Ok(()) => {
                info!("Created {} with default content", name);
                created.push(name);
            }
            Err(e) => error!("Error creating {}: {}", name, e),
        }
    }
    Ok(created)
}

fn read_input(data_dir: &Path, name: &str) -> AppResult<String> {
    fs::read_to_string(data_dir.join(name))
        .map_err(|e| AppError::Config(format!("failed_to_read_{}: {}", name, e)))
}

fn first_line(content: &str) -> &str {
    content.trim().lines().next().unwrap_or("").trim()
}

/// First non-blank line is the main IP, the rest are proxy endpoints.
pub fn parse_proxy_list(content: &str) -> AppResult<(String, Vec<String>)> {
    let mut entries = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let main_ip = entries
        .next()
        .ok_or_else(|| AppError::Config(format!("{} is empty", PROXY_FILE)))?
        .to_string();
    let proxies = entries.map(str::to_string).collect();
    Ok((main_ip, proxies))
}

pub fn parse_credentials(content: &str) -> AppResult<Credentials> {
    let line = first_line(content);
    let (email, password) = line
        .split_once(':')
        .ok_or_else(|| AppError::Config(format!("{} must contain email:password", USER_FILE)))?;
    Ok(Credentials::new(email.trim(), password.trim()))
}

/// Bot tokens contain `:` themselves, so the chat id is whatever follows
/// the last one.
pub fn parse_telegram_target(content: &str) -> TelegramTarget {
    match first_line(content).rsplit_once(':') {
        Some((bot_token, chat_id)) => TelegramTarget {
            bot_token: bot_token.trim().to_string(),
            chat_id: chat_id.trim().to_string(),
        },
        None => TelegramTarget::default(),
    }
}

pub fn load_settings(data_dir: &Path) -> AppResult<Settings> {
    let path = data_dir.join(SETTINGS_FILE);
    if !path.exists() {
        let settings = Settings::new();
        if let Err(e) = save_settings(data_dir, &settings) {
            warn!("Failed to write default {}: {}", SETTINGS_FILE, e);
        }
        return Ok(settings);
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| AppError::Config(format!("failed_to_read_settings_file: {}", e)))?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("failed_to_parse_settings_file: {}", e)))
}

pub fn save_settings(data_dir: &Path, settings: &Settings) -> AppResult<()> {
    let content = serde_json::to_string_pretty(settings)?;
    fs::write(data_dir.join(SETTINGS_FILE), content)?;
    Ok(())
}

pub fn load_app_config(data_dir: &Path) -> AppResult<AppConfig> {
    let (main_ip, proxy_addresses) = parse_proxy_list(&read_input(data_dir, PROXY_FILE)?)?;
    let credentials = parse_credentials(&read_input(data_dir, USER_FILE)?)?;
    let telegram = parse_telegram_target(&read_input(data_dir, TELEGRAM_FILE)?);
    let cookies = read_input(data_dir, COOKIES_FILE)?.trim().to_string();
    let settings = load_settings(data_dir)?;

    let mut config = AppConfig {
        main_ip,
        proxy_addresses,
        credentials,
        telegram,
        cookies,
        settings,
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(email) = std::env::var("MESHPULSE_EMAIL") {
        if !email.trim().is_empty() {
            info!("Using account email from environment");
            config.credentials.email = email.trim().to_string();
        }
    }
    if let Ok(password) = std::env::var("MESHPULSE_PASSWORD") {
        if !password.is_empty() {
            info!("Using account password from environment");
            config.credentials.password = password;
        }
    }
    if let Ok(token) = std::env::var("MESHPULSE_TELEGRAM_BOT_TOKEN") {
        if !token.trim().is_empty() {
            config.telegram.bot_token = token.trim().to_string();
        }
    }
    if let Ok(chat_id) = std::env::var("MESHPULSE_TELEGRAM_CHAT_ID") {
        if !chat_id.trim().is_empty() {
            config.telegram.chat_id = chat_id.trim().to_string();
        }
    }
}
