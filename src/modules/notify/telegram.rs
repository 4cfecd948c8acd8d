use crate::error::{AppError, AppResult};
use crate::models::{DashboardSnapshot, TelegramTarget};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct SendMessageReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramSender {
    client: Client,
    api_base_url: String,
    target: TelegramTarget,
}

impl TelegramSender {
    pub fn new(client: Client, api_base_url: impl Into<String>, target: TelegramTarget) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            target,
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base_url, self.target.bot_token)
    }

    pub async fn send_message(&self, text: &str) -> AppResult<()> {
        let body = SendMessageRequest {
            chat_id: &self.target.chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::NotificationDeliveryFailed(e.to_string()))?;

        let reply: SendMessageReply = response
            .json()
            .await
            .map_err(|e| AppError::NotificationDeliveryFailed(e.to_string()))?;

        if !reply.ok {
            return Err(AppError::NotificationDeliveryFailed(format!(
                "Telegram API error: {}",
                reply.description.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(())
    }
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    format!("{:.*}", decimals, value.unwrap_or(0.0))
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "✅"
    } else {
        "❌"
    }
}

/// Renders the HTML stats summary pushed after a successful main-identity
/// report.
pub fn format_stats_message(ip: &str, stats: &DashboardSnapshot, updated_at: &str) -> String {
    let today = stats.today();
    let today_uptime = today.and_then(|d| d.uptime);
    let today_points = today.and_then(|d| d.points);

    format!(
        "🌟 <b>BlockMesh Stats Update</b> 🌟\n\
         📍 IP: <code>{ip}</code>\n\
         \n\
         📊 <b>Performance Metrics:</b>\n\
         ⏱ Uptime: <code>{uptime}%</code>\n\
         💰 Points: <code>{points}</code>\n\
         📡 Latency: <code>{latency} ms</code>\n\
         ⬇️ Download: <code>{download} Mbps</code>\n\
         ⬆️ Upload: <code>{upload} Mbps</code>\n\
         \n\
         📅 <b>Today's Performance:</b>\n\
         🕒 Uptime: <code>{today_uptime}%</code>\n\
         💎 Points: <code>{today_points}</code>\n\
         \n\
         🔗 <b>Status:</b>\n\
         ⚡️ Connected: {connected}\n\
         ✉️ Email Verified: {verified}\n\
         \n\
         🕐 Updated: {updated_at}",
        ip = ip,
        uptime = fixed(stats.uptime, 2),
        points = fixed(stats.points, 4),
        latency = fixed(stats.latency, 2),
        download = fixed(stats.download, 2),
        upload = fixed(stats.upload, 2),
        today_uptime = fixed(today_uptime, 2),
        today_points = fixed(today_points, 4),
        connected = mark(stats.connected),
        verified = mark(stats.verified_email),
        updated_at = updated_at,
    )
}
