pub mod telegram;

pub use telegram::{format_stats_message, TelegramSender};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

/// Producer half of the notification queue. Sends never block and never
/// report delivery results back to the caller.
#[derive(Clone, Debug)]
pub struct NotificationSink {
    tx: mpsc::Sender<String>,
}

impl NotificationSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queues `message` for delivery. Returns whether it was accepted.
    pub fn notify(&self, message: String) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("[Notify] Queue full, dropping stats message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("[Notify] Sender task is gone, dropping stats message");
                false
            }
        }
    }
}

/// Starts the task that drains the queue into Telegram. The task ends once
/// every sink clone is dropped.
pub fn spawn_telegram_sink(sender: TelegramSender, capacity: usize) -> NotificationSink {
    let (sink, mut rx) = NotificationSink::channel(capacity);
    tokio::spawn(async move {
        debug!("[Notify] Telegram sender task started");
        while let Some(message) = rx.recv().await {
            match sender.send_message(&message).await {
                Ok(()) => info!("[Notify] Stats message delivered"),
                Err(e) => error!("[Notify] Error sending Telegram message: {}", e),
            }
        }
        debug!("[Notify] Telegram sender task finished");
    });
    sink
}
