// Alert delivery.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ports::AlertNotifier;

const TELEGRAM_API: &str = "https://api.telegram.org";
const ALERT_BANNER: &str = "🚨 *wrtfleet Alert* 🚨";

/// Writes alerts to the log only. Used when no delivery channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
    fn notify(&self, message: String) {
        info!(alert = %message, "alert");
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

/// Telegram Bot API delivery. Each alert is posted on a spawned task;
/// failures are logged and dropped.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    token: SecretString,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(token: SecretString, chat_id: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("wrtfleet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token,
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API.to_owned(),
        })
    }

    /// Point at a different Bot API server.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token.expose_secret()
        )
    }

    async fn send(self, message: String) {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: format!("{ALERT_BANNER}\n\n{message}"),
            parse_mode: "Markdown",
        };
        let result = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);
        match result {
            Ok(_) => debug!("telegram alert delivered"),
            // reqwest errors carry the URL, which embeds the bot token.
            Err(e) => warn!(error = %e.without_url(), "failed to send telegram alert"),
        }
    }
}

impl AlertNotifier for TelegramNotifier {
    fn notify(&self, message: String) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.clone().send(message));
            }
            Err(_) => warn!("no async runtime; telegram alert dropped"),
        }
    }
}
