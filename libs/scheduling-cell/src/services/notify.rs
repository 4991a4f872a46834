// libs/scheduling-cell/src/services/notify.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use shared_config::ClinicConfig;

/// Outbound notification contract. Delivery is best-effort throughout the
/// cell; callers log failures and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Notifier backed by the clinic's HTTP mail relay.
pub struct MailRelayNotifier {
    client: reqwest::Client,
    base_url: String,
    token: String,
    from: String,
}

impl MailRelayNotifier {
    pub fn new(config: &ClinicConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.mailer_url.clone(),
            token: config.mailer_token.clone(),
            from: config.mail_from.clone(),
        }
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let url = format!("{}/messages", self.base_url);
        debug!("Sending notification to {}", recipient);

        let payload = json!({
            "from": self.from,
            "to": recipient,
            "subject": subject,
            "text": body
        });

        let mut request = self.client.post(&url).json(&payload);
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Mail relay error ({}): {}", status, error_text));
        }

        Ok(())
    }
}

/// Fallback used when no mail relay is configured.
pub struct LogOnlyNotifier;

#[async_trait]
impl Notifier for LogOnlyNotifier {
    async fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
        info!(
            "Notification for {} suppressed (no mailer configured): {}",
            recipient, subject
        );
        Ok(())
    }
}
