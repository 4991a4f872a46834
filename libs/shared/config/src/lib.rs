use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ClinicConfig {
    pub store_url: String,
    pub store_service_key: String,
    pub jwt_secret: String,
    pub clinic_timezone: String,
    pub clinic_opens_at: String,
    pub clinic_closes_at: String,
    pub booking_grace_minutes: i64,
    pub expiry_sweep_seconds: u64,
    pub mailer_url: String,
    pub mailer_token: String,
    pub mail_from: String,
}

impl ClinicConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("STORE_URL not set, using empty value");
                    String::new()
                }),
            store_service_key: env::var("STORE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("STORE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            clinic_timezone: env::var("CLINIC_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Yekaterinburg".to_string()),
            clinic_opens_at: env::var("CLINIC_OPENS_AT")
                .unwrap_or_else(|_| "09:00".to_string()),
            clinic_closes_at: env::var("CLINIC_CLOSES_AT")
                .unwrap_or_else(|_| "18:00".to_string()),
            booking_grace_minutes: env::var("BOOKING_GRACE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            expiry_sweep_seconds: env::var("EXPIRY_SWEEP_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            mailer_url: env::var("MAILER_URL")
                .unwrap_or_else(|_| {
                    warn!("MAILER_URL not set, notifications will be logged only");
                    String::new()
                }),
            mailer_token: env::var("MAILER_TOKEN").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@clinic.example".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.store_url.is_empty()
            && !self.store_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_mailer_configured(&self) -> bool {
        !self.mailer_url.is_empty()
    }
}
