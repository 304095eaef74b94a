use crate::services::reporting::DEFAULT_RECENT_USERS;
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use std::time::Duration;

/// Runtime configuration, read from the environment (and `.env`).
///
/// | Env Var                    | Default        |
/// |----------------------------|----------------|
/// | `DATABASE_URL`             | required       |
/// | `SESSION_KEY`              | required, base64, >= 32 bytes |
/// | `BIND_ADDR`                | `0.0.0.0:$PORT` (`PORT` = 3000) |
/// | `STATIC_DIR`               | `static`       |
/// | `CORS_ORIGINS`             | none           |
/// | `LEAD_PROCESSING_DELAY_MS` | `1500`         |
/// | `LEAD_WEBHOOK_URL`         | unset          |
/// | `EXTERNAL_CALL_TIMEOUT_MS` | `5000`         |
/// | `SYNC_TARGET_EMAIL`        | unset          |
/// | `RECENT_USERS_LIMIT`       | `10`           |
/// | `ADMIN_EMAIL`              | unset          |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub session_key: Vec<u8>,
    pub bind_addr: String,
    pub static_dir: String,
    pub cors_origins: Vec<String>,
    pub lead_processing_delay: Duration,
    pub lead_webhook_url: Option<String>,
    pub external_call_timeout: Duration,
    pub sync_target_email: Option<String>,
    pub recent_users_limit: usize,
    pub admin_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = var("DATABASE_URL").context("DATABASE_URL missing")?;

        let session_key_b64 = var("SESSION_KEY").context("SESSION_KEY missing")?;
        let session_key = general_purpose::STANDARD
            .decode(session_key_b64)
            .context("SESSION_KEY must be base64")?;
        if session_key.len() < 32 {
            bail!("SESSION_KEY must decode to at least 32 bytes");
        }

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| {
            let port = var("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let cors_origins = var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let millis = |key: &str, default: u64| -> Result<Duration> {
            let ms = match var(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("{key} must be a whole number of milliseconds"))?,
                None => default,
            };
            Ok(Duration::from_millis(ms))
        };

        let recent_users_limit = match var("RECENT_USERS_LIMIT") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .context("RECENT_USERS_LIMIT must be a positive integer")?,
            None => DEFAULT_RECENT_USERS,
        };

        Ok(Self {
            database_url,
            session_key,
            bind_addr,
            static_dir: var("STATIC_DIR").unwrap_or_else(|| "static".to_string()),
            cors_origins,
            lead_processing_delay: millis("LEAD_PROCESSING_DELAY_MS", 1500)?,
            lead_webhook_url: var("LEAD_WEBHOOK_URL"),
            external_call_timeout: millis("EXTERNAL_CALL_TIMEOUT_MS", 5000)?,
            sync_target_email: var("SYNC_TARGET_EMAIL"),
            recent_users_limit,
            admin_email: var("ADMIN_EMAIL"),
        })
    }
}
