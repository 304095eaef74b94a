mod config;
mod db;
mod domain;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::{seed, PgRecordStore, RecordStore};
use crate::services::admin_gate::AdminGate;
use crate::services::identity::SessionIdentityProvider;
use crate::services::leads::{LeadPipeline, LeadSink, SimulatedSink, WebhookSink};
use crate::services::reporting::Reporting;
use crate::state::SharedState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.external_call_timeout)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;
    tracing::info!("Database migrations completed");

    seed::seed_all(&pool, config.admin_email.as_deref()).await?;

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));
    let identity = Arc::new(SessionIdentityProvider::new(
        config.session_key.clone(),
        store.clone(),
    ));

    let sink: Arc<dyn LeadSink> = match &config.lead_webhook_url {
        Some(url) => {
            tracing::info!("Leads will be forwarded to {}", url);
            let client = reqwest::Client::builder()
                .timeout(config.external_call_timeout)
                .build()?;
            Arc::new(WebhookSink::new(client, url.clone()))
        }
        None => {
            tracing::info!(
                "No LEAD_WEBHOOK_URL set; simulating lead processing ({:?})",
                config.lead_processing_delay
            );
            Arc::new(SimulatedSink::new(config.lead_processing_delay))
        }
    };

    let shared: SharedState = Arc::new(state::AppState {
        gate: AdminGate::new(identity, store.clone(), config.external_call_timeout),
        leads: LeadPipeline::new(sink),
        reporting: Reporting::new(
            store,
            config.external_call_timeout,
            config.recent_users_limit,
        ),
        config: Arc::new(config.clone()),
    });

    let app = web::app(shared, &config);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
