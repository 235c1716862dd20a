use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use survey_hub::config::Config;
use survey_hub::db::{create_pool, run_migrations};
use survey_hub::routes::{build_app, ApiState};
use survey_hub::store::PgStore;
use survey_hub::webhook::{WebhookReconciler, WebhookState, WebhookVerifier};

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survey_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting survey-hub server...");
    tracing::info!("Connecting to database...");

    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection established");

    run_migrations(&pool).await?;
    tracing::info!("Migrations applied");

    if config.clerk_secret_key.is_some() {
        tracing::info!("CLERK_SECRET_KEY configured");
    }

    let store = Arc::new(PgStore::new(pool.clone()));
    let verifier = WebhookVerifier::new(
        &config.clerk_webhook_secret,
        config.webhook_tolerance_seconds,
    )
    .context("Invalid CLERK_WEBHOOK_SIGNING_SECRET")?;
    let webhooks = WebhookState::new(verifier, WebhookReconciler::new(store.clone()));
    let api = ApiState::new(pool, store);

    let app = build_app(&config, api, webhooks);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
