//! Cafeteria ordering web service

use anyhow::Result;
use tracing::{info, warn};

use cafeteria::config::Config;
use cafeteria::telemetry;
use cafeteria::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();
    let config = Config::load();

    let db = web::connect(&config.database_url).await?;
    if config.seed_demo { web::seed_demo_catalog(&db, &config.currency).await?; }

    let nats = match config.nats_url.as_deref() {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(%url, error = %e, "NATS unavailable, events will only be logged");
                None
            }
        },
        None => None,
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let app = web::router(AppState::new(db, nats, config));
    info!("☕ Cafeteria listening on {addr}");
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
