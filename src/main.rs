use std::net::SocketAddr;
use std::str::FromStr;

use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pet_rescue::config::AppConfig;
use pet_rescue::state::AppState;
use pet_rescue::web;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pet_rescue=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    info!("Connecting to database: {}", config.database_url);
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("🗄️ Migrations applied");

    let addr: SocketAddr = config.bind_addr().parse()?;
    let fallback_port = config.port.saturating_add(1);
    let host = config.host.clone();
    let app = web::router(AppState::new(pool, config));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!(
                "⚠️  Could not bind {}: {}. Trying fallback {}:{}",
                addr, e, host, fallback_port
            );
            let fallback: SocketAddr = format!("{}:{}", host, fallback_port).parse()?;
            tokio::net::TcpListener::bind(fallback).await?
        }
    };

    let bound_addr = listener.local_addr()?;
    info!("🚀 Server running on http://{}", bound_addr);
    info!("📍 Open http://{}/ to browse postings", bound_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
