// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use dodo_backend::{config::AppState, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // A broken configuration or unreachable database stops the boot
    let app_state = AppState::new().await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("Database migrations applied");

    let listener = TcpListener::bind(&app_state.settings.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, routes::app(app_state)).await?;

    Ok(())
}
