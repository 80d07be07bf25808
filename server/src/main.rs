use anyhow::{Context, Result};
use clap::Parser;

mod config;
mod jobs;
mod routes;

use config::Config;
use routes::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create uploads directory: {}",
                config.uploads_dir.display()
            )
        })?;

    let state = AppState::new(
        config.uploads_dir.clone(),
        config.light_delay(),
        config.heavy_delay(),
    );
    let app = router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind local server on {addr}"))?;
    log::info!(
        "Server running on {addr} (uploads in {})",
        config.uploads_dir.display()
    );

    axum::serve(listener, app).await.context("Local server error")?;
    Ok(())
}
