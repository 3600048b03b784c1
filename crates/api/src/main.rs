use anyhow::Context;

use congregate_api::{
    app::{self, AppServices},
    config::AppConfig,
    seed::Seed,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    congregate_observability::init();

    let config = AppConfig::from_env()?;

    let seed = match &config.seed_file {
        Some(path) => Seed::load(path)?,
        None => Seed::default(),
    };
    let services = AppServices::in_memory(&seed, config.cache);

    let router = app::build_app(&config, services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
