use anyhow::Context;

use genusdb_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    genusdb_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr;
    tracing::info!(
        algorithm = %config.key.algorithm(),
        denylist = config.enable_denylist,
        "starting genusdb api"
    );

    let deps = config.into_deps().context("failed to build auth services")?;
    let app = genusdb_api::app::build_app(deps);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
