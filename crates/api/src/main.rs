use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dashgate_observability::init();

    let config = dashgate_api::GatewayConfig::from_env().context("invalid gateway configuration")?;
    let bind_addr = config.bind_addr;
    tracing::info!(upstream = %config.upstream_base_url, "starting gateway");

    let app = dashgate_api::build_app(config).context("failed to build upstream client")?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
