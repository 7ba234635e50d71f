use std::sync::Arc;

use crate::config::AppConfig;
use crate::server;

pub async fn handle(config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    let (router, _worker) = super::local_stack(config)?;
    let app = server::app(Arc::new(router), config.server.max_request_size_bytes);

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Helpdesk API listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
