use std::path::Path;

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::gateway::GatewayRequest;

pub async fn handle(config: &AppConfig, event: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(event)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", event.display(), e))?;
    let request: GatewayRequest = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a gateway event: {}", event.display(), e))?;

    let (router, worker) = super::local_stack(config)?;
    let response = router.handle(request).await;

    // Closing the queue lets the worker flush what this event produced
    drop(router);
    worker.await?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text => {
            println!("{}", response.status_code);
            println!("{}", response.body);
        }
    }
    Ok(())
}
