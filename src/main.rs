use clap::Parser;
use helpdesk_api::cli::Cli;
use helpdesk_api::config::TokenVerification;
use helpdesk_api::is_production;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up UPLOAD_BUCKET, QUEUE_ENQUEUE_TIMEOUT_MS, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = helpdesk_api::config::config();
    tracing::info!("Starting helpdesk in {:?} mode", config.environment);

    if is_production!() && config.security.token_verification == TokenVerification::Unverified {
        tracing::warn!("Bearer credentials are decoded without signature checks; set SECURITY_TOKEN_VERIFICATION=hs256");
    }

    if let Err(e) = helpdesk_api::cli::run(cli, config).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
