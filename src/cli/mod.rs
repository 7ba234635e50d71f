pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(about = "Helpdesk ticket API - serve over HTTP or replay gateway events")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API with in-memory collaborators")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides HELPDESK_PORT/PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Run one gateway event file through the router and print the response")]
    Invoke {
        #[arg(help = "Path to a JSON gateway event")]
        event: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(config, port).await,
        Commands::Invoke { event } => commands::invoke::handle(config, &event, output_format).await,
    }
}
