pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "flagctl")]
#[command(about = "flagctl - command-line client for the feature flag manager API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Server base URL (default: $FLAGCTL_SERVER or http://localhost:3000)")]
    pub server: Option<String>,

    #[arg(long, global = true, help = "Caller id sent as X-User-Id (default: $FLAGCTL_USER)")]
    pub user: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check server health from the /health endpoint")]
    Health,

    #[command(about = "Feature flag operations")]
    Params {
        #[command(subcommand)]
        cmd: commands::params::ParamsCommands,
    },

    #[command(about = "User and permission management")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UsersCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

impl Cli {
    pub fn client(&self) -> anyhow::Result<ApiClient> {
        let server = self
            .server
            .clone()
            .or_else(|| std::env::var("FLAGCTL_SERVER").ok())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let user = self.user.clone().or_else(|| std::env::var("FLAGCTL_USER").ok());
        ApiClient::new(&server, user)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = cli.client()?;

    match cli.command {
        Commands::Health => commands::health(&client, output_format).await,
        Commands::Params { cmd } => commands::params::handle(cmd, &client, output_format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, &client, output_format).await,
    }
}
