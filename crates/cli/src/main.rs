//! Pod Remediator CLI
//!
//! A command-line tool for inspecting a running remediation controller:
//! its health and the restart attempts it is tracking.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{attempts, status};

/// Pod Remediator CLI
#[derive(Parser)]
#[command(name = "remediatorctl")]
#[command(author, version, about = "CLI for the Pod Remediator controller", long_about = None)]
pub struct Cli {
    /// Controller API URL (can also be set via REMEDIATOR_API_URL env var)
    #[arg(long, env = "REMEDIATOR_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show controller health and readiness
    Status,

    /// List pods with restart attempts
    Attempts {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Status => status::show_status(&client, cli.format).await?,
        Commands::Attempts { namespace } => {
            attempts::list_attempts(&client, namespace, cli.format).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attempts_with_namespace() {
        let cli = Cli::try_parse_from(["remediatorctl", "attempts", "-n", "payments"]).unwrap();

        match cli.command {
            Commands::Attempts { namespace } => assert_eq!(namespace.as_deref(), Some("payments")),
            _ => panic!("expected attempts command"),
        }
    }

    #[test]
    fn test_parse_format() {
        let cli = Cli::try_parse_from(["remediatorctl", "--format", "json", "status"]).unwrap();

        assert_eq!(cli.format, output::OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["remediatorctl", "--format", "yaml", "status"]).is_err());
    }
}
