pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "product-admin-api")]
#[command(about = "Product admin API - server and account bootstrap")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Create an account directly in the database")]
    CreateUser(commands::user::CreateUserArgs),

    #[command(about = "Print the permission catalog")]
    Permissions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
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

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::CreateUser(args) => commands::user::handle(args, output_format).await,
        Commands::Permissions => commands::permissions::handle(output_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["product-admin-api"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_user_arguments() {
        let cli = Cli::parse_from([
            "product-admin-api",
            "create-user",
            "--email",
            "root@example.com",
            "--name",
            "Root",
            "--password",
            "changeme",
            "--all-permissions",
        ]);
        match cli.command {
            Some(Commands::CreateUser(args)) => {
                assert!(args.all_permissions);
                assert_eq!(args.email, "root@example.com");
            }
            _ => panic!("expected create-user"),
        }
    }

    #[test]
    fn serve_port_flag() {
        let cli = Cli::parse_from(["product-admin-api", "--json", "serve", "--port", "8080"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(8080) })));
    }
}
