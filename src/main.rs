//! qwen-auth CLI binary entry point.

use clap::Parser;
use qwen_auth::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qwen_auth=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.auth_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Login => qwen_auth::cli::auth::handle_login(config).await,
        Commands::Status => qwen_auth::cli::auth::handle_status(config).await,
        Commands::Logout => qwen_auth::cli::auth::handle_logout(config).await,
        Commands::Token => qwen_auth::cli::auth::handle_token(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
