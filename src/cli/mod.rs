//! CLI entry point for qwen-auth.

pub mod auth;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::AuthError;
use crate::config::AuthConfig;

/// Qwen OAuth CLI
#[derive(Parser, Debug)]
#[command(name = "qwen-auth", version, about = "Qwen OAuth device login and token management")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Credential file (overrides config and QWEN_CREDENTIALS_PATH)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the device login and store the credential
    Login,
    /// Show the stored credential's state
    Status,
    /// Remove the stored credential
    Logout,
    /// Print a valid access token, refreshing or logging in as needed
    Token,
}

impl Cli {
    /// Resolve the effective configuration from flags, file and environment.
    pub fn auth_config(&self) -> Result<AuthConfig, AuthError> {
        let config = match &self.config {
            Some(path) => AuthConfig::from_toml_file(path)?,
            None => AuthConfig::from_env(),
        };
        Ok(match &self.credentials {
            Some(path) => config.with_credentials_path(path.clone()),
            None => config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_login() {
        let cli = Cli::try_parse_from(["qwen-auth", "login"]).unwrap();
        assert!(matches!(cli.command, Commands::Login));
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_global_credentials_after_subcommand() {
        let cli =
            Cli::try_parse_from(["qwen-auth", "token", "--credentials", "/tmp/c.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Token));
        let config = cli.auth_config().unwrap();
        assert_eq!(config.credentials_path, PathBuf::from("/tmp/c.json"));
    }

    #[test]
    fn parse_status_and_logout() {
        assert!(matches!(
            Cli::try_parse_from(["qwen-auth", "status"]).unwrap().command,
            Commands::Status
        ));
        assert!(matches!(
            Cli::try_parse_from(["qwen-auth", "logout"]).unwrap().command,
            Commands::Logout
        ));
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["qwen-auth"]).is_err());
    }

    #[test]
    fn missing_config_file_is_configuration_error() {
        let cli = Cli::try_parse_from([
            "qwen-auth",
            "status",
            "--config",
            "/nonexistent/qwen-auth.toml",
        ])
        .unwrap();
        assert!(matches!(cli.auth_config(), Err(AuthError::Configuration(_))));
    }
}
