//! CLI handlers for login, status, logout, and token.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::auth::{LoginEvent, LoginEventSink, TokenManager, TokenStatus};
use crate::config::AuthConfig;

fn terminal_sink() -> LoginEventSink {
    Arc::new(|event: LoginEvent| match event {
        LoginEvent::VerificationRequired {
            verification_uri,
            verification_uri_complete,
            user_code,
        } => {
            eprintln!("🔒 Qwen authentication required");
            match verification_uri_complete {
                Some(url) => eprintln!("🔗 Visit: {url}"),
                None => eprintln!("🔗 Visit: {verification_uri}"),
            }
            eprintln!("📋 Enter code: {user_code}");
            eprintln!("⏳ Waiting for authorization...");
        }
        LoginEvent::Authorized => eprintln!("✅ Authorized"),
    })
}

fn manager(config: AuthConfig) -> Result<TokenManager, Box<dyn std::error::Error>> {
    Ok(TokenManager::new(config)?.with_event_sink(terminal_sink()))
}

/// Cancel on Ctrl-C so an abandoned login leaves nothing behind.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

/// Handle `qwen-auth login`.
pub async fn handle_login(config: AuthConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.credentials_path.clone();
    let manager = manager(config)?;
    let cancel = ctrl_c_token();
    manager.login(Some(&cancel)).await?;
    println!("✅ Qwen login successful!");
    println!("   Credentials: {}", path.display());
    Ok(())
}

/// Handle `qwen-auth status`.
pub async fn handle_status(config: AuthConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.credentials_path.clone();
    let manager = TokenManager::new(config)?;

    println!("🔐 Authentication Status\n");
    let status = match manager.status().await {
        TokenStatus::Missing => "❌ Not logged in".to_string(),
        TokenStatus::Valid { expiry_date } => match DateTime::<Utc>::from_timestamp_millis(expiry_date) {
            Some(expires) => format!("✅ Logged in (expires {})", expires.format("%Y-%m-%d %H:%M")),
            None => "✅ Logged in".to_string(),
        },
        TokenStatus::Expired { refreshable: true } => {
            "⚠️  Token expired (will auto-refresh)".to_string()
        }
        TokenStatus::Expired { refreshable: false } => {
            "⚠️  Token expired (login required)".to_string()
        }
    };
    println!("  Qwen: {status}");
    println!("  File: {}", path.display());
    Ok(())
}

/// Handle `qwen-auth logout`.
pub async fn handle_logout(config: AuthConfig) -> Result<(), Box<dyn std::error::Error>> {
    let manager = TokenManager::new(config)?;
    manager.logout().await?;
    println!("✅ Logged out");
    Ok(())
}

/// Handle `qwen-auth token`: print a valid access token to stdout.
pub async fn handle_token(config: AuthConfig) -> Result<(), Box<dyn std::error::Error>> {
    let manager = manager(config)?;
    let cancel = ctrl_c_token();
    let token = manager.get_valid_token_with_cancel(&cancel).await?;
    println!("{token}");
    Ok(())
}
