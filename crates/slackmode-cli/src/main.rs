//! # slackmode-cli
//!
//! Demo binary: opens a Socket Mode session and logs `message`
//! notifications until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use slackmode_client::{AppToken, Client};
use slackmode_socket::Session;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Socket Mode demo client.
#[derive(Parser, Debug)]
#[command(name = "slackmode", about = "Connect a Socket Mode session and log messages")]
struct Cli {
    /// File containing an app-level token (`xapp-...`); falls back to
    /// the `SLACK_APP_TOKEN` environment variable.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Web API base URL override (test servers, proxies).
    #[arg(long)]
    base_url: Option<String>,
}

/// The fields of a `message` notification worth logging.
#[derive(Debug, Deserialize)]
struct MessageEvent {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    text: String,
}

fn load_token(args: &Cli) -> Result<AppToken> {
    if let Some(path) = &args.token_file {
        return AppToken::from_file(path).context("loading app token");
    }
    let raw = std::env::var("SLACK_APP_TOKEN")
        .context("no --token-file given and SLACK_APP_TOKEN is not set")?;
    AppToken::new(raw).context("validating SLACK_APP_TOKEN")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let token = load_token(&args)?;
    let client = match &args.base_url {
        Some(base_url) => Client::with_base_url(token, base_url.clone()),
        None => Client::new(token),
    };

    let mut session = Session::open(&client).await.context("opening session")?;
    session
        .notification_types()
        .register("message", |event: MessageEvent| async move {
            info!(
                channel = %event.channel,
                user = %event.user,
                text = %event.text,
                "message received"
            );
            Ok(())
        });

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    info!("serving; press Ctrl-C to stop");
    session.serve(cancel).await.context("serving session")?;
    info!("session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_event_decodes_partial_payloads() {
        let event: MessageEvent =
            serde_json::from_str(r#"{"type":"message","text":"hi"}"#).unwrap();
        assert_eq!(event.text, "hi");
        assert!(event.channel.is_empty());
    }
}
