#![forbid(unsafe_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

mod cli;
mod config;
mod emoji;
mod pusher;
mod relay;
mod slack;
mod utils;
mod web;

use cli::{Cli, Commands};
use config::Config;
use emoji::{EmojiDirectoryCache, SystemClock};
use pusher::PusherClient;
use relay::{InboundWebhookHandler, OutboundCommandHandler, RelayPublisher};
use slack::SlackClient;
use utils::metrics::Metrics;
use web::{WebServer, WebState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&cli.config).await,
        Commands::ValidateConfig => validate_config(&cli.config),
        Commands::Normalize { token, target } => {
            println!("{}", emoji::normalize(&token, target));
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load_from_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn validate_config(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    config
        .validate_strict()
        .context("configuration is incomplete")?;
    println!("configuration is valid");
    Ok(())
}

/// Without the bot's user id, reactions made through `/api/chat` come back
/// through the Events API and get published a second time.
async fn resolve_bot_user_id(config: &mut Config) -> Result<()> {
    if config.slack.bot_user_id.is_some() || config.slack.require_bot_token().is_err() {
        return Ok(());
    }

    let client = SlackClient::new(Arc::new(config.clone()))?;
    match client.bot_user_id().await {
        Ok(user_id) => {
            info!("resolved slack bot user id={}", user_id);
            config.slack.bot_user_id = Some(user_id);
        }
        Err(err) => warn!(
            "could not resolve slack bot user id, own reactions will be relayed twice: {}",
            err
        ),
    }
    Ok(())
}

async fn serve(config_path: &Path) -> Result<()> {
    let mut config = load_config(config_path)?;
    utils::logging::init_tracing(&config.logging);
    Metrics::mark_started();
    info!("slack-pusher-relay starting up");
    config.warn_missing_settings();
    resolve_bot_user_id(&mut config).await?;
    let config = Arc::new(config);

    let slack_client = Arc::new(SlackClient::new(config.clone())?);
    let pusher_client = Arc::new(PusherClient::new(config.clone())?);

    let emoji_cache = Arc::new(EmojiDirectoryCache::new(
        slack_client.clone(),
        Arc::new(SystemClock),
        config.relay.emoji_cache_ttl(),
    ));
    if config.slack.require_bot_token().is_ok() {
        let cache = emoji_cache.clone();
        tokio::spawn(async move {
            cache.refresh().await;
        });
    }

    let publisher = RelayPublisher::new(pusher_client, config.clone());
    let inbound =
        InboundWebhookHandler::new(config.clone(), emoji_cache.clone(), publisher.clone());
    let outbound = OutboundCommandHandler::new(config.clone(), slack_client, publisher);

    let web_server = WebServer::new(WebState {
        config: config.clone(),
        inbound,
        outbound,
        emoji_cache,
        started_at: Instant::now(),
    });

    let web_handle = tokio::spawn(async move {
        if let Err(e) = web_server.start().await {
            error!("web server error: {}", e);
        }
    });
    tokio::pin!(web_handle);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, beginning shutdown");
        },
        _ = &mut web_handle => {
            info!("web server task exited, beginning shutdown");
        },
    }

    web_handle.abort();
    info!("slack-pusher-relay shutting down");
    Ok(())
}
