//! Run command - poll, notify and echo loop

use anyhow::{Context, Result};
use room_watch_adapters::{
    listing_api::HttpListingSource,
    outbox::{OutboxMessenger, OutboxWriter},
    telegram::{TelegramClient, TelegramMessenger, TelegramUpdateFeed},
};
use room_watch_domain::{
    ListingSource, Messenger, SeenSet,
    usecases::{EchoConfig, EchoResponder, PollLoop, PollLoopConfig, RenderConfig},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::args::RunArgs;
use crate::commands::seen::open_store;
use crate::config::{AppConfig, load_chat_target, load_secret};

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    // Credentials are checked before anything touches the store or the network
    let token = load_secret(&config.telegram.bot_token_env, "bot token")?;
    let chat = load_chat_target(&config.telegram.chat_id_env)?;

    let outbox_path = if args.dry_run {
        Some(args.outbox.clone().unwrap_or_else(default_outbox_path))
    } else {
        None
    };

    if args.outbox.is_some() && !args.dry_run {
        tracing::warn!("--outbox is ignored without --dry-run");
    }

    let echo_enabled = config.telegram.echo_enabled && !args.no_echo && !args.once && !args.dry_run;

    tracing::info!(
        once = args.once,
        dry_run = args.dry_run,
        ephemeral = args.ephemeral,
        echo = echo_enabled,
        chat = %chat,
        outbox = ?outbox_path,
        "Starting room-watch run"
    );

    let telegram = Arc::new(
        TelegramClient::with_api_url(token, config.telegram.api_url.clone())
            .context("Failed to initialize Telegram client")?,
    );

    let messenger: Arc<dyn Messenger> = match outbox_path {
        Some(outbox_path) => {
            let writer = OutboxWriter::new(outbox_path.clone())
                .await
                .context("Failed to initialize outbox writer")?;
            tracing::info!(outbox = %outbox_path.display(), "Writing notifications to outbox");
            Arc::new(OutboxMessenger::new(writer))
        }
        None => Arc::new(TelegramMessenger::new(telegram.clone(), chat)),
    };

    let source: Arc<dyn ListingSource> = Arc::new(
        HttpListingSource::with_options(
            config.source.base_url.clone(),
            config.source.take,
            Duration::from_secs(config.source.timeout_secs),
        )
        .context("Failed to initialize listing source")?,
    );

    let store = open_store(&config, args.ephemeral).await?;
    let seen = SeenSet::load(store)
        .await
        .context("Failed to load seen-set")?;

    let loop_config = PollLoopConfig {
        send_interval: Duration::from_secs(config.schedule.send_interval_secs),
        retry_interval: Duration::from_secs(config.schedule.retry_interval_secs),
        render_config: RenderConfig {
            base_url: config.source.base_url.clone(),
            ..Default::default()
        },
    };

    let mut poll_loop = PollLoop::new(source, messenger, seen, loop_config);

    if args.once {
        tracing::info!("Running single poll cycle");
        let report = poll_loop.run_cycle().await.context("Poll cycle failed")?;
        tracing::info!(
            fetched = report.fetched,
            already_seen = report.already_seen,
            malformed = report.malformed,
            notified = report.notified.len(),
            "Poll cycle complete"
        );
        return Ok(());
    }

    let echo = if echo_enabled {
        let feed = Arc::new(TelegramUpdateFeed::new(telegram));
        let echo_config = EchoConfig {
            poll_timeout: Duration::from_secs(config.telegram.poll_timeout_secs),
            retry_pause: Duration::from_secs(config.telegram.retry_pause_secs),
        };
        let responder = EchoResponder::init(feed, echo_config).await;
        Some(tokio::spawn(responder.run()))
    } else {
        None
    };

    tokio::select! {
        _ = poll_loop.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            tracing::info!("Shutdown signal received");
        }
    }

    if let Some(echo) = echo {
        echo.abort();
    }

    tracing::info!(seen = poll_loop.seen().len(), "room-watch run completed");
    Ok(())
}

fn default_outbox_path() -> PathBuf {
    PathBuf::from("./outbox.jsonl")
}
