//! staysync server entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use staysync_core::{TracingConfig, TracingOutputFormat, init_tracing};
use staysync_feeds::HttpFeedFetcher;
use tracing::info;

use staysync_server::cli::Cli;
use staysync_server::{
    AccessPolicy, AppState, InMemoryStore, ServerConfig, ServerError, ServerResult,
    SignalHandler, SyncService, router,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::daemon()
    };
    if cli.json_logs {
        tracing_config = tracing_config.with_format(TracingOutputFormat::Json);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let mut config = match cli.config {
        Some(ref path) => ServerConfig::load_from(path)?,
        None => ServerConfig::load()?,
    };
    if let Some(bind) = cli.bind {
        config.http.bind = bind;
    }
    if let Some(seed) = cli.seed {
        config.data.seed = Some(seed);
    }
    config.validate()?;

    let store = match config.data.seed {
        Some(ref path) => InMemoryStore::load(path)
            .map_err(|e| ServerError::config(e.to_string()))?,
        None => InMemoryStore::new(),
    };
    info!(properties = store.property_count(), "Store ready");

    let store = Arc::new(store);
    let fetcher = HttpFeedFetcher::new(config.feed_config())
        .map_err(|e| ServerError::config(e.to_string()))?;
    let sync = SyncService::new(store.clone(), store, Arc::new(fetcher))
        .with_lookback_days(config.calendar.lookback_days)
        .with_max_entry_nights(config.feeds.max_entry_nights);
    let access = AccessPolicy::from_tokens(&config.access.tokens);
    let state = AppState::new(sync, access, &config.cache_control())?
        .with_degraded_cache_control(&config.degraded_cache_control())?;
    let app = router(state, config.http.cors);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    let signals = SignalHandler::new();
    signals.spawn_listener();
    axum::serve(listener, app)
        .with_graceful_shutdown(signals.shutdown().wait())
        .await?;

    info!("Server stopped");
    Ok(())
}
