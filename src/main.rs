use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use whiteboard_sync::metrics::{self, Metrics};
use whiteboard_sync::{Cascade, Config, EventStore, Fanout, FileStore, RedisBus, Rooms, ScyllaStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug whiteboard-sync
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,whiteboard_sync=debug")),
        )
        .init();

    tracing::info!("🚀 Starting whiteboard sync node");

    let config = Config::from_env().context("Invalid configuration")?;

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // Metrics HTTP server runs on its own thread and runtime
    let metrics_server = metrics.clone();
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Metrics runtime error: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_server, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 2. Persistence cascade ===
    let mut cascade = Cascade::new(metrics.clone());

    match &config.durable {
        Some(scylla) => {
            tracing::info!(nodes = ?scylla.nodes, "Durable store: ScyllaDB (connects on first use)");
            cascade = cascade.with_durable(Arc::new(ScyllaStore::new(scylla.clone(), metrics.clone())));
        }
        None => tracing::warn!("SCYLLA_NODES not set. Durable persistence disabled."),
    }

    match &config.file {
        Some(file) => {
            let store = FileStore::open(&file.dir)
                .await
                .with_context(|| format!("Cannot create board directory {}", file.dir.display()))?;
            tracing::info!(dir = %file.dir.display(), delay = ?file.save_delay, "File persistence enabled");
            cascade = cascade.with_file(store, file.save_delay);
        }
        None => tracing::info!("File persistence disabled"),
    }

    let store = EventStore::new(cascade);

    // === 3. Fanout bus ===
    let bus = Arc::new(RedisBus::new(&config.redis, metrics.clone())?);
    let rooms = Arc::new(Rooms::default());
    let fanout = Arc::new(Fanout::new(bus, store.clone(), rooms));

    tracing::info!(
        origin = %fanout.origin(),
        channel = %config.redis.channel,
        redis = %config.redis.url(),
        "Starting bus subscriber"
    );
    let subscriber = fanout.clone().start().await;

    // === 4. Run until interrupted ===
    tokio::signal::ctrl_c().await?;
    tracing::info!("⏳ Shutting down, flushing pending board writes...");

    subscriber.abort();
    store.flush_pending();
    store.settle().await;

    tracing::info!("🎉 Shutdown complete");
    Ok(())
}
