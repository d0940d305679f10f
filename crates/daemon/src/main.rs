//! Ticketflow - Main Entry Point
//! Queue distribution daemon: JSON-RPC server, protection sweeper, rebalancer

mod config;

use anyhow::{Context, Result};
use config::DaemonConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use ticketflow_api_rpc::{RpcHandler, RpcServer};
use ticketflow_core::application::{
    shutdown_channel, ProtectionSweeper, QueueLoadBalancer, RebalanceScheduler, RebalanceService,
    TicketRoutingService, TransferProtectionCache,
};
use ticketflow_core::port::time_provider::SystemTimeProvider;
use ticketflow_infra_sqlite::{
    create_pool, run_migrations, SqliteQueueRepository, SqliteTicketRepository,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (JSON in production - ADR-050)
    let log_format =
        std::env::var("TICKETFLOW_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("ticketflow=info"))?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Ticketflow v{} starting...", VERSION);

    // 2. Load configuration
    let config = DaemonConfig::from_env()?;
    info!(
        db_path = %config.db_path,
        protection_window_secs = config.protection_window.as_secs(),
        rebalance_interval_secs = config.rebalance_interval.as_secs(),
        "Configuration loaded"
    );

    // 3. Initialize database
    if !config.db_path.contains(":memory:") {
        if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
    }
    let pool = create_pool(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let queue_repo = Arc::new(SqliteQueueRepository::new(pool.clone()));
    let ticket_repo = Arc::new(SqliteTicketRepository::new(
        pool.clone(),
        time_provider.clone(),
    ));

    let protection = Arc::new(TransferProtectionCache::new(
        config.protection(),
        time_provider.clone(),
    ));
    let balancer = Arc::new(QueueLoadBalancer::new(
        queue_repo.clone(),
        ticket_repo.clone(),
        time_provider.clone(),
    ));
    let routing = Arc::new(TicketRoutingService::new(
        balancer.clone(),
        protection.clone(),
        queue_repo.clone(),
        ticket_repo.clone(),
    ));
    let rebalance = Arc::new(RebalanceService::new(
        balancer.clone(),
        protection.clone(),
        queue_repo,
        ticket_repo,
        config.rebalance(),
    ));

    // 5. Start JSON-RPC server
    let handler = RpcHandler::new(routing, balancer, protection.clone(), rebalance.clone());
    let (rpc_handle, rpc_addr) = RpcServer::new(config.rpc(), handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;
    info!(addr = %rpc_addr, "RPC listening");

    // 6. Start background tasks
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let sweeper = ProtectionSweeper::new(protection, config.sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx.clone()));

    let rebalance_handle = if config.rebalance_enabled() {
        let scheduler = RebalanceScheduler::new(rebalance);
        Some(tokio::spawn(scheduler.run(shutdown_rx)))
    } else {
        info!("Scheduled rebalancing disabled");
        None
    };

    info!("System ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;

    match tokio::time::timeout(SHUTDOWN_GRACE, sweeper_handle).await {
        Ok(Ok(swept)) => info!(swept_total = swept, "Sweeper finished"),
        Ok(Err(e)) => tracing::error!(error = ?e, "Sweeper task failed"),
        Err(_) => tracing::warn!("Sweeper did not stop in time"),
    }
    if let Some(handle) = rebalance_handle {
        if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
            tracing::warn!("Rebalance scheduler did not stop in time");
        }
    }
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
