// src/main.rs

//! Demo entry point: wires up tracing and configuration, builds an in-memory management
//! context, and drives a short start/resize/replace/stop scenario so the controller can be
//! exercised without a real management backend.

use anyhow::Result;
use clusterd::config::ClusterConfig;
use clusterd::core::entity::memory::MemoryManagementContext;
use clusterd::core::tasks::TokioTaskExecutor;
use clusterd::Controller;
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*, reload};

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("clusterd version {VERSION}");
        return Ok(());
    }

    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config = match ClusterConfig::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let initial_log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let (filter, reload_handle) = reload::Layer::new(EnvFilter::new(initial_log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_ansi(true))
        .init();
    let _reload_handle = Arc::new(reload_handle);

    clusterd::core::metrics::init();

    if let Err(e) = run_demo(config).await {
        error!("controller error: {e}");
        return Err(e.into());
    }

    Ok(())
}

/// Drives a minimal scenario against an in-memory management context: start the cluster,
/// grow it, replace a member, then stop it. Real deployments would plug in their own
/// `ManagementContext` and never call this function.
async fn run_demo(config: ClusterConfig) -> Result<(), clusterd::ClusterError> {
    let management = Arc::new(MemoryManagementContext::new("datacenter-1", 3));
    let root = management.root();
    let executor = Arc::new(TokioTaskExecutor);

    let controller = Controller::new(config, management.clone(), executor);

    controller.start(Some(root)).await?;
    info!(members = controller.state().member_count().await, "cluster started");

    controller.grow(2).await?;
    info!(members = controller.state().member_count().await, "cluster grown");

    let some_member_id = controller
        .state()
        .member_ids()
        .await
        .into_iter()
        .next()
        .expect("at least one member after start");
    let replacement_id = controller.replace_member(&some_member_id).await?;
    info!(%replacement_id, "member replaced");

    controller.stop().await?;
    info!("cluster stopped");

    Ok(())
}
