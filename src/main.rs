use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use submission_gateway::{
    GatewayState, MemoryQueue, RedisQueue, SubmissionQueue,
    config::{Config, StoreKind},
};
use tokio::net::TcpListener;

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, finishing in-flight requests"),
        Err(err) => {
            warn!("Cannot listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    }
}

async fn run<Q: SubmissionQueue>(config: &Config, queue: Q) -> Result<()> {
    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    let local_addr = listener.local_addr()?;
    info!("Server is running on port:{}", local_addr.port());
    let state = GatewayState::new(queue, config.strict_status);
    submission_gateway::serve(listener, state, config.body_limit, shutdown_signal()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();
    let config = Config::parse();

    match config.store {
        StoreKind::Redis => {
            let queue = RedisQueue::connect(&config.redis_url, &config.queue_name)
                .await
                .with_context(|| format!("failed to connect to {}", config.redis_url))?;
            info!(
                "Connected to {}, pushing to list \"{}\"",
                config.redis_url,
                queue.name()
            );
            run(&config, queue).await?;
        }
        StoreKind::Memory => {
            let queue = Arc::new(MemoryQueue::new());
            info!("Using in-memory list \"{}\"", config.queue_name);
            run(&config, queue.clone()).await?;
            queue.close();
            info!("{} submissions left in memory", queue.len());
        }
    }
    Ok(())
}
