use std::{future::Future, sync::Arc};

use axum::{Router, extract::DefaultBodyLimit};
use tokio::net::TcpListener;

pub mod api;
pub mod config;
pub mod queue;

pub use api::GatewayState;
pub use queue::{MemoryQueue, QueueError, RedisQueue, SubmissionQueue};

/// The gateway router with its state attached.
pub fn app<Q: SubmissionQueue>(state: GatewayState<Q>, body_limit: usize) -> Router {
    api::routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(Arc::new(state))
}

/// Serves the gateway on `listener` until `shutdown` resolves.
pub async fn serve<Q: SubmissionQueue>(
    listener: TcpListener,
    state: GatewayState<Q>,
    body_limit: usize,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app(state, body_limit))
        .with_graceful_shutdown(shutdown)
        .await
}
