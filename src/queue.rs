use std::{
    collections::VecDeque,
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use redis::{AsyncCommands, aio::ConnectionManager};
use thiserror::Error;
use tokio::{select, sync::Notify, time::sleep};

pub const DEFAULT_QUEUE_NAME: &str = "submission";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("redis push failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("queue is closed")]
    Closed,
}

/// A list-typed queue where every push lands at the head.
pub trait SubmissionQueue: Send + Sync + 'static {
    /// Pushes `entry` as the newest element and returns the list length after the push.
    fn push(&self, entry: String) -> impl Future<Output = Result<i64, QueueError>> + Send;
}

impl<Q: SubmissionQueue> SubmissionQueue for Arc<Q> {
    fn push(&self, entry: String) -> impl Future<Output = Result<i64, QueueError>> + Send {
        (**self).push(entry)
    }
}

/// Queue backed by a Redis list, written with `LPUSH`.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
    name: String,
}

impl RedisQueue {
    pub async fn connect(url: &str, name: impl Into<String>) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        // the manager retries its first connect with backoff; fail once instead
        drop(client.get_multiplexed_async_connection().await?);
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            name: name.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SubmissionQueue for RedisQueue {
    async fn push(&self, entry: String) -> Result<i64, QueueError> {
        // clones share one multiplexed connection
        let mut conn = self.conn.clone();
        let len: i64 = conn.lpush(&self.name, entry).await?;
        Ok(len)
    }
}

/// In-process list with the same head-push semantics as the Redis queue.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    notify_incoming: Notify,
    closed: AtomicBool,
    entries: Mutex<VecDeque<String>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the oldest entry, waiting up to `timeout` for one to arrive.
    pub async fn pop_with_timeout(&self, timeout: Duration) -> Option<String> {
        let mut timeout = Box::pin(sleep(timeout));
        loop {
            let notified = self.notify_incoming.notified();
            if let Some(entry) = self.entries.lock().expect("Mutex poisoned").pop_back() {
                return Some(entry);
            }
            select! {
                _ = notified => {},
                _ = &mut timeout => {
                    return None;
                },
            }
        }
    }

    /// Makes every later push fail with [`QueueError::Closed`]. Queued entries stay poppable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("Mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in list order, head first, like `LRANGE 0 -1`.
    pub fn snapshot(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("Mutex poisoned");
        entries.iter().cloned().collect()
    }
}

impl SubmissionQueue for MemoryQueue {
    async fn push(&self, entry: String) -> Result<i64, QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }
        let len = {
            let mut entries = self.entries.lock().expect("Mutex poisoned");
            entries.push_front(entry);
            entries.len()
        };
        self.notify_incoming.notify_one();
        Ok(len as i64)
    }
}
