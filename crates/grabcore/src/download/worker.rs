//! Bounded pool for download work.
//!
//! Tasks run on their own tokio task behind a semaphore. A submitted task is
//! never cancelled: dropping its [`WorkerHandle`] detaches it and it still
//! runs to completion, including whatever cleanup it owns.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::download::error::FetchError;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

/// Result handle of a submitted task.
#[derive(Debug)]
pub struct WorkerHandle<T> {
    inner: JoinHandle<T>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Workers currently free.
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    /// Queues `task`; it starts as soon as a worker is free.
    pub fn submit<F, T>(&self, task: F) -> WorkerHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let inner = tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only fails if that changes.
            let _permit = permits.acquire_owned().await.ok();
            task.await
        });
        WorkerHandle { inner }
    }
}

impl<T> WorkerHandle<T> {
    /// Waits for the task. A panicked task surfaces as [`FetchError::WorkerLost`].
    pub async fn join(self) -> Result<T, FetchError> {
        self.inner.await.map_err(|e| {
            log::error!("Worker task failed: {}", e);
            FetchError::WorkerLost
        })
    }
}
