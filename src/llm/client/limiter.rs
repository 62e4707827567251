//! Bound on simultaneous in-flight requests.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::LlmError;

/// Counting limiter owned by an `LlmClient`.
///
/// Clones share the same permits; separately constructed limiters do not
/// interfere with each other.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimit {
    pub const DEFAULT_CAPACITY: usize = 5;

    /// Create a limiter with `capacity` permits (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }

    /// Wait for a permit. The permit is returned when dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, LlmError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LlmError::Configuration("request limiter was closed".to_string()))
    }

    /// Run `fut` while holding a permit; the permit is released however `fut` ends.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, LlmError>
    where
        F: Future<Output = Result<T, LlmError>>,
    {
        let _permit = self.acquire().await?;
        fut.await
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
