//! Bounded-wait reader/writer lock
//!
//! TigerStyle: A stuck lock must be observable, not silent. Acquisition
//! attempts are bounded by a per-attempt timeout; on expiry the contention
//! is logged and counted, then the acquisition retries after a backoff.
//! Retrying is indefinite (availability over fast failure for a rare,
//! transient condition); both the attempt timeout and the backoff are
//! explicit configuration so the behavior is testable under contention.

use shoal_core::constants::{LOCK_ATTEMPT_TIMEOUT_MS_DEFAULT, LOCK_RETRY_BACKOFF_MS_DEFAULT};
use shoal_core::io::TimeProvider;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Configuration for bounded lock acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// How long a single acquisition attempt may wait
    pub attempt_timeout_ms: u64,
    /// Backoff between failed attempts
    pub retry_backoff_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: LOCK_ATTEMPT_TIMEOUT_MS_DEFAULT,
            retry_backoff_ms: LOCK_RETRY_BACKOFF_MS_DEFAULT,
        }
    }
}

impl LockConfig {
    /// Configuration with short timeouts for tests
    pub fn for_testing() -> Self {
        Self {
            attempt_timeout_ms: 5,
            retry_backoff_ms: 1,
        }
    }
}

/// Reader/writer lock with bounded-wait, logged, retried acquisition
#[derive(Debug)]
pub struct BoundedRwLock<T> {
    inner: RwLock<T>,
    config: LockConfig,
    time: Arc<dyn TimeProvider>,
    /// Name used in contention log lines
    name: &'static str,
    /// Failed acquisition attempts since creation
    contention_count: AtomicU64,
}

impl<T> BoundedRwLock<T> {
    /// Create a new bounded lock around `value`
    pub fn new(
        value: T,
        name: &'static str,
        config: LockConfig,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        debug_assert!(config.attempt_timeout_ms > 0);

        Self {
            inner: RwLock::new(value),
            config,
            time,
            name,
            contention_count: AtomicU64::new(0),
        }
    }

    /// Acquire the reader lock, logging and retrying on contention
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        let mut attempts: u32 = 0;
        loop {
            let wait = Duration::from_millis(self.config.attempt_timeout_ms);
            match tokio::time::timeout(wait, self.inner.read()).await {
                Ok(guard) => return guard,
                Err(_) => {
                    attempts += 1;
                    self.contention_count.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        lock = self.name,
                        attempts,
                        timeout_ms = self.config.attempt_timeout_ms,
                        "reader lock not acquired within attempt timeout, retrying"
                    );
                    self.time.sleep_ms(self.config.retry_backoff_ms).await;
                }
            }
        }
    }

    /// Acquire the writer lock, logging and retrying on contention
    pub async fn write(&self) -> RwLockWriteGuard<'_, T> {
        let mut attempts: u32 = 0;
        loop {
            let wait = Duration::from_millis(self.config.attempt_timeout_ms);
            match tokio::time::timeout(wait, self.inner.write()).await {
                Ok(guard) => return guard,
                Err(_) => {
                    attempts += 1;
                    self.contention_count.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        lock = self.name,
                        attempts,
                        timeout_ms = self.config.attempt_timeout_ms,
                        "writer lock not acquired within attempt timeout, retrying"
                    );
                    self.time.sleep_ms(self.config.retry_backoff_ms).await;
                }
            }
        }
    }

    /// Total failed acquisition attempts since creation
    pub fn contention_count(&self) -> u64 {
        self.contention_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::io::WallClockTime;

    fn test_lock(value: u32) -> Arc<BoundedRwLock<u32>> {
        Arc::new(BoundedRwLock::new(
            value,
            "test",
            LockConfig::for_testing(),
            Arc::new(WallClockTime::new()),
        ))
    }

    #[tokio::test]
    async fn test_uncontended_access() {
        let lock = test_lock(7);

        assert_eq!(*lock.read().await, 7);
        *lock.write().await = 9;
        assert_eq!(*lock.read().await, 9);
        assert_eq!(lock.contention_count(), 0);
    }

    #[tokio::test]
    async fn test_contended_write_retries_until_released() {
        let lock = test_lock(0);

        let guard = lock.read().await;

        let contended = lock.clone();
        let writer = tokio::spawn(async move {
            *contended.write().await = 1;
        });

        // Give the writer time to fail at least one bounded attempt.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(lock.contention_count() > 0);

        drop(guard);
        writer.await.unwrap();
        assert_eq!(*lock.read().await, 1);
    }

    #[tokio::test]
    async fn test_backoff_uses_injected_clock() {
        use shoal_core::io::ManualClock;

        let clock = Arc::new(ManualClock::new());
        let lock = Arc::new(BoundedRwLock::new(
            0u32,
            "test",
            LockConfig::for_testing(),
            clock.clone(),
        ));

        let guard = lock.write().await;

        let contended = lock.clone();
        let reader = tokio::spawn(async move {
            let _ = *contended.read().await;
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(guard);
        reader.await.unwrap();

        // Each failed attempt slept through the injected clock.
        assert!(clock.now_ms() > 0);
    }
}
