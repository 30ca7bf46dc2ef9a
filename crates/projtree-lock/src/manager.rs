//! Keyed async mutex with acquisition and hold timeouts.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use projtree_core::config::LockConfig;
use projtree_core::error::AppError;
use projtree_core::result::AppResult;

use crate::keys::lock_key;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Hands out one mutex per `(namespace, id)` key.
///
/// Clones share the same key map, so a handle returned by
/// [`LockManager::with_timeout`] excludes the same callers as the original.
#[derive(Debug, Clone)]
pub struct LockManager {
    locks: Arc<LockMap>,
    max_wait: Duration,
    hold_timeout: Duration,
}

impl LockManager {
    /// Create a lock manager from configuration.
    pub fn new(config: &LockConfig) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            max_wait: Duration::from_secs(config.max_wait_seconds),
            hold_timeout: Duration::from_secs(config.default_timeout_seconds),
        }
    }

    /// A handle sharing this manager's locks but expecting holders to
    /// finish within `seconds`.
    pub fn with_timeout(&self, seconds: u64) -> Self {
        Self {
            locks: Arc::clone(&self.locks),
            max_wait: self.max_wait,
            hold_timeout: Duration::from_secs(seconds),
        }
    }

    /// Hold timeout applied by this handle.
    pub fn hold_timeout(&self) -> Duration {
        self.hold_timeout
    }

    /// Number of keys currently tracked (held or awaited).
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }

    /// Acquire the lock for `namespace` and `id`.
    ///
    /// Waits at most the configured acquisition limit and fails with a
    /// `Conflict` error after that.
    pub async fn acquire(&self, namespace: &str, id: impl Display) -> AppResult<LockGuard> {
        let key = lock_key(namespace, id);
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let acquired = tokio::time::timeout(self.max_wait, Arc::clone(&mutex).lock_owned()).await;
        let guard = match acquired {
            Ok(guard) => guard,
            Err(_) => {
                drop(mutex);
                self.locks.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
                warn!(key = %key, "Timed out acquiring lock");
                return Err(AppError::conflict(format!("timed out acquiring lock {key}")));
            }
        };

        debug!(key = %key, "Lock acquired");
        Ok(LockGuard {
            guard: Some(guard),
            key,
            locks: Arc::clone(&self.locks),
            acquired_at: Instant::now(),
            hold_timeout: self.hold_timeout,
        })
    }

    /// Run `operation` while holding the lock for `namespace` and `id`.
    ///
    /// The lock is released when the operation completes, whether it
    /// succeeded or failed.
    pub async fn run_with_lock<F, T>(
        &self,
        namespace: &str,
        id: impl Display,
        operation: F,
    ) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let _guard = self.acquire(namespace, id).await?;
        operation.await
    }
}

/// RAII guard for a held lock.
#[derive(Debug)]
pub struct LockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: Arc<LockMap>,
    acquired_at: Instant,
    hold_timeout: Duration,
}

impl LockGuard {
    /// Key of the held lock.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let held = self.acquired_at.elapsed();
        if held > self.hold_timeout {
            warn!(
                key = %self.key,
                held_ms = held.as_millis() as u64,
                timeout_ms = self.hold_timeout.as_millis() as u64,
                "Lock held longer than its timeout"
            );
        }

        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
        debug!(key = %self.key, "Lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(max_wait_seconds: u64) -> LockConfig {
        LockConfig {
            max_wait_seconds,
            default_timeout_seconds: 30,
            resync_timeout_seconds: 360,
        }
    }

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let manager = LockManager::new(&config(10));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                manager
                    .run_with_lock("tree_update", "p1", async {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        inside.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(manager.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let manager = LockManager::new(&config(1));
        let _a = manager.acquire("tree_update", "p1").await.unwrap();
        let b = manager.acquire("tree_update", "p2").await;
        assert!(b.is_ok());
        let c = manager.acquire("structure_update", "p1").await;
        assert!(c.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out() {
        let manager = LockManager::new(&config(10));
        let _held = manager.acquire("tree_update", "p1").await.unwrap();
        let err = manager.acquire("tree_update", "p1").await.unwrap_err();
        assert_eq!(err.kind, projtree_core::ErrorKind::Conflict);
        assert!(err.message.contains("timed out acquiring lock"));
    }

    #[tokio::test]
    async fn test_released_on_error() {
        let manager = LockManager::new(&config(1));
        let result: AppResult<()> = manager
            .run_with_lock("tree_update", "p1", async {
                Err(AppError::internal("boom"))
            })
            .await;
        assert!(result.is_err());
        assert!(manager.acquire("tree_update", "p1").await.is_ok());
    }

    #[tokio::test]
    async fn test_with_timeout_shares_locks() {
        let manager = LockManager::new(&config(1));
        let long = manager.with_timeout(360);
        assert_eq!(long.hold_timeout(), Duration::from_secs(360));
        let _held = long.acquire("structure_update", "p1").await.unwrap();
        assert_eq!(manager.active_keys(), 1);
    }
}
