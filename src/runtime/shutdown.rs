//! Cooperative shutdown with in-flight game draining.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::info;

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    active_games: AtomicUsize,
    shutdown: Notify,
    drained: Notify,
}

/// Shared shutdown flag plus a count of games still running.
///
/// Clones share state. Loops check [`is_shutdown_requested`] before starting
/// a game and hold a [`GameGuard`] while it runs.
///
/// [`is_shutdown_requested`]: ShutdownCoordinator::is_shutdown_requested
#[derive(Clone, Debug, Default)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every loop to stop. Idempotent.
    pub fn request_shutdown(&self) {
        if !self.inner.requested.swap(true, Ordering::SeqCst) {
            info!(active_games = self.active_games(), "shutdown requested");
        }
        self.inner.shutdown.notify_waiters();
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Mark a game as running until the guard drops.
    #[must_use]
    pub fn game_guard(&self) -> GameGuard {
        self.inner.active_games.fetch_add(1, Ordering::SeqCst);
        GameGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    #[must_use]
    pub fn active_games(&self) -> usize {
        self.inner.active_games.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait_for_shutdown(&self) {
        loop {
            let notified = self.inner.shutdown.notified();
            if self.is_shutdown_requested() {
                return;
            }
            notified.await;
        }
    }

    /// Resolves once no game guard is alive.
    pub async fn wait_for_drain(&self) {
        loop {
            let notified = self.inner.drained.notified();
            if self.active_games() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// RAII marker for a running game.
#[derive(Debug)]
pub struct GameGuard {
    inner: Arc<Inner>,
}

impl Drop for GameGuard {
    fn drop(&mut self) {
        if self.inner.active_games.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_guard_counts() {
        let shutdown = ShutdownCoordinator::new();
        let a = shutdown.game_guard();
        let b = shutdown.clone().game_guard();
        assert_eq!(shutdown.active_games(), 2);
        drop(a);
        assert_eq!(shutdown.active_games(), 1);
        drop(b);
        assert_eq!(shutdown.active_games(), 0);
    }

    #[test]
    fn test_request_is_shared() {
        let shutdown = ShutdownCoordinator::new();
        let clone = shutdown.clone();
        assert!(!clone.is_shutdown_requested());
        shutdown.request_shutdown();
        shutdown.request_shutdown();
        assert!(clone.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_wait_for_drain() {
        let shutdown = ShutdownCoordinator::new();
        shutdown.wait_for_drain().await;

        let guard = shutdown.game_guard();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait_for_drain().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_shutdown() {
        let shutdown = ShutdownCoordinator::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait_for_shutdown().await })
        };
        shutdown.request_shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
