//! Mutation watchdog
//!
//! Page contexts report DOM mutations (infinite scroll, live updates,
//! single-page navigation). The watchdog waits for a quiet period of
//! `debounce` after the last mutation before firing its callback once,
//! so a burst of mutations produces a single fresh run.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

pub struct MutationWatchdog {
    tx: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
    debounce: Duration,
}

impl MutationWatchdog {
    /// Start the debounce loop
    pub fn spawn<F, Fut>(debounce: Duration, on_quiet: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Restart the quiet period on every further mutation
                loop {
                    match timeout(debounce, rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }

                debug!("No mutations for {:?}, triggering re-check", debounce);
                on_quiet().await;
            }
        });

        Self { tx, task, debounce }
    }

    /// Record a mutation
    pub fn notify(&self) {
        if self.tx.send(()).is_err() {
            debug!("Watchdog loop has stopped, mutation ignored");
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Drop for MutationWatchdog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_watchdog(debounce: Duration) -> (MutationWatchdog, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let watchdog = MutationWatchdog::spawn(debounce, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (watchdog, fired)
    }

    #[tokio::test]
    async fn test_burst_fires_once() {
        let (watchdog, fired) = counting_watchdog(Duration::from_millis(60));

        for _ in 0..10 {
            watchdog.notify();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0, "still inside the quiet period");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_separate_bursts_fire_separately() {
        let (watchdog, fired) = counting_watchdog(Duration::from_millis(30));

        watchdog.notify();
        tokio::time::sleep(Duration::from_millis(150)).await;
        watchdog.notify();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_mutation_no_fire() {
        let (_watchdog, fired) = counting_watchdog(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
