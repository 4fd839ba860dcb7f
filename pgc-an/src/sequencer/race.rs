//! First-settled-wins combinator
//!
//! Used to race picture inference against its deadline. The losing side is
//! dropped by the race; when the loser is a spawned task, dropping its
//! `JoinHandle` detaches the task instead of aborting it, so in-flight
//! requests run to completion and their result is discarded.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Which of two raced futures settled first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<A, B> {
    First(A),
    Second(B),
}

/// Await both futures, return the output of whichever settles first
///
/// When both are ready on the same poll, `first` wins.
pub async fn first_settled<FA, FB>(first: FA, second: FB) -> Settled<FA::Output, FB::Output>
where
    FA: Future,
    FB: Future,
{
    tokio::select! {
        biased;
        output = first => Settled::First(output),
        output = second => Settled::Second(output),
    }
}

/// Run `future` as a detached task and wait for it at most `deadline`
///
/// Returns `None` on timeout or if the task panicked. On timeout the task
/// keeps running in the background and its eventual output is dropped.
pub async fn settle_within<F>(future: F, deadline: Duration) -> Option<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let task = tokio::spawn(future);

    match first_settled(task, tokio::time::sleep(deadline)).await {
        Settled::First(Ok(output)) => Some(output),
        Settled::First(Err(e)) => {
            warn!("Raced task failed: {}", e);
            None
        }
        Settled::Second(()) => {
            debug!("Deadline of {:?} elapsed, discarding late result", deadline);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_settled_picks_faster() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            "slow"
        };
        let fast = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            7
        };

        assert_eq!(first_settled(slow, fast).await, Settled::Second(7));
    }

    #[tokio::test]
    async fn test_first_settled_tie_goes_to_first() {
        let result = first_settled(async { 'a' }, async { 'b' }).await;
        assert_eq!(result, Settled::First('a'));
    }

    #[tokio::test]
    async fn test_settle_within_returns_value() {
        let result = settle_within(async { 42 }, Duration::from_secs(1)).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn test_loser_is_discarded_not_cancelled() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = settle_within(
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                flag.store(true, Ordering::SeqCst);
                "late"
            },
            Duration::from_millis(5),
        )
        .await;

        assert_eq!(result, None);
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(finished.load(Ordering::SeqCst), "detached task should run to completion");
    }

    #[tokio::test]
    async fn test_panicking_task_yields_none() {
        let result: Option<u8> = settle_within(
            async {
                if true {
                    panic!("boom");
                }
                0u8
            },
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(result, None);
    }
}
