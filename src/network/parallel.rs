//! Concurrent map-over-list helpers

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::warn;

/// Map `f` over `items` with at most `width` futures in flight, keeping input order
pub async fn par_map<I, T, F, Fut>(items: I, width: usize, f: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(items)
        .map(f)
        .buffered(width.max(1))
        .collect()
        .await
}

/// Like [`par_map`] for fallible producers of lists; failures are logged and dropped
pub async fn par_flat_map_catching<I, T, F, Fut>(items: I, width: usize, f: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    par_map(items, width, f)
        .await
        .into_iter()
        .filter_map(|result| match result {
            Ok(values) => Some(values),
            Err(e) => {
                warn!("Parallel task failed: {:#}", e);
                None
            }
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_par_map_preserves_order() {
        let out = par_map(vec![30u64, 10, 20], 3, |ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ms * 2
        })
        .await;
        assert_eq!(out, vec![60, 20, 40]);
    }

    #[tokio::test]
    async fn test_par_map_respects_width() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        par_map(0..8, 2, |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_catching_drops_failures() {
        let out = par_flat_map_catching(vec![1, 2, 3], 2, |n| async move {
            if n == 2 {
                Err(anyhow::anyhow!("boom"))
            } else {
                Ok(vec![n, n * 10])
            }
        })
        .await;
        assert_eq!(out, vec![1, 10, 3, 30]);
    }

    #[tokio::test]
    async fn test_zero_width_still_runs() {
        let out = par_map(vec![1, 2], 0, |n| async move { n + 1 }).await;
        assert_eq!(out, vec![2, 3]);
    }
}
