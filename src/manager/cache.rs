// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Short-TTL cache for expensive read commands

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;
use crate::metrics::MetricsRegistry;

struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    timestamp: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.timestamp.elapsed() < self.ttl
    }
}

type Slot = Arc<tokio::sync::Mutex<Option<CacheEntry>>>;

/// Memoizes values per logical key with an individual TTL
///
/// Each key has its own async slot lock, so a burst of callers missing the
/// same key waits for one fetch instead of issuing one each. `clear` swaps
/// out every slot; a fetch still running against an old slot stores into a
/// slot nobody can reach anymore.
#[derive(Clone)]
pub(crate) struct ResponseCache {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    metrics: MetricsRegistry,
}

impl ResponseCache {
    pub(crate) fn new(metrics: MetricsRegistry) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            metrics,
        }
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.to_string()).or_default().clone()
    }

    pub(crate) async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetcher: F,
    ) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;
        if let Some(cached) = entry
            .as_ref()
            .filter(|e| e.is_fresh())
            .and_then(|e| e.data.downcast_ref::<T>())
        {
            tracing::trace!("Cache hit for '{}'", key);
            self.metrics.record_cache_lookup(key, true);
            return Ok(cached.clone());
        }

        tracing::debug!("Cache miss for '{}', fetching", key);
        self.metrics.record_cache_lookup(key, false);
        let value = fetcher().await?;
        *entry = Some(CacheEntry {
            data: Arc::new(value.clone()),
            timestamp: Instant::now(),
            ttl,
        });
        Ok(value)
    }

    pub(crate) fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = slots.len();
        slots.clear();
        if removed > 0 {
            tracing::debug!("Cleared {} cache entries", removed);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> ResponseCache {
        ResponseCache::new(MetricsRegistry::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_once_within_ttl() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..5 {
            let value = cache
                .get_or_fetch("interfaces", Duration::from_secs(5), move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["ether1".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["ether1".to_string()]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetches_after_ttl() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move { Ok::<_, AppError>(counter.fetch_add(1, Ordering::SeqCst)) };

        assert_eq!(
            cache
                .get_or_fetch("router-status", Duration::from_secs(3), fetch)
                .await
                .unwrap(),
            0
        );
        tokio::time::advance(Duration::from_millis(2_999)).await;
        assert_eq!(
            cache
                .get_or_fetch("router-status", Duration::from_secs(3), fetch)
                .await
                .unwrap(),
            0
        );
        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(
            cache
                .get_or_fetch("router-status", Duration::from_secs(3), fetch)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_collapse() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let lookups = (0..8).map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("identity", Duration::from_secs(30), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok("core".to_string())
                    })
                    .await
            })
        });
        let handles: Vec<_> = lookups.collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "core");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = cache();
        let err = cache
            .get_or_fetch::<String, _, _>("identity", Duration::from_secs(30), || async {
                Err(AppError::Command("boom".to_string()))
            })
            .await;
        assert!(err.is_err());

        let ok = cache
            .get_or_fetch("identity", Duration::from_secs(30), || async {
                Ok("core".to_string())
            })
            .await
            .unwrap();
        assert_eq!(ok, "core");
    }

    #[tokio::test]
    async fn test_independent_keys() {
        let cache = cache();
        let a = cache
            .get_or_fetch("a", Duration::from_secs(30), || async { Ok(1u32) })
            .await
            .unwrap();
        let b = cache
            .get_or_fetch("b", Duration::from_secs(30), || async { Ok(2u32) })
            .await
            .unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_miss() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        cache
            .get_or_fetch("interfaces", Duration::from_secs(5), fetch)
            .await
            .unwrap();
        cache.clear();
        assert_eq!(cache.len(), 0);
        cache
            .get_or_fetch("interfaces", Duration::from_secs(5), fetch)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
