//! Single-flight deduplication of concurrent identical resolutions.
//!
//! Callers for the same key share one [`OnceCell`]. The first caller to reach
//! it runs the work; the others wait for its value. If that caller's future is
//! dropped mid-flight, the cell stays empty and one of the waiters runs its
//! own work instead.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

/// Registry of in-flight work keyed by query.
#[derive(Debug)]
pub(crate) struct SingleFlight<K, V> {
    inflight: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Run `work` for `key`, or wait for an identical call already running.
    pub(crate) async fn run<F, Fut>(&self, key: &K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut inflight = self.inflight.lock();
            Arc::clone(inflight.entry(key.clone()).or_default())
        };
        let departure = Departure {
            flight: self,
            key,
            cell,
        };
        departure.cell.get_or_init(work).await.clone()
    }

    /// Number of keys with an active or unclaimed flight.
    #[cfg(test)]
    fn pending(&self) -> usize {
        self.inflight.lock().len()
    }
}

/// Unregisters a flight when its last interested caller leaves.
struct Departure<'a, K, V>
where
    K: Eq + Hash,
{
    flight: &'a SingleFlight<K, V>,
    key: &'a K,
    cell: Arc<OnceCell<V>>,
}

impl<K, V> Drop for Departure<'_, K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut inflight = self.flight.inflight.lock();
        let Some(current) = inflight.get(self.key) else {
            return;
        };
        // The registry holds one reference and this caller another.
        let abandoned = Arc::strong_count(&self.cell) <= 2;
        if Arc::ptr_eq(current, &self.cell) && (self.cell.initialized() || abandoned) {
            inflight.remove(self.key);
        }
    }
}
