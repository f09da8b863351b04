use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// Background executor for idempotent per-key jobs.
///
/// At most one job per key runs at a time; submissions for a key that is
/// already in flight are dropped. Jobs run on the ambient tokio runtime.
#[derive(Clone, Debug, Default)]
pub struct RankBuildQueue {
    in_flight: Arc<DashMap<String, ()>>,
}

/// Clears the in-flight marker even when the job panics.
struct InFlight {
    key: String,
    in_flight: Arc<DashMap<String, ()>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

impl RankBuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `job` unless a job for `key` is running. Returns whether the job
    /// was accepted.
    pub fn submit<F>(&self, key: impl Into<String>, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => {
                debug!("build for {key} already in flight");
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(());
            }
        }
        let guard = InFlight {
            key,
            in_flight: Arc::clone(&self.in_flight),
        };
        tokio::spawn(async move {
            let _guard = guard;
            job.await;
        });
        true
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
