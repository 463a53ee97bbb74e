//! In-memory registry of dispatched jobs and their cancellation tokens.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tracks which jobs are in flight and how to cancel them.
///
/// Cloning is cheap and yields a handle to the same map. The lock only ever
/// guards map mutation and is never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<i64, CancellationToken>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, CancellationToken>> {
        // A panic while holding the guard cannot leave the map half-mutated.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `token` for `job_id`, replacing any previous token.
    pub fn register(&self, job_id: i64, token: CancellationToken) {
        if self.lock().insert(job_id, token).is_some() {
            debug!(job_id, "Replaced existing registry entry");
        }
    }

    /// Remove and signal the token for `job_id`.
    ///
    /// Returns `false` when the job is not registered.
    pub fn cancel(&self, job_id: i64) -> bool {
        let token = self.lock().remove(&job_id);
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove `job_id` without signalling it.
    pub fn unregister(&self, job_id: i64) {
        self.lock().remove(&job_id);
    }

    /// Signal every registered token, leaving the entries in place.
    ///
    /// Returns the ids of the jobs signalled, in no particular order.
    pub fn cancel_all(&self) -> Vec<i64> {
        let jobs = self.lock();
        jobs.iter()
            .map(|(job_id, token)| {
                token.cancel();
                *job_id
            })
            .collect()
    }

    pub fn contains(&self, job_id: i64) -> bool {
        self.lock().contains_key(&job_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Unregisters a job when dropped, so every exit path of a job task
/// (including unwinding) clears its registry entry.
pub(crate) struct RegistryGuard {
    registry: JobRegistry,
    job_id: i64,
}

impl RegistryGuard {
    pub(crate) fn new(registry: JobRegistry, job_id: i64) -> Self {
        Self { registry, job_id }
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.unregister(self.job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_signals_and_removes() {
        let registry = JobRegistry::new();
        let token = CancellationToken::new();
        registry.register(42, token.clone());

        assert!(registry.cancel(42));
        assert!(token.is_cancelled());
        assert!(!registry.contains(42));
    }

    #[test]
    fn test_cancel_unknown_job() {
        let registry = JobRegistry::new();
        assert!(!registry.cancel(7));
    }

    #[test]
    fn test_second_cancel_finds_nothing() {
        let registry = JobRegistry::new();
        registry.register(1, CancellationToken::new());

        assert!(registry.cancel(1));
        assert!(!registry.cancel(1));
    }

    #[test]
    fn test_register_overwrites() {
        let registry = JobRegistry::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        registry.register(5, first.clone());
        registry.register(5, second.clone());

        assert_eq!(registry.len(), 1);
        assert!(registry.cancel(5));
        assert!(second.is_cancelled());
        assert!(!first.is_cancelled());
    }

    #[test]
    fn test_unregister_does_not_signal() {
        let registry = JobRegistry::new();
        let token = CancellationToken::new();
        registry.register(3, token.clone());

        registry.unregister(3);
        assert!(registry.is_empty());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_all_keeps_entries() {
        let registry = JobRegistry::new();
        let tokens: Vec<_> = (1..=3)
            .map(|id| {
                let token = CancellationToken::new();
                registry.register(id, token.clone());
                token
            })
            .collect();

        let mut ids = registry.cancel_all();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(tokens.iter().all(|t| t.is_cancelled()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_guard_unregisters_on_drop() {
        let registry = JobRegistry::new();
        registry.register(9, CancellationToken::new());
        {
            let _guard = RegistryGuard::new(registry.clone(), 9);
            assert!(registry.contains(9));
        }
        assert!(!registry.contains(9));
    }

    #[test]
    fn test_guard_unregisters_on_panic() {
        let registry = JobRegistry::new();
        registry.register(11, CancellationToken::new());

        let cloned = registry.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = RegistryGuard::new(cloned, 11);
            panic!("job blew up");
        });

        assert!(result.is_err());
        assert!(!registry.contains(11));
    }

    #[test]
    fn test_concurrent_cancel_succeeds_once() {
        let registry = JobRegistry::new();
        registry.register(100, CancellationToken::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.cancel(100))
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|found| *found)
            .count();
        assert_eq!(successes, 1);
    }
}
