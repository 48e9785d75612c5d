//! Coalescing of concurrent refreshes
//!
//! When several callers find the user snapshot expired at the same time, only
//! one of them talks to the server. The others attach to the in-flight work
//! and receive a clone of its outcome, error included.
//!
//! Built on `async_singleflight::UnaryGroup`, which stores the whole
//! `Result` as the shared value. If the leading caller is dropped mid-flight,
//! a waiting caller takes over with its own future.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use async_singleflight::UnaryGroup;

/// Runs at most one future per key; latecomers share its outcome.
#[derive(Clone)]
pub struct SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    group: Arc<UnaryGroup<K, Result<V, E>>>,
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            group: Arc::new(UnaryGroup::new()),
        }
    }

    /// Execute `f` unless work for `key` is already running, in which case
    /// wait for that work and return a clone of its result.
    pub async fn do_work<Fut>(&self, key: K, f: Fut) -> Result<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send,
    {
        self.group.work(&key, f).await
    }
}

impl<K, V, E> Default for SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
