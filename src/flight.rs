//! Singleflight Module
//!
//! Coalesces concurrent loads of the same key into one execution whose
//! result every overlapping caller shares.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::watch;

use crate::error::{CacheError, Result};

type Latch<T> = watch::Receiver<Option<Result<T>>>;

enum Role<T> {
    /// First caller for the key: runs the work and publishes the result.
    Leader(watch::Sender<Option<Result<T>>>),
    /// Overlapping caller: waits on the leader's latch.
    Follower(Latch<T>),
}

// == Single Flight ==
/// Duplicate suppression for in-flight loads.
///
/// For a given key, at most one work future runs at any time; callers
/// that arrive while it is in flight wait and receive a clone of the
/// same result. Suppression is scoped to overlap in time only: once a
/// flight completes its record is gone, so a later call runs fresh work
/// and a failed load can be retried.
pub struct SingleFlight<T> {
    /// In-flight latches by key. The lock only guards the map; it is
    /// released before any work runs.
    calls: Mutex<HashMap<String, Latch<T>>>,
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    // == Run ==
    /// Executes `work` for `key`, unless a flight for the key is
    /// already in progress, in which case the caller waits for that
    /// flight's result instead.
    ///
    /// The result is published on the latch strictly before the flight
    /// record is removed, so a caller that joined the flight always
    /// observes its outcome. If the leader is cancelled before
    /// publishing, waiters receive an internal error rather than
    /// hanging.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let role = {
            let mut calls = self.calls.lock().expect("flight lock poisoned");
            match calls.get(key) {
                Some(latch) if !Self::is_stale(latch) => Role::Follower(latch.clone()),
                _ => {
                    let (tx, rx) = watch::channel(None);
                    calls.insert(key.to_string(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Leader(tx) => {
                let result = work().await;
                tx.send_replace(Some(result.clone()));
                self.calls
                    .lock()
                    .expect("flight lock poisoned")
                    .remove(key);
                result
            }
            Role::Follower(mut latch) => loop {
                if let Some(result) = latch.borrow_and_update().as_ref() {
                    return result.clone();
                }
                if latch.changed().await.is_err() {
                    // The leader died without publishing. Drop its
                    // record so the next caller starts a fresh flight.
                    let mut calls = self.calls.lock().expect("flight lock poisoned");
                    if calls.get(key).is_some_and(Self::is_stale) {
                        calls.remove(key);
                    }
                    return Err(CacheError::Internal("in-flight load aborted".to_string()));
                }
            },
        }
    }

    /// A latch whose sender is gone without ever publishing belongs to
    /// a cancelled leader; its record no longer represents a flight.
    fn is_stale(latch: &Latch<T>) -> bool {
        latch.has_changed().is_err() && latch.borrow().is_none()
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> std::fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SingleFlight")
    }
}
