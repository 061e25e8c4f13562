// SPDX-License-Identifier: MIT

//! Session persistence
//!
//! The [`SessionStore`] trait hides where sessions live. [`MemoryStore`]
//! keeps them in process; [`FileStore`] writes one JSON document per session.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::onboarding::session::{Session, SessionSummary, STATE_VERSION};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session; `Ok(None)` when it was never saved.
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    /// Insert or replace a session.
    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Summaries of every stored session, most recently updated first.
    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError>;
}

/// Reject sessions written by an unknown layout version.
pub(crate) fn check_version(session: &Session) -> Result<(), StoreError> {
    if session.state_version == STATE_VERSION {
        Ok(())
    } else {
        Err(StoreError::UnsupportedVersion {
            session_id: session.session_id.clone(),
            version: session.state_version.clone(),
        })
    }
}

type LockMap = HashMap<String, Arc<Mutex<()>>>;

/// One async mutex per session id.
///
/// Holding the guard serializes load, mutate and save for that session while
/// turns for other sessions run freely. An entry lives only while some turn
/// holds or waits for it.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<StdMutex<LockMap>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        SessionGuard {
            session_id: session_id.to_string(),
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Held for the duration of a turn; drops the map entry once nobody else
/// is queued on the same session.
pub struct SessionGuard {
    session_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<LockMap>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters clone the Arc under the map lock, so a count of one means
        // only the map still refers to it.
        if locks
            .get(&self.session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_check_version() {
        let mut s = Session::new("abc");
        assert!(check_version(&s).is_ok());
        s.state_version = "2.0".into();
        assert!(matches!(
            check_version(&s),
            Err(StoreError::UnsupportedVersion { .. })
        ));
    }

    #[tokio::test]
    async fn test_same_session_serializes() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("a").await;

        let other = locks.clone();
        let blocked = tokio::spawn(async move {
            let _g = other.acquire("a").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());

        // A different session is not blocked
        let _b = locks.acquire("b").await;

        drop(guard);
        blocked.await.unwrap();
    }

    #[tokio::test]
    async fn test_entries_released_after_use() {
        let locks = SessionLocks::new();
        for i in 0..1000 {
            let _guard = locks.acquire(&format!("session-{}", i)).await;
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_entry_kept_while_waiter_queued() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("a").await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.acquire("a").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.len(), 1);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }
}
