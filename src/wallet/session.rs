//! Short-lived memory of which wallet and account a session picked.

use std::time::{Duration, Instant};

use alloy::primitives::Address;
use dashmap::DashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub provider: String,
    pub account: Address,
}

#[derive(Debug)]
struct Entry {
    session: WalletSession,
    expires_at: Instant,
}

/// In-memory, expiring session store. Lost on restart.
#[derive(Debug)]
pub struct SessionStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn remember(&self, session_id: &str, session: WalletSession) {
        self.entries.insert(
            session_id.to_string(),
            Entry {
                session,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// The live session, if any. Expired entries are dropped on read.
    pub fn get(&self, session_id: &str) -> Option<WalletSession> {
        let expired = match self.entries.get(session_id) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.session.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(session_id);
        }
        None
    }

    pub fn forget(&self, session_id: &str) -> Option<WalletSession> {
        self.entries.remove(session_id).map(|(_, entry)| entry.session)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> WalletSession {
        WalletSession {
            provider: "local".into(),
            account: Address::repeat_byte(0x11),
        }
    }

    #[test]
    fn test_remember_and_forget() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.remember("s1", session());
        assert_eq!(store.get("s1"), Some(session()));
        assert_eq!(store.forget("s1"), Some(session()));
        assert!(store.get("s1").is_none());
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let store = SessionStore::new(Duration::ZERO);
        store.remember("s1", session());
        assert!(store.get("s1").is_none());
        assert!(store.is_empty());
    }
}
