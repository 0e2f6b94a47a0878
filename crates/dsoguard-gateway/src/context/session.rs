//! Token -> principal store with expiry.
//!
//! Sessions issued at runtime (`POST /v1/sessions`) expire after the TTL
//! given at construction; sessions seeded from config are static. Expired entries are evicted lazily
//! on access and by `purge_expired`, which the binary runs periodically.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dsoguard_core::error::{GuardError, Result};
use dsoguard_core::UserInfo;

#[derive(Debug)]
struct Session {
    principal: Arc<UserInfo>,
    expires_at: Option<Instant>,
}

impl Session {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert a session that expires after the store TTL.
    ///
    /// Returns `false` and leaves the store untouched when the token already
    /// belongs to a live session.
    pub fn insert(&self, token: impl Into<String>, principal: UserInfo) -> bool {
        let now = Instant::now();
        let session = Session {
            principal: Arc::new(principal),
            expires_at: Some(now + self.ttl),
        };
        match self.sessions.entry(token.into()) {
            Entry::Occupied(mut e) if e.get().expired(now) => {
                e.insert(session);
                true
            }
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(session);
                true
            }
        }
    }

    /// Insert a session that never expires.
    pub fn insert_static(&self, token: impl Into<String>, principal: UserInfo) {
        self.sessions.insert(
            token.into(),
            Session {
                principal: Arc::new(principal),
                expires_at: None,
            },
        );
    }

    pub fn resolve(&self, token: &str) -> Result<Arc<UserInfo>> {
        let now = Instant::now();
        let expired = match self.sessions.get(token) {
            Some(s) if !s.expired(now) => return Ok(Arc::clone(&s.principal)),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove_if(token, |_, s| s.expired(now));
            tracing::debug!("session expired");
        }
        Err(GuardError::AuthFailed)
    }

    pub fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.expired(now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
