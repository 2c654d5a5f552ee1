//! In-memory admin sessions.
//!
//! Tokens are random UUIDs mapped to an absolute expiry. Nothing is
//! persisted: a restart signs every admin out.

use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::time::Instant;
use uuid::Uuid;

use crate::observability::metrics;

/// The single privileged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

#[derive(Debug, Clone)]
struct Session {
    role: Role,
    expires: Instant,
}

pub struct SessionStore {
    secret: String,
    ttl: Duration,
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    /// `secret` is compared after trimming, like supplied credentials.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            secret: secret.trim().to_string(),
            ttl,
            sessions: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Check a supplied PIN against the configured one.
    pub fn check_credential(&self, supplied: &str) -> bool {
        secrets_match(self.secret.as_bytes(), supplied.trim().as_bytes())
    }

    /// Issue a new token valid for the configured TTL.
    pub fn issue(&self) -> String {
        self.issue_at(Instant::now())
    }

    fn issue_at(&self, now: Instant) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                role: Role::Admin,
                expires: now + self.ttl,
            },
        );
        metrics::record_active_sessions(self.sessions.len());
        token
    }

    /// Resolve a token to its role. Expired tokens are removed on sight and
    /// reported exactly like unknown ones.
    pub fn verify(&self, token: &str) -> Option<Role> {
        let now = Instant::now();
        match self.sessions.get(token) {
            None => return None,
            Some(session) if session.expires > now => return Some(session.role),
            Some(_) => {}
        }
        self.sessions.remove_if(token, |_, s| s.expires <= now);
        metrics::record_active_sessions(self.sessions.len());
        None
    }

    /// Delete a token. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token).is_some();
        metrics::record_active_sessions(self.sessions.len());
        removed
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires > now);
        let after = self.sessions.len();
        metrics::record_active_sessions(after);
        before.saturating_sub(after)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Equal-length inputs are compared without an early exit; the length check
/// itself is the only data-dependent branch.
fn secrets_match(expected: &[u8], supplied: &[u8]) -> bool {
    if expected.len() != supplied.len() {
        return false;
    }
    bool::from(expected.ct_eq(supplied))
}
