//! # Sessions
//!
//! In-memory session table behind the auth cookies. Sessions do not survive a
//! restart; guests simply log in again.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use super::Role;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Cookie and session lifetime
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

struct Session {
    role: Role,
    expires_at: Instant,
}

pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn create(&self, role: Role) -> String {
        let now = Instant::now();
        self.sessions.retain(|_, s| s.expires_at > now);

        let id = Uuid::new_v4().to_string();
        self.sessions.insert(
            id.clone(),
            Session {
                role,
                expires_at: now + self.ttl,
            },
        );
        id
    }

    /// Role of a live session, dropping it if expired
    pub fn role_of(&self, id: &str) -> Option<Role> {
        let role = {
            let session = self.sessions.get(id)?;
            if session.expires_at > Instant::now() {
                Some(session.role)
            } else {
                None
            }
        };

        if role.is_none() {
            self.sessions.remove(id);
        }
        role
    }

    pub fn revoke(&self, id: &str) {
        self.sessions.remove(id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
