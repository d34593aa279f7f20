//! # Login Throttle
//!
//! Sliding-window count of failed logins per (client, role). DashMap keeps it
//! safe to share across request handlers without a lock. Keys whose window
//! has emptied are dropped, so the map only holds clients with recent failures.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.1.0
//!
//! ## Changelog
//! - 1.1.0: Prune expired keys
//! - 1.0.0: Per-client, per-role failure window

use super::Role;
use dashmap::DashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_FAILURES: usize = 5;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Composite key: a client can be locked out of admin but still log in as a guest
type ThrottleKey = (String, Role);

pub struct LoginThrottle {
    failures: DashMap<ThrottleKey, Vec<Instant>>,
    max_failures: usize,
    window: Duration,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILURES, DEFAULT_WINDOW)
    }
}

impl LoginThrottle {
    pub fn new(max_failures: usize, window: Duration) -> Self {
        LoginThrottle {
            failures: DashMap::new(),
            max_failures,
            window,
        }
    }

    fn make_key(client: &str, role: Role) -> ThrottleKey {
        (client.to_string(), role)
    }

    /// Whether another attempt is allowed right now
    pub fn allows(&self, client: &str, role: Role) -> bool {
        let key = Self::make_key(client, role);
        let now = Instant::now();

        let allowed = match self.failures.get_mut(&key) {
            Some(mut entry) => {
                entry.retain(|&time| now.duration_since(time) < self.window);
                entry.len() < self.max_failures
            }
            None => return true,
        };

        self.failures.remove_if(&key, |_, times| times.is_empty());
        allowed
    }

    pub fn record_failure(&self, client: &str, role: Role) {
        let now = Instant::now();
        self.failures
            .retain(|_, times| times.iter().any(|&time| now.duration_since(time) < self.window));

        let mut entry = self.failures.entry(Self::make_key(client, role)).or_default();
        entry.retain(|&time| now.duration_since(time) < self.window);
        entry.push(now);
    }

    /// Number of clients currently tracked
    pub fn tracked(&self) -> usize {
        self.failures.len()
    }

    /// Forget failures after a successful login
    pub fn clear(&self, client: &str, role: Role) {
        self.failures.remove(&Self::make_key(client, role));
    }
}
