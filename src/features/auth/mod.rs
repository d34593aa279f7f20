//! # Feature: Authentication
//!
//! Shared-password gates for guests and the host. A correct password yields a
//! session id carried in an HttpOnly cookie; repeated failures from one client
//! are throttled.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Random server-side sessions, failed-login throttling
//! - 1.0.0: Password check with role cookie

pub mod cookies;
pub mod sessions;
pub mod throttle;

pub use sessions::{SessionStore, SESSION_TTL};
pub use throttle::LoginThrottle;

use crate::core::{PotluckError, PotluckResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Admin,
}

impl Role {
    pub fn cookie_name(&self) -> &'static str {
        match self {
            Role::Guest => "guest-auth",
            Role::Admin => "admin-auth",
        }
    }

    /// Admins may use every guest route
    pub fn satisfies(&self, required: Role) -> bool {
        *self == required || *self == Role::Admin
    }
}

/// Compare without exiting early on the first differing byte
fn passwords_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[derive(Clone)]
pub struct Authenticator {
    guest_password: String,
    admin_password: String,
    sessions: Arc<SessionStore>,
    throttle: Arc<LoginThrottle>,
}

impl Authenticator {
    pub fn new(guest_password: &str, admin_password: &str) -> Self {
        Self::with_parts(
            guest_password,
            admin_password,
            SessionStore::default(),
            LoginThrottle::default(),
        )
    }

    pub fn with_parts(
        guest_password: &str,
        admin_password: &str,
        sessions: SessionStore,
        throttle: LoginThrottle,
    ) -> Self {
        Self {
            guest_password: guest_password.to_string(),
            admin_password: admin_password.to_string(),
            sessions: Arc::new(sessions),
            throttle: Arc::new(throttle),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Check a password for `role` and open a session on success
    pub fn login(&self, role: Role, password: &str, client: &str) -> PotluckResult<String> {
        if !self.throttle.allows(client, role) {
            warn!("Throttled {role:?} login attempt from {client}");
            return Err(PotluckError::RateLimited);
        }

        let expected = match role {
            Role::Guest => &self.guest_password,
            Role::Admin => &self.admin_password,
        };

        if !passwords_match(password, expected) {
            self.throttle.record_failure(client, role);
            warn!("Failed {role:?} login from {client}");
            return Err(PotluckError::Unauthorized);
        }

        self.throttle.clear(client, role);
        info!("{role:?} login from {client}");
        Ok(self.sessions.create(role))
    }

    /// Role of the strongest live session among the presented cookies
    pub fn role_from_cookies(&self, cookie_header: &str) -> Option<Role> {
        [Role::Admin, Role::Guest].into_iter().find(|role| {
            cookies::read_cookie(cookie_header, role.cookie_name())
                .and_then(|id| self.sessions.role_of(id))
                == Some(*role)
        })
    }

    pub fn logout(&self, cookie_header: &str) {
        for role in [Role::Guest, Role::Admin] {
            if let Some(id) = cookies::read_cookie(cookie_header, role.cookie_name()) {
                self.sessions.revoke(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn auth() -> Authenticator {
        Authenticator::with_parts(
            "pumpkin",
            "gravy",
            SessionStore::default(),
            LoginThrottle::new(2, Duration::from_secs(60)),
        )
    }

    #[test]
    fn test_passwords_match() {
        assert!(passwords_match("gravy", "gravy"));
        assert!(!passwords_match("grav", "gravy"));
        assert!(!passwords_match("gravY", "gravy"));
    }

    #[test]
    fn test_login_roles() {
        let auth = auth();
        let guest = auth.login(Role::Guest, "pumpkin", "c1").unwrap();
        let admin = auth.login(Role::Admin, "gravy", "c1").unwrap();

        assert!(matches!(
            auth.login(Role::Admin, "pumpkin", "c1"),
            Err(PotluckError::Unauthorized)
        ));

        let header = format!("guest-auth={guest}");
        assert_eq!(auth.role_from_cookies(&header), Some(Role::Guest));

        let header = format!("guest-auth={guest}; admin-auth={admin}");
        assert_eq!(auth.role_from_cookies(&header), Some(Role::Admin));
    }

    #[test]
    fn test_guest_session_in_admin_cookie_is_rejected() {
        let auth = auth();
        let guest = auth.login(Role::Guest, "pumpkin", "c1").unwrap();

        let header = format!("admin-auth={guest}");
        assert_eq!(auth.role_from_cookies(&header), None);
    }

    #[test]
    fn test_failed_logins_are_throttled() {
        let auth = auth();
        for _ in 0..2 {
            assert!(matches!(
                auth.login(Role::Admin, "wrong", "c1"),
                Err(PotluckError::Unauthorized)
            ));
        }

        assert!(matches!(
            auth.login(Role::Admin, "gravy", "c1"),
            Err(PotluckError::RateLimited)
        ));
        assert!(auth.login(Role::Admin, "gravy", "c2").is_ok());
        assert!(auth.login(Role::Guest, "pumpkin", "c1").is_ok());
    }

    #[test]
    fn test_logout_revokes_sessions() {
        let auth = auth();
        let admin = auth.login(Role::Admin, "gravy", "c1").unwrap();
        let header = format!("admin-auth={admin}");

        auth.logout(&header);
        assert_eq!(auth.role_from_cookies(&header), None);
    }

    #[test]
    fn test_role_satisfies() {
        assert!(Role::Admin.satisfies(Role::Guest));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Guest.satisfies(Role::Guest));
        assert!(!Role::Guest.satisfies(Role::Admin));
    }
}
