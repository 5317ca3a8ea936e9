//! Startup session gate, identity loading, and logout.
//!
//! The guard runs exactly once per startup. A missing session is the normal
//! logged-out state, not an error: it redirects to the login flow and nothing
//! else runs. Stored session data that fails to decode is treated the same
//! way rather than surfaced as a crash.

use crate::core::identity::{decode_identity, UserIdentity};
use crate::core::session::{SessionError, SessionStore};
use tracing::warn;

/// Navigation side effects this core can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// No usable session: hand off to the login flow.
    Login,
    /// Logout confirmed: back to the entry point.
    Root,
}

/// Outcome of the startup session check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionGate {
    Authenticated,
    RedirectToLogin,
}

pub struct AuthGuard<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> AuthGuard<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self { store }
    }

    /// Check whether a session token is present. No retry: absence simply
    /// means logged out.
    pub fn check(&self) -> Result<SessionGate, SessionError> {
        Ok(match self.store.load()? {
            Some(_) => SessionGate::Authenticated,
            None => SessionGate::RedirectToLogin,
        })
    }

    /// Decode the stored token into an identity. Malformed content behaves
    /// exactly like an absent session.
    pub fn load_identity(&self) -> Result<Option<UserIdentity>, SessionError> {
        let Some(token) = self.store.load()? else {
            return Ok(None);
        };
        match decode_identity(&token) {
            Ok(identity) => Ok(Some(identity)),
            Err(err) => {
                warn!("Stored session is unusable, treating as logged out: {err}");
                Ok(None)
            }
        }
    }

    /// Confirmed logout: delete the session slot and navigate to the root.
    /// This is a terminal action for the session instance.
    pub fn logout(&self) -> Result<Navigation, SessionError> {
        self.store.clear()?;
        Ok(Navigation::Root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::MemorySessionStore;

    const TOKEN: &str = r#"{"_id":"u1","username":"alice","email":"a@x.com","avatarImage":""}"#;

    #[test]
    fn absent_session_redirects_to_login() {
        let store = MemorySessionStore::empty();
        let guard = AuthGuard::new(&store);
        assert_eq!(guard.check().unwrap(), SessionGate::RedirectToLogin);
    }

    #[test]
    fn present_session_authenticates() {
        let store = MemorySessionStore::with_token(TOKEN);
        let guard = AuthGuard::new(&store);
        assert_eq!(guard.check().unwrap(), SessionGate::Authenticated);
    }

    #[test]
    fn loads_identity_from_stored_token() {
        let store = MemorySessionStore::with_token(TOKEN);
        let guard = AuthGuard::new(&store);
        let identity = guard.load_identity().unwrap().unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn malformed_token_behaves_like_an_absent_session() {
        let store = MemorySessionStore::with_token("{broken");
        let guard = AuthGuard::new(&store);
        assert!(guard.load_identity().unwrap().is_none());
    }

    #[test]
    fn logout_clears_the_slot_and_navigates_to_root() {
        let store = MemorySessionStore::with_token(TOKEN);
        let guard = AuthGuard::new(&store);
        assert_eq!(guard.logout().unwrap(), Navigation::Root);
        assert_eq!(guard.check().unwrap(), SessionGate::RedirectToLogin);
    }
}
