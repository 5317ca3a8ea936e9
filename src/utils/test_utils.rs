#[cfg(test)]
use crate::core::identity::UserIdentity;
#[cfg(test)]
use crate::core::session::{SessionError, SessionStore};
#[cfg(test)]
use std::sync::Mutex;

/// Session slot held in memory, for exercising the auth path without
/// touching the real data directory.
#[cfg(test)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

#[cfg(test)]
impl MemorySessionStore {
    pub fn empty() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Mutex::new(Some(token.to_string())),
        }
    }
}

#[cfg(test)]
impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn store(&self, token: &str) -> Result<(), SessionError> {
        *self.slot.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
pub fn create_test_identity(id: &str, username: &str) -> UserIdentity {
    UserIdentity {
        id: id.to_string(),
        username: username.to_string(),
        email: format!("{username}@x.com"),
        avatar_image: String::new(),
    }
}

#[cfg(test)]
pub fn create_test_contacts() -> Vec<UserIdentity> {
    vec![
        create_test_identity("u2", "bob"),
        create_test_identity("u3", "carol"),
        create_test_identity("u4", "dave"),
    ]
}
