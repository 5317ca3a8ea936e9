//! The user identity decoded from the persisted session slot.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

/// A user record as the backend serializes it, both in the session slot and
/// in the contact-list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    /// Base64-encoded avatar payload; empty when the user has not set one.
    #[serde(rename = "avatarImage", default)]
    pub avatar_image: String,
}

impl UserIdentity {
    pub fn has_avatar(&self) -> bool {
        !self.avatar_image.is_empty()
    }

    /// Decode the avatar payload. Returns `None` when no avatar is set or
    /// the payload is not valid base64.
    pub fn decode_avatar(&self) -> Option<Vec<u8>> {
        if self.avatar_image.is_empty() {
            return None;
        }
        base64::engine::general_purpose::STANDARD
            .decode(&self.avatar_image)
            .ok()
    }
}

/// Errors that can occur when decoding the session slot into an identity.
#[derive(Debug)]
pub enum IdentityError {
    /// The slot contents were not valid JSON for a user record.
    Malformed(serde_json::Error),

    /// The record decoded but carries an empty id, which no live identity
    /// may have.
    MissingId,
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::Malformed(source) => {
                write!(f, "Session data is not a valid user record: {}", source)
            }
            IdentityError::MissingId => write!(f, "Session data carries an empty user id"),
        }
    }
}

impl StdError for IdentityError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            IdentityError::Malformed(source) => Some(source),
            IdentityError::MissingId => None,
        }
    }
}

/// Parse the raw session slot contents into a [`UserIdentity`].
pub fn decode_identity(token: &str) -> Result<UserIdentity, IdentityError> {
    let identity: UserIdentity = serde_json::from_str(token).map_err(IdentityError::Malformed)?;
    if identity.id.is_empty() {
        return Err(IdentityError::MissingId);
    }
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_shape() {
        let token = r#"{"_id":"u1","username":"alice","email":"a@x.com","avatarImage":""}"#;
        let identity = decode_identity(token).unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.email, "a@x.com");
        assert!(!identity.has_avatar());
    }

    #[test]
    fn missing_avatar_field_defaults_to_empty() {
        let token = r#"{"_id":"u2","username":"bob","email":"b@x.com"}"#;
        let identity = decode_identity(token).unwrap();
        assert!(identity.avatar_image.is_empty());
        assert!(identity.decode_avatar().is_none());
    }

    #[test]
    fn rejects_garbage_token() {
        assert!(matches!(
            decode_identity("not json"),
            Err(IdentityError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_empty_id() {
        let token = r#"{"_id":"","username":"x","email":"x@x.com","avatarImage":""}"#;
        assert!(matches!(decode_identity(token), Err(IdentityError::MissingId)));
    }

    #[test]
    fn decodes_avatar_payload() {
        let token = r#"{"_id":"u3","username":"eve","email":"e@x.com","avatarImage":"aGk="}"#;
        let identity = decode_identity(token).unwrap();
        assert_eq!(identity.decode_avatar().unwrap(), b"hi");
    }
}
