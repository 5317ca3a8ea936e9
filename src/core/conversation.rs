//! Active conversation selection.

use crate::core::identity::UserIdentity;

/// Holds the currently chosen contact, or none. "No selection" is a
/// first-class state: the shell renders the welcome pane for it.
#[derive(Debug, Default)]
pub struct ConversationSelector {
    active: Option<UserIdentity>,
    generation: u64,
}

impl ConversationSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `contact` to the messaging surface. Reselecting the contact
    /// that is already active is an idempotent no-op; returns whether the
    /// selection actually changed.
    pub fn select(&mut self, contact: UserIdentity) -> bool {
        if self.active.as_ref().is_some_and(|current| current.id == contact.id) {
            return false;
        }
        self.active = Some(contact);
        self.generation += 1;
        true
    }

    pub fn current(&self) -> Option<&UserIdentity> {
        self.active.as_ref()
    }

    /// Explicit navigation away from the conversation.
    pub fn clear(&mut self) {
        if self.active.take().is_some() {
            self.generation += 1;
        }
    }

    /// Monotonic change counter; downstream re-renders when it moves.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
