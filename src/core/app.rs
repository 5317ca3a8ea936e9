//! Shell runtime state.
//!
//! [`App`] aggregates the independent event sources (identity load, contact
//! fetch, pointer, resize, presence status) into one consistent state the
//! renderer reads. It owns no terminal IO; the event loop in
//! [`crate::ui::shell`] feeds it and reacts to the navigation it requests.

use crate::auth::Navigation;
use crate::core::conversation::ConversationSelector;
use crate::core::identity::UserIdentity;
use crate::core::presence::PresenceStatus;
use crate::ui::overlay::{OverlayBounds, OverlayCoordinator, OverlayId, ViewportClass};
use ratatui::layout::{Position, Rect};

/// Clickable regions of the current frame. Rebuilt by the renderer on every
/// draw so hit-testing always runs against current positions.
#[derive(Debug, Default, Clone)]
pub struct FrameHits {
    pub overlays: OverlayBounds,
    /// Contact rows on screen, each with the index of the contact it covers.
    pub contact_rows: Vec<(Rect, usize)>,
    /// Account row that toggles the current viewport's dropdown.
    pub account_row: Option<Rect>,
    /// Hamburger control that opens the menu (narrow viewport, menu closed).
    pub menu_toggle: Option<Rect>,
    /// Logout entry inside an open dropdown.
    pub logout_entry: Option<Rect>,
}

fn hit(region: Option<Rect>, position: Position) -> bool {
    region.is_some_and(|rect| rect.contains(position))
}

pub struct App {
    pub identity: Option<UserIdentity>,
    /// True until the identity loader resolves.
    pub loading: bool,
    pub contacts: Vec<UserIdentity>,
    pub selector: ConversationSelector,
    pub overlays: OverlayCoordinator,
    pub presence: PresenceStatus,
    pub logout_confirm_open: bool,
    /// Navigation requested by state transitions; the event loop consumes it.
    pub navigate: Option<Navigation>,
    pub exit_requested: bool,
}

impl App {
    pub fn new(columns: u16, wide_min_width: u16) -> Self {
        Self {
            identity: None,
            loading: true,
            contacts: Vec::new(),
            selector: ConversationSelector::new(),
            overlays: OverlayCoordinator::new(columns, wide_min_width),
            presence: PresenceStatus::Disconnected,
            logout_confirm_open: false,
            navigate: None,
            exit_requested: false,
        }
    }

    /// Terminal state of the identity loader. `None` covers both an absent
    /// and an undecodable session; either way the shell redirects to login.
    pub fn identity_loaded(&mut self, identity: Option<UserIdentity>) {
        match identity {
            Some(identity) => {
                self.identity = Some(identity);
                self.loading = false;
            }
            None => self.navigate = Some(Navigation::Login),
        }
    }

    pub fn contacts_loaded(&mut self, contacts: Vec<UserIdentity>) {
        self.contacts = contacts;
    }

    /// Whether the contact sidebar is on screen: always in the wide layout,
    /// only while the menu overlay is open in the narrow one.
    pub fn sidebar_visible(&self) -> bool {
        match self.overlays.viewport() {
            ViewportClass::Wide => true,
            ViewportClass::Narrow => self.overlays.is_open(OverlayId::Menu),
        }
    }

    pub fn handle_resize(&mut self, columns: u16) {
        self.overlays.resize(columns);
    }

    /// Route a pointer-down event. Returns true when the active conversation
    /// changed and downstream should re-render the messaging surface.
    pub fn handle_pointer_down(&mut self, position: Position, hits: &FrameHits) -> bool {
        if self.loading || self.logout_confirm_open {
            return false;
        }

        // Outside-click reconciliation first; the anchor controls are part
        // of their overlay's bounds, so a click on them is an inside click.
        self.overlays.pointer_down(position, &hits.overlays);

        if hit(hits.menu_toggle, position) {
            self.overlays.toggle(OverlayId::Menu);
            return false;
        }
        if hit(hits.logout_entry, position) {
            self.logout_confirm_open = true;
            return false;
        }
        if hit(hits.account_row, position) {
            let dropdown = self.overlays.dropdown_for_viewport();
            self.overlays.toggle(dropdown);
            return false;
        }
        if self.sidebar_visible() {
            for (rect, index) in &hits.contact_rows {
                if rect.contains(position) {
                    if let Some(contact) = self.contacts.get(*index).cloned() {
                        return self.selector.select(contact);
                    }
                }
            }
        }
        false
    }

    pub fn confirm_logout(&mut self) {
        self.logout_confirm_open = false;
        self.navigate = Some(Navigation::Root);
    }

    /// Cancellation leaves the session and the current view unchanged.
    pub fn cancel_logout(&mut self) {
        self.logout_confirm_open = false;
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{create_test_contacts, create_test_identity};

    const WIDE_MIN: u16 = 100;

    fn loaded_app(columns: u16) -> App {
        let mut app = App::new(columns, WIDE_MIN);
        app.identity_loaded(Some(create_test_identity("u1", "alice")));
        app.contacts_loaded(create_test_contacts());
        app
    }

    fn hits_with_contacts() -> FrameHits {
        FrameHits {
            contact_rows: vec![
                (Rect::new(0, 2, 28, 1), 0),
                (Rect::new(0, 3, 28, 1), 1),
                (Rect::new(0, 4, 28, 1), 2),
            ],
            ..FrameHits::default()
        }
    }

    #[test]
    fn identity_load_clears_the_loading_flag() {
        let mut app = App::new(120, WIDE_MIN);
        assert!(app.loading);
        app.identity_loaded(Some(create_test_identity("u1", "alice")));
        assert!(!app.loading);
        assert!(app.navigate.is_none());
    }

    #[test]
    fn unusable_identity_redirects_to_login() {
        let mut app = App::new(120, WIDE_MIN);
        app.identity_loaded(None);
        assert_eq!(app.navigate, Some(Navigation::Login));
        assert!(app.loading);
    }

    #[test]
    fn clicking_a_contact_selects_the_conversation() {
        let mut app = loaded_app(120);
        let hits = hits_with_contacts();

        let changed = app.handle_pointer_down(Position::new(5, 3), &hits);
        assert!(changed);
        assert_eq!(app.selector.current().unwrap().id, "u3");
    }

    #[test]
    fn reselecting_the_active_contact_signals_no_change() {
        let mut app = loaded_app(120);
        let hits = hits_with_contacts();

        assert!(app.handle_pointer_down(Position::new(5, 2), &hits));
        assert!(!app.handle_pointer_down(Position::new(5, 2), &hits));
        assert_eq!(app.selector.generation(), 1);
    }

    #[test]
    fn narrow_layout_hides_contacts_until_the_menu_opens() {
        let mut app = loaded_app(80);
        assert!(!app.sidebar_visible());

        let hits = FrameHits {
            menu_toggle: Some(Rect::new(0, 0, 3, 1)),
            ..FrameHits::default()
        };
        app.handle_pointer_down(Position::new(1, 0), &hits);
        assert!(app.sidebar_visible());
    }

    #[test]
    fn contact_clicks_are_ignored_while_the_sidebar_is_hidden() {
        let mut app = loaded_app(80);
        let hits = hits_with_contacts();
        assert!(!app.handle_pointer_down(Position::new(5, 2), &hits));
        assert!(app.selector.current().is_none());
    }

    #[test]
    fn account_row_click_toggles_the_viewports_dropdown() {
        let mut app = loaded_app(120);
        let hits = FrameHits {
            account_row: Some(Rect::new(0, 20, 28, 1)),
            overlays: OverlayBounds {
                wide_dropdown: Some(Rect::new(0, 14, 28, 7)),
                ..OverlayBounds::default()
            },
            ..FrameHits::default()
        };

        app.handle_pointer_down(Position::new(4, 20), &hits);
        assert!(app.overlays.is_open(OverlayId::WideDropdown));

        app.handle_pointer_down(Position::new(4, 20), &hits);
        assert!(!app.overlays.is_open(OverlayId::WideDropdown));
    }

    #[test]
    fn logout_entry_opens_the_confirmation() {
        let mut app = loaded_app(120);
        let hits = FrameHits {
            logout_entry: Some(Rect::new(2, 16, 24, 1)),
            overlays: OverlayBounds {
                wide_dropdown: Some(Rect::new(0, 14, 28, 7)),
                ..OverlayBounds::default()
            },
            ..FrameHits::default()
        };
        app.overlays.toggle(OverlayId::WideDropdown);

        app.handle_pointer_down(Position::new(5, 16), &hits);
        assert!(app.logout_confirm_open);
        // The dropdown click was inside its own bounds, so it stays open.
        assert!(app.overlays.is_open(OverlayId::WideDropdown));
    }

    #[test]
    fn logout_confirmation_navigates_to_root() {
        let mut app = loaded_app(120);
        app.logout_confirm_open = true;
        app.confirm_logout();
        assert_eq!(app.navigate, Some(Navigation::Root));
        assert!(!app.logout_confirm_open);
    }

    #[test]
    fn logout_cancellation_changes_nothing() {
        let mut app = loaded_app(120);
        app.selector.select(create_test_identity("u2", "bob"));
        app.logout_confirm_open = true;

        app.cancel_logout();

        assert!(app.navigate.is_none());
        assert!(!app.logout_confirm_open);
        assert_eq!(app.selector.current().unwrap().id, "u2");
    }

    #[test]
    fn failed_contact_fetch_leaves_an_empty_usable_shell() {
        // On fetch failure the shell never delivers contacts; the list stays
        // empty and every other interaction keeps working.
        let mut app = App::new(80, WIDE_MIN);
        app.identity_loaded(Some(create_test_identity("u1", "alice")));
        assert!(app.contacts.is_empty());

        let hits = FrameHits {
            menu_toggle: Some(Rect::new(0, 0, 3, 1)),
            ..FrameHits::default()
        };
        app.handle_pointer_down(Position::new(1, 0), &hits);
        assert!(app.sidebar_visible());
        assert!(app.selector.current().is_none());
        assert!(app.navigate.is_none());

        app.handle_resize(120);
        assert_eq!(app.overlays.viewport(), ViewportClass::Wide);
    }

    #[test]
    fn pointer_events_are_ignored_while_loading() {
        let mut app = App::new(120, WIDE_MIN);
        app.contacts_loaded(create_test_contacts());
        let hits = hits_with_contacts();
        assert!(!app.handle_pointer_down(Position::new(5, 2), &hits));
        assert!(app.selector.current().is_none());
    }
}
