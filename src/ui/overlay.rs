//! Overlay and viewport reconciliation.
//!
//! Three transient surfaces share one rule set: the contact-list side menu
//! and the two account dropdowns (one anchored in the narrow layout's menu,
//! one in the wide layout's sidebar). Each is independently open or closed;
//! pointer-down outside a surface's currently rendered rect closes it, and a
//! resize that crosses into the wide viewport closes all three, because the
//! wide chrome does not use them except for its own dropdown.
//!
//! The coordinator is pure state: the shell's single event loop feeds it
//! pointer and resize events, and the renderer supplies the rects as of the
//! current frame, never a cached position.

use ratatui::layout::{Position, Rect};

/// Coarse classification of the terminal width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportClass {
    Narrow,
    Wide,
}

impl ViewportClass {
    pub fn classify(columns: u16, wide_min_width: u16) -> Self {
        if columns >= wide_min_width {
            ViewportClass::Wide
        } else {
            ViewportClass::Narrow
        }
    }
}

/// The three overlay surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayId {
    /// Contact-list side menu (narrow layout only).
    Menu,
    /// Account dropdown anchored inside the menu (narrow layout).
    NarrowDropdown,
    /// Account dropdown anchored in the sidebar (wide layout).
    WideDropdown,
}

impl OverlayId {
    /// The viewport class in which user action may open this overlay.
    fn home_viewport(self) -> ViewportClass {
        match self {
            OverlayId::Menu | OverlayId::NarrowDropdown => ViewportClass::Narrow,
            OverlayId::WideDropdown => ViewportClass::Wide,
        }
    }
}

/// Rendered bounds of each overlay as of the current frame. `None` means the
/// surface is not on screen right now. Rects include the surface's anchor
/// control, so clicking the control that toggles an overlay is an inside
/// click for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayBounds {
    pub menu: Option<Rect>,
    pub narrow_dropdown: Option<Rect>,
    pub wide_dropdown: Option<Rect>,
}

impl OverlayBounds {
    fn get(&self, id: OverlayId) -> Option<Rect> {
        match id {
            OverlayId::Menu => self.menu,
            OverlayId::NarrowDropdown => self.narrow_dropdown,
            OverlayId::WideDropdown => self.wide_dropdown,
        }
    }
}

const ALL_OVERLAYS: [OverlayId; 3] = [
    OverlayId::Menu,
    OverlayId::NarrowDropdown,
    OverlayId::WideDropdown,
];

#[derive(Debug)]
pub struct OverlayCoordinator {
    menu_open: bool,
    narrow_dropdown_open: bool,
    wide_dropdown_open: bool,
    viewport: ViewportClass,
    wide_min_width: u16,
}

impl OverlayCoordinator {
    pub fn new(columns: u16, wide_min_width: u16) -> Self {
        Self {
            menu_open: false,
            narrow_dropdown_open: false,
            wide_dropdown_open: false,
            viewport: ViewportClass::classify(columns, wide_min_width),
            wide_min_width,
        }
    }

    pub fn viewport(&self) -> ViewportClass {
        self.viewport
    }

    pub fn is_open(&self, id: OverlayId) -> bool {
        match id {
            OverlayId::Menu => self.menu_open,
            OverlayId::NarrowDropdown => self.narrow_dropdown_open,
            OverlayId::WideDropdown => self.wide_dropdown_open,
        }
    }

    /// The account dropdown that belongs to the current viewport class.
    pub fn dropdown_for_viewport(&self) -> OverlayId {
        match self.viewport {
            ViewportClass::Narrow => OverlayId::NarrowDropdown,
            ViewportClass::Wide => OverlayId::WideDropdown,
        }
    }

    /// Explicit toggle from the overlay's own control. Opening a surface
    /// that does not belong to the current viewport class is refused.
    pub fn toggle(&mut self, id: OverlayId) {
        if self.is_open(id) {
            self.set_open(id, false);
        } else if id.home_viewport() == self.viewport {
            self.set_open(id, true);
        }
    }

    pub fn close(&mut self, id: OverlayId) {
        self.set_open(id, false);
    }

    pub fn close_all(&mut self) {
        self.menu_open = false;
        self.narrow_dropdown_open = false;
        self.wide_dropdown_open = false;
    }

    /// Reconcile against a pointer-down event. Every open overlay whose
    /// current rect does not contain the position is forced closed; an
    /// overlay that is open but not on screen this frame closes too.
    pub fn pointer_down(&mut self, position: Position, bounds: &OverlayBounds) {
        for id in ALL_OVERLAYS {
            if !self.is_open(id) {
                continue;
            }
            let inside = bounds.get(id).is_some_and(|rect| rect.contains(position));
            if !inside {
                self.set_open(id, false);
            }
        }
    }

    /// Reconcile against a viewport resize. Crossing into the wide class
    /// forces all three overlays closed regardless of prior state.
    pub fn resize(&mut self, columns: u16) {
        let next = ViewportClass::classify(columns, self.wide_min_width);
        if self.viewport == ViewportClass::Narrow && next == ViewportClass::Wide {
            self.close_all();
        }
        self.viewport = next;
    }

    fn set_open(&mut self, id: OverlayId, open: bool) {
        match id {
            OverlayId::Menu => self.menu_open = open,
            OverlayId::NarrowDropdown => self.narrow_dropdown_open = open,
            OverlayId::WideDropdown => self.wide_dropdown_open = open,
        }
    }
}
