//! Input abstraction layer.
//!
//! Normalizes pointer, wheel, and keyboard events from any host (browser,
//! native window, tests) into one `InputEvent` enum. Coordinates are screen
//! pixels relative to the canvas surface's top-left corner.

use lumen_core::Point;

/// Keyboard modifier state at the time of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on Windows/Linux, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` code.
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    /// The pointer left the tracked surface (or the host lost capture).
    PointerLeave,
    /// Wheel / trackpad scroll. Positive `delta_y` scrolls down.
    Wheel { x: f64, y: f64, delta_y: f64 },
    Key {
        /// `KeyboardEvent.key` value, e.g. `"Delete"`, `"Escape"`, `"="`.
        key: String,
        modifiers: Modifiers,
        /// Focus is inside an editable text field.
        in_text_field: bool,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
            in_text_field: false,
        }
    }

    /// Extract position if this is a positioned event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. } => Some(Point::new(*x, *y)),
            Self::PointerLeave | Self::Key { .. } => None,
        }
    }
}
