//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Shortcuts
//! never fire while focus is inside a text field; the caller checks that
//! before resolving.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Remove the selected node or connection.
    Delete,
    /// Close the quick-add menu, abandon a pending link, clear selection.
    Cancel,
    ZoomIn,
    ZoomOut,
    /// Back to 100 %, anchored on the viewport centre.
    ZoomReset,
}

/// Multiplicative zoom step for the keyboard zoom shortcuts.
pub const ZOOM_STEP: f64 = 1.2;

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘, elsewhere `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"Delete"`, `"="`).
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() {
            return match key {
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" | "_" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}
