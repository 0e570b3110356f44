//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. On macOS the
//! command modifier is `meta` (⌘); elsewhere `ctrl` plays the same role.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Copy,
    Paste,
    Cut,
    Delete,
    Duplicate,
    Undo,
    Redo,
    SelectAll,
    Save,
    /// Clear selection and cancel any pending connection or rename.
    Escape,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the DOM `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Delete/Backspace are only claimed when focus is not inside a text
    /// field, so typing in a rename box never deletes components.
    pub fn resolve(key: &str, modifiers: Modifiers, in_text_field: bool) -> Option<ShortcutAction> {
        if key == "Escape" {
            return Some(ShortcutAction::Escape);
        }

        if modifiers.command() && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if modifiers.command() {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "c" | "C" => Some(ShortcutAction::Copy),
                "x" | "X" => Some(ShortcutAction::Cut),
                "v" | "V" => Some(ShortcutAction::Paste),
                "s" | "S" => Some(ShortcutAction::Save),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" if !in_text_field => Some(ShortcutAction::Delete),
            _ => None,
        }
    }
}
