//! Input abstraction layer.
//!
//! The rendering collaborator owns hit testing. It reports each gesture as
//! an `InputEvent` carrying what was under the pointer, and the editor
//! interprets it against the current interaction state.

use bp_core::id::ComponentId;
use bp_core::model::PortRef;
use bp_core::Point;

/// Keyboard modifier state at the time of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
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

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const CMD: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// `ctrl` on most platforms, `meta` (⌘) on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Selection modifier: toggles on click, unions on box release.
    pub fn additive(&self) -> bool {
        self.shift || self.command()
    }
}

/// What was under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Empty,
    Component(ComponentId),
    Port(PortRef),
}

/// A normalized input event from the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        hit: Hit,
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
        hit: Hit,
        modifiers: Modifiers,
    },
    DoubleClick {
        hit: Hit,
    },
    Key {
        key: String,
        modifiers: Modifiers,
        /// Focus is inside a text-editing field owned by the host.
        in_text_field: bool,
    },
}

impl InputEvent {
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_covers_ctrl_and_meta() {
        assert!(Modifiers::CMD.command());
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert!(meta.command());
        assert!(meta.additive());
        assert!(!Modifiers::NONE.additive());
    }

    #[test]
    fn position_only_for_pointer_events() {
        let down = InputEvent::PointerDown {
            x: 3.0,
            y: 4.0,
            hit: Hit::Empty,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(down.position(), Some(Point::new(3.0, 4.0)));
        assert_eq!(InputEvent::DoubleClick { hit: Hit::Empty }.position(), None);
    }
}
