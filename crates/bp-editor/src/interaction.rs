//! Selection set and the pointer interaction state machine.
//!
//! The editor is in exactly one [`Interaction`] state at a time. Gesture
//! state lives inside the variant, so a drag cannot coexist with a box
//! select or a pending rename.

use bp_core::id::ComponentId;
use bp_core::model::{Diagram, PortRef};
use bp_core::{Point, Rect};
use std::collections::BTreeSet;

// ─── Selection ───────────────────────────────────────────────────────────

/// Ordered set of selected component ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ComponentId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Single-click without modifier.
    pub fn replace(&mut self, id: ComponentId) {
        self.ids.clear();
        self.ids.insert(id);
    }

    /// Click with the additive modifier. Returns whether `id` is now selected.
    pub fn toggle(&mut self, id: ComponentId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn insert(&mut self, id: ComponentId) {
        self.ids.insert(id);
    }

    pub fn remove(&mut self, id: ComponentId) -> bool {
        self.ids.remove(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Replace or extend the set with a box-select result.
    pub fn apply_box(&mut self, hits: impl IntoIterator<Item = ComponentId>, additive: bool) {
        if !additive {
            self.ids.clear();
        }
        self.ids.extend(hits);
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ComponentId> {
        self.ids.iter().copied().collect()
    }

    /// Drop ids that no longer exist in `diagram` (after undo/redo/load).
    pub fn retain_existing(&mut self, diagram: &Diagram) {
        self.ids.retain(|id| diagram.contains(*id));
    }
}

// ─── Gestures ────────────────────────────────────────────────────────────

/// Rigid group drag. Every member moves by the same delta from the
/// pointer-down point, so members never drift relative to each other.
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub origin: Point,
    pub starts: Vec<(ComponentId, Point)>,
    pub moved: bool,
}

impl DragGesture {
    /// Capture the pre-drag position of every selected component.
    pub fn capture(diagram: &Diagram, selection: &Selection, origin: Point) -> Self {
        let starts = selection
            .iter()
            .filter_map(|id| diagram.component(id).map(|c| (id, Point::new(c.x, c.y))))
            .collect();
        Self {
            origin,
            starts,
            moved: false,
        }
    }

    /// Target positions for a pointer at `pointer`.
    pub fn targets(&self, pointer: Point) -> Vec<(ComponentId, Point)> {
        let delta = pointer - self.origin;
        self.starts
            .iter()
            .map(|(id, start)| (*id, *start + delta))
            .collect()
    }
}

/// Rubber-band rectangle between the press point and the current pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGesture {
    pub start: Point,
    pub current: Point,
}

impl BoxGesture {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            current: start,
        }
    }

    /// Normalized rectangle, whichever way the box was dragged.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }
}

/// In-place name edit. `text` is the live field contents; `original`
/// is restored on cancel or empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSession {
    pub component: ComponentId,
    pub original: String,
    pub text: String,
}

// ─── State machine ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging(DragGesture),
    BoxSelecting(BoxGesture),
    ConnectingEdge(PortRef),
    EditingName(RenameSession),
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging(_) => "dragging",
            Self::BoxSelecting(_) => "box-selecting",
            Self::ConnectingEdge(_) => "connecting",
            Self::EditingName(_) => "editing-name",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::model::{Component, ComponentKind};

    fn diagram() -> Diagram {
        Diagram {
            components: vec![
                Component::new(ComponentId(1), ComponentKind::Function, 10.0, 20.0, "a"),
                Component::new(ComponentId(2), ComponentKind::Function, 300.0, 40.0, "b"),
            ],
            connections: Vec::new(),
        }
    }

    #[test]
    fn click_replaces_and_toggle_flips() {
        let mut sel = Selection::new();
        sel.replace(ComponentId(1));
        sel.replace(ComponentId(2));
        assert_eq!(sel.to_vec(), vec![ComponentId(2)]);

        assert!(sel.toggle(ComponentId(1)));
        assert_eq!(sel.len(), 2);
        assert!(!sel.toggle(ComponentId(1)));
        assert_eq!(sel.to_vec(), vec![ComponentId(2)]);
    }

    #[test]
    fn box_replace_vs_union() {
        let mut sel = Selection::new();
        sel.insert(ComponentId(5));
        sel.apply_box([ComponentId(1)], true);
        assert_eq!(sel.to_vec(), vec![ComponentId(1), ComponentId(5)]);
        sel.apply_box([ComponentId(2)], false);
        assert_eq!(sel.to_vec(), vec![ComponentId(2)]);
    }

    #[test]
    fn group_drag_is_rigid() {
        let d = diagram();
        let mut sel = Selection::new();
        sel.insert(ComponentId(1));
        sel.insert(ComponentId(2));
        let drag = DragGesture::capture(&d, &sel, Point::new(100.0, 100.0));

        let targets = drag.targets(Point::new(130.0, 90.0));
        assert_eq!(
            targets,
            vec![
                (ComponentId(1), Point::new(40.0, 10.0)),
                (ComponentId(2), Point::new(330.0, 30.0)),
            ]
        );
        // Deltas are always taken from the original press point.
        let again = drag.targets(Point::new(130.0, 90.0));
        assert_eq!(targets, again);
    }

    #[test]
    fn box_rect_is_normalized() {
        let mut gesture = BoxGesture::new(Point::new(50.0, 60.0));
        gesture.current = Point::new(10.0, 5.0);
        assert_eq!(gesture.rect(), Rect::new(10.0, 5.0, 50.0, 60.0));
    }

    #[test]
    fn retain_existing_drops_stale_ids() {
        let d = diagram();
        let mut sel = Selection::new();
        sel.insert(ComponentId(1));
        sel.insert(ComponentId(9));
        sel.retain_existing(&d);
        assert_eq!(sel.to_vec(), vec![ComponentId(1)]);
    }
}
