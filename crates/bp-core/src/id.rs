use crate::model::Component;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a component in the diagram.
/// Allocated monotonically and never reused while the allocator lives.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u64);

/// Identifier of a port. Unique across every component, not just its owner.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub u64);

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port#{}", self.0)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out component and port ids.
///
/// Owned by the editor instance rather than living in a static, so two
/// editors never share counters. After a bulk load call [`IdAllocator::observe`]
/// so freshly created entities cannot collide with loaded ones.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_component: u64,
    next_port: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_component: 1,
            next_port: 1,
        }
    }

    pub fn next_component(&mut self) -> ComponentId {
        let id = ComponentId(self.next_component);
        self.next_component += 1;
        id
    }

    pub fn next_port(&mut self) -> PortId {
        let id = PortId(self.next_port);
        self.next_port += 1;
        id
    }

    /// Bump both counters past the largest ids found in `components`.
    /// Counters only ever move forward, so ids freed by a delete or an
    /// undo are still never handed out again.
    pub fn observe(&mut self, components: &[Component]) {
        for component in components {
            self.next_component = self.next_component.max(component.id.0.saturating_add(1));
            for port in component.inputs.iter().chain(component.outputs.iter()) {
                self.next_port = self.next_port.max(port.id.0.saturating_add(1));
            }
        }
    }

    /// The id the next call to [`IdAllocator::next_component`] will return.
    pub fn peek_component(&self) -> ComponentId {
        ComponentId(self.next_component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ComponentKind, Port};

    #[test]
    fn ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.next_component();
        let b = ids.next_component();
        assert!(b > a);
        assert_ne!(ids.next_port(), ids.next_port());
    }

    #[test]
    fn observe_never_moves_backwards() {
        let mut ids = IdAllocator::new();
        let mut loaded = Component::new(ComponentId(40), ComponentKind::Function, 0.0, 0.0, "x");
        loaded.inputs.push(Port::new(PortId(90), "in1", "any"));
        ids.observe(&[loaded]);
        assert_eq!(ids.next_component(), ComponentId(41));
        assert_eq!(ids.next_port(), PortId(91));

        // An empty load (e.g. undo back to nothing) keeps the high-water mark.
        ids.observe(&[]);
        assert_eq!(ids.next_component(), ComponentId(42));
    }

    #[test]
    fn observe_saturates_at_the_top_of_the_range() {
        let mut ids = IdAllocator::new();
        let loaded = Component::new(ComponentId(u64::MAX), ComponentKind::Function, 0.0, 0.0, "x");
        ids.observe(&[loaded]);
        assert_eq!(ids.peek_component(), ComponentId(u64::MAX));
    }
}
