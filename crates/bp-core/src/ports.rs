//! Port model: creation, removal, lookup, and in-place edits.
//!
//! Every change to a port list re-derives the owning component's size.
//! Port ids come from the caller's [`IdAllocator`] and are never reused.

use crate::error::DiagramError;
use crate::id::{IdAllocator, PortId};
use crate::model::{ANY_TYPE, Component, Direction, Port};

impl Component {
    /// Append a port named `"{input|output}{count + 1}"` of type `any`.
    pub fn add_port(&mut self, direction: Direction, ids: &mut IdAllocator) -> &Port {
        let name = format!("{}{}", direction.label(), self.ports(direction).len() + 1);
        let port = Port::new(ids.next_port(), name, ANY_TYPE);
        self.ports_mut(direction).push(port);
        self.recompute_size();
        let ports = self.ports(direction);
        &ports[ports.len() - 1]
    }

    /// Remove a port by id from the given side.
    ///
    /// The last remaining port of a side is never removed. Connections are
    /// not touched here; use `Diagram::remove_port` to cascade.
    pub fn remove_port(&mut self, port: PortId, direction: Direction) -> Result<Port, DiagramError> {
        let pos = self.check_remove_port(port, direction)?;
        let removed = self.ports_mut(direction).remove(pos);
        self.recompute_size();
        Ok(removed)
    }

    /// Whether `remove_port` would succeed, without mutating. Returns the
    /// row index of the port on its side.
    pub fn check_remove_port(&self, port: PortId, direction: Direction) -> Result<usize, DiagramError> {
        let component = self.id;
        let ports = self.ports(direction);
        let pos = ports
            .iter()
            .position(|p| p.id == port)
            .ok_or(DiagramError::PortNotFound { component, port })?;
        if ports.len() == 1 {
            return Err(DiagramError::LastPort {
                component,
                direction,
            });
        }
        Ok(pos)
    }

    /// Look a port up by id, inputs first.
    pub fn find_port(&self, port: PortId) -> Option<(&Port, Direction)> {
        self.inputs
            .iter()
            .find(|p| p.id == port)
            .map(|p| (p, Direction::Input))
            .or_else(|| {
                self.outputs
                    .iter()
                    .find(|p| p.id == port)
                    .map(|p| (p, Direction::Output))
            })
    }

    pub fn find_port_mut(&mut self, port: PortId) -> Option<&mut Port> {
        self.inputs
            .iter_mut()
            .chain(self.outputs.iter_mut())
            .find(|p| p.id == port)
    }

    /// Row index of a port on its side, used for anchor geometry.
    pub fn port_index(&self, port: PortId) -> Option<(usize, Direction)> {
        if let Some(i) = self.inputs.iter().position(|p| p.id == port) {
            return Some((i, Direction::Input));
        }
        self.outputs
            .iter()
            .position(|p| p.id == port)
            .map(|i| (i, Direction::Output))
    }

    pub fn rename_port(&mut self, port: PortId, name: &str) -> Result<(), DiagramError> {
        let component = self.id;
        let found = self
            .find_port_mut(port)
            .ok_or(DiagramError::PortNotFound { component, port })?;
        found.name = name.to_string();
        Ok(())
    }

    pub fn set_port_type(&mut self, port: PortId, port_type: &str) -> Result<(), DiagramError> {
        let component = self.id;
        let found = self
            .find_port_mut(port)
            .ok_or(DiagramError::PortNotFound { component, port })?;
        found.port_type = port_type.to_string();
        Ok(())
    }

    /// First port on a side, used when wiring edges by name.
    pub fn first_port(&self, direction: Direction) -> Option<&Port> {
        self.ports(direction).first()
    }
}
