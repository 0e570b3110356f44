//! Two-phase connection protocol.
//!
//! `start` marks an output port as the pending source; `finish` consumes
//! the marker and produces a candidate edge ending on an input port. The
//! marker is cleared by `finish` whether it succeeds or not, so at most one
//! attempt is ever pending. Graph-level validation (duplicates, types) is
//! left to the orchestrator.

use bp_core::model::{Connection, Diagram, Direction, PortRef};
use bp_core::DiagramError;

#[derive(Debug, Default, Clone)]
pub struct ConnectionDraft {
    pending: Option<PortRef>,
}

impl ConnectionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a connection from `source`, which must be an output port.
    /// A refused start leaves any existing pending source unchanged.
    pub fn start(&mut self, diagram: &Diagram, source: PortRef) -> Result<(), DiagramError> {
        expect_direction(diagram, source, Direction::Output)?;
        self.pending = Some(source);
        Ok(())
    }

    pub fn pending(&self) -> Option<PortRef> {
        self.pending
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// Complete the pending connection on `target`, which must be an input
    /// port. The pending marker is cleared first, unconditionally.
    pub fn finish(&mut self, diagram: &Diagram, target: PortRef) -> Result<Connection, DiagramError> {
        let source = self.pending.take().ok_or(DiagramError::NoPendingConnection)?;
        expect_direction(diagram, target, Direction::Input)?;
        Ok(Connection::new(source, target))
    }

    /// Drop the pending source without producing anything. Returns whether
    /// something was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

fn expect_direction(diagram: &Diagram, port: PortRef, expected: Direction) -> Result<(), DiagramError> {
    let (_, _, actual) = diagram.resolve(port).ok_or(DiagramError::DanglingPort(port))?;
    if actual != expected {
        return Err(DiagramError::InvalidDirection {
            port,
            expected,
            actual,
        });
    }
    Ok(())
}
