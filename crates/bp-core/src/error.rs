//! Error taxonomy for diagram operations.
//!
//! Nothing here is fatal. Every rejected operation leaves the diagram and
//! the history stacks exactly as they were before the attempt.

use crate::id::{ComponentId, PortId};
use crate::model::{Direction, PortRef};
use thiserror::Error;

/// Coarse classification used by hosts to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or incomplete persisted document. Shown to the user.
    Format,
    /// Operation refused by a graph rule. Logged, no state change.
    Validation,
    /// Operation referenced a missing component or port. No-op.
    NotFound,
}

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("invalid diagram document: {0}")]
    Format(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection {from} -> {to} already exists")]
    DuplicateConnection { from: PortRef, to: PortRef },

    #[error("port reference {0} does not resolve to an existing port")]
    DanglingPort(PortRef),

    #[error("port {port} is an {actual:?} port, expected {expected:?}")]
    InvalidDirection {
        port: PortRef,
        expected: Direction,
        actual: Direction,
    },

    #[error("component {0} not found")]
    ComponentNotFound(ComponentId),

    #[error("port {port} not found on component {component}")]
    PortNotFound {
        component: ComponentId,
        port: PortId,
    },

    #[error("refusing to remove the last {direction:?} port of component {component}")]
    LastPort {
        component: ComponentId,
        direction: Direction,
    },

    #[error("no connection is in progress")]
    NoPendingConnection,

    #[error("unknown preset `{0}`")]
    UnknownPreset(String),

    #[error("collaborator failed: {0}")]
    Collaborator(String),
}

impl DiagramError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) | Self::Json(_) | Self::Io(_) | Self::Collaborator(_) => {
                ErrorKind::Format
            }
            Self::DuplicateConnection { .. }
            | Self::DanglingPort(_)
            | Self::InvalidDirection { .. }
            | Self::LastPort { .. }
            | Self::NoPendingConnection => ErrorKind::Validation,
            Self::ComponentNotFound(_) | Self::PortNotFound { .. } | Self::UnknownPreset(_) => {
                ErrorKind::NotFound
            }
        }
    }
}

/// Advisory finding on an accepted connection. The connection is created
/// regardless; the warning only exists for visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionWarning {
    TypeMismatch {
        from_type: String,
        to_type: String,
    },
}

impl std::fmt::Display for ConnectionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch { from_type, to_type } => {
                write!(f, "type mismatch: {from_type} -> {to_type}")
            }
        }
    }
}
