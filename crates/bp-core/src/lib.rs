pub mod document;
pub mod error;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod model;
pub mod ports;
pub mod preset;

pub use document::{DiagramDocument, Metadata, export_json, import_json};
pub use error::{ConnectionWarning, DiagramError, ErrorKind};
pub use geometry::{ConnectionPath, connection_path};
pub use id::{ComponentId, IdAllocator, PortId};
pub use layout::{AutoLayout, LayoutConfig, compute_layout};
pub use model::*;
pub use preset::{Preset, PresetNode};

// Re-export geometry primitives so downstream crates don't need a direct kurbo dependency
pub use kurbo::{Point, Rect};
