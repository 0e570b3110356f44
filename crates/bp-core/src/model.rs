//! Core data model for blueprint diagrams.
//!
//! A diagram is a directed graph of typed components. Each component owns
//! its input and output ports; connections run from an output port of one
//! component to an input port of another. Ports are addressed externally by
//! a [`PortRef`] (component + port id), never by index.
//!
//! Component width and height are derived from the name and the port
//! counts. They are recomputed whenever either changes and are not
//! independently authoritative.

use crate::error::{ConnectionWarning, DiagramError};
use crate::id::{ComponentId, PortId};
use kurbo::Rect;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

// ─── Geometry constants ──────────────────────────────────────────────────

/// Smallest width a component may have.
pub const MIN_WIDTH: f64 = 200.0;
/// Smallest height a component may have.
pub const MIN_HEIGHT: f64 = 100.0;
/// Height of the title bar above the first port row.
pub const HEADER_HEIGHT: f64 = 25.0;
/// Vertical distance between consecutive port rows.
pub const PORT_SPACING: f64 = 30.0;
/// Approximate advance of one name character, used for derived width.
pub const NAME_CHAR_WIDTH: f64 = 8.0;
/// Horizontal room reserved around the name (port labels, margins).
pub const NAME_PADDING: f64 = 60.0;

/// The port type tag that is compatible with every other tag.
pub const ANY_TYPE: &str = "any";

// ─── Component kinds ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Function,
    Class,
    Module,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [Self::Function, Self::Class, Self::Module];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Module => "module",
        }
    }

    /// Name given to a freshly placed component before the user renames it.
    pub fn placeholder_name(self) -> String {
        format!("New {}", self.as_str())
    }

    /// Default `(name, type)` of the single input and single output port.
    pub fn default_ports(self) -> ((&'static str, &'static str), (&'static str, &'static str)) {
        match self {
            Self::Function => (("in1", ANY_TYPE), ("out1", ANY_TYPE)),
            Self::Class => (("constructor", ANY_TYPE), ("instance", "object")),
            Self::Module => (("import", ANY_TYPE), ("export", ANY_TYPE)),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(Self::Function),
            "class" => Ok(Self::Class),
            "module" => Ok(Self::Module),
            other => Err(DiagramError::Format(format!(
                "invalid component type `{other}`"
            ))),
        }
    }
}

// ─── Ports ───────────────────────────────────────────────────────────────

/// Which side of a component a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Prefix used for generated port names (`input2`, `output3`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// A typed attachment point. Identity is the id; name and type are
/// editable in place without touching connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub name: String,
    #[serde(rename = "type", default = "any_type")]
    pub port_type: String,
}

fn any_type() -> String {
    ANY_TYPE.to_string()
}

impl Port {
    pub fn new(id: PortId, name: impl Into<String>, port_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            port_type: port_type.into(),
        }
    }

    pub fn is_any(&self) -> bool {
        self.port_type == ANY_TYPE
    }
}

/// Two type tags are compatible when either is `any` or they are equal.
pub fn types_compatible(a: &str, b: &str) -> bool {
    a == ANY_TYPE || b == ANY_TYPE || a == b
}

pub type PortList = SmallVec<[Port; 2]>;

/// Explicit two-field port address.
///
/// On the wire it is written as `"<componentId>-<portId>"`. Both halves are
/// numeric, so splitting on the last `-` is unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub component: ComponentId,
    pub port: PortId,
}

impl PortRef {
    pub fn new(component: ComponentId, port: PortId) -> Self {
        Self { component, port }
    }

    /// The serialized `"<componentId>-<portId>"` form.
    pub fn key(&self) -> String {
        format!("{}-{}", self.component, self.port)
    }

    pub fn parse(key: &str) -> Option<Self> {
        let (component, port) = key.rsplit_once('-')?;
        Some(Self {
            component: ComponentId(component.parse().ok()?),
            port: PortId(port.parse().ok()?),
        })
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.component, self.port)
    }
}

impl Serialize for PortRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for PortRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PortRef::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid port reference `{s}`")))
    }
}

// ─── Components ──────────────────────────────────────────────────────────

/// A node in the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub inputs: PortList,
    #[serde(default)]
    pub outputs: PortList,
}

impl Component {
    /// A component with no ports. Size is derived immediately.
    pub fn new(id: ComponentId, kind: ComponentKind, x: f64, y: f64, name: &str) -> Self {
        let mut component = Self {
            id,
            x,
            y,
            width: MIN_WIDTH,
            height: MIN_HEIGHT,
            name: name.to_string(),
            kind,
            inputs: PortList::new(),
            outputs: PortList::new(),
        };
        component.recompute_size();
        component
    }

    pub fn ports(&self, direction: Direction) -> &[Port] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    pub fn ports_mut(&mut self, direction: Direction) -> &mut PortList {
        match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        }
    }

    /// `max(MIN_HEIGHT, HEADER_HEIGHT + (max(|inputs|, |outputs|) + 1) * PORT_SPACING)`
    pub fn derived_height(inputs: usize, outputs: usize) -> f64 {
        let rows = inputs.max(outputs) as f64;
        MIN_HEIGHT.max(HEADER_HEIGHT + (rows + 1.0) * PORT_SPACING)
    }

    pub fn derived_width(name: &str) -> f64 {
        MIN_WIDTH.max(name.chars().count() as f64 * NAME_CHAR_WIDTH + NAME_PADDING)
    }

    /// Re-derive width and height from the name and port counts.
    pub fn recompute_size(&mut self) {
        self.width = Self::derived_width(&self.name);
        self.height = Self::derived_height(self.inputs.len(), self.outputs.len());
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Structural problems with this component, empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push(format!("component {} has an empty name", self.id));
        }
        let mut seen = HashSet::new();
        for port in self.inputs.iter().chain(self.outputs.iter()) {
            if !seen.insert(port.id) {
                problems.push(format!(
                    "component {} has duplicate port id {}",
                    self.id, port.id
                ));
            }
        }
        problems
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// A directed edge from an output port to an input port. The `(from, to)`
/// pair is the identity; duplicates are forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connection {
    pub from: PortRef,
    pub to: PortRef,
}

impl Connection {
    pub fn new(from: PortRef, to: PortRef) -> Self {
        Self { from, to }
    }

    pub fn touches(&self, component: ComponentId) -> bool {
        self.from.component == component || self.to.component == component
    }

    pub fn touches_port(&self, port: PortRef) -> bool {
        self.from == port || self.to == port
    }
}

// ─── Diagram ─────────────────────────────────────────────────────────────

/// The canonical component and connection collections.
///
/// Cloning is a deep copy; history snapshots are plain clones of this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub components: Vec<Component>,
    pub connections: Vec<Connection>,
}

impl Diagram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.connections.is_empty()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.component(id).is_some()
    }

    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.iter().map(|c| c.id).collect()
    }

    /// Resolve a port reference to its owning component, the port, and
    /// the side it sits on.
    pub fn resolve(&self, port: PortRef) -> Option<(&Component, &Port, Direction)> {
        let component = self.component(port.component)?;
        let (found, direction) = component.find_port(port.port)?;
        Some((component, found, direction))
    }

    pub fn contains_connection(&self, from: PortRef, to: PortRef) -> bool {
        self.connections
            .iter()
            .any(|c| c.from == from && c.to == to)
    }

    /// Check a candidate edge against the graph rules without mutating.
    ///
    /// Returns `Ok(Some(warning))` when the edge is acceptable but the port
    /// types disagree.
    pub fn validate_connection(
        &self,
        from: PortRef,
        to: PortRef,
    ) -> Result<Option<ConnectionWarning>, DiagramError> {
        if self.contains_connection(from, to) {
            return Err(DiagramError::DuplicateConnection { from, to });
        }
        let (_, source, source_dir) = self.resolve(from).ok_or(DiagramError::DanglingPort(from))?;
        let (_, target, target_dir) = self.resolve(to).ok_or(DiagramError::DanglingPort(to))?;
        if source_dir != Direction::Output {
            return Err(DiagramError::InvalidDirection {
                port: from,
                expected: Direction::Output,
                actual: source_dir,
            });
        }
        if target_dir != Direction::Input {
            return Err(DiagramError::InvalidDirection {
                port: to,
                expected: Direction::Input,
                actual: target_dir,
            });
        }
        if types_compatible(&source.port_type, &target.port_type) {
            Ok(None)
        } else {
            Ok(Some(ConnectionWarning::TypeMismatch {
                from_type: source.port_type.clone(),
                to_type: target.port_type.clone(),
            }))
        }
    }

    /// Every connection with an endpoint on `component`, in insertion order.
    pub fn connections_touching(&self, component: ComponentId) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| c.touches(component))
            .copied()
            .collect()
    }

    pub fn remove_connection(&mut self, from: PortRef, to: PortRef) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| !(c.from == from && c.to == to));
        self.connections.len() != before
    }

    /// Remove a component together with every connection touching it.
    /// Connections are removed first so no dangling edge is ever observable.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<(Component, Vec<Connection>)> {
        let pos = self.components.iter().position(|c| c.id == id)?;
        let removed_edges = self.connections_touching(id);
        self.connections.retain(|c| !c.touches(id));
        let component = self.components.remove(pos);
        Some((component, removed_edges))
    }

    /// Remove a port and every connection attached to it.
    pub fn remove_port(
        &mut self,
        component: ComponentId,
        port: PortId,
        direction: Direction,
    ) -> Result<(Port, Vec<Connection>), DiagramError> {
        let owner = self
            .component_mut(component)
            .ok_or(DiagramError::ComponentNotFound(component))?;
        let removed = owner.remove_port(port, direction)?;
        let key = PortRef::new(component, port);
        let dropped: Vec<Connection> = self
            .connections
            .iter()
            .filter(|c| c.touches_port(key))
            .copied()
            .collect();
        self.connections.retain(|c| !c.touches_port(key));
        Ok((removed, dropped))
    }

    /// Ids of components whose bounds overlap `rect` (partial overlap counts).
    pub fn components_intersecting(&self, rect: Rect) -> Vec<ComponentId> {
        self.components
            .iter()
            .filter(|c| {
                let b = c.bounds();
                b.x0 < rect.x1 && b.x1 > rect.x0 && b.y0 < rect.y1 && b.y1 > rect.y0
            })
            .map(|c| c.id)
            .collect()
    }

    /// Component-level view of the graph. Parallel port-level edges
    /// collapse into one edge; every component is present as a node.
    pub fn component_graph(&self) -> DiGraphMap<ComponentId, ()> {
        let mut graph = DiGraphMap::with_capacity(self.components.len(), self.connections.len());
        for component in &self.components {
            graph.add_node(component.id);
        }
        for connection in &self.connections {
            graph.add_edge(connection.from.component, connection.to.component, ());
        }
        graph
    }

    /// Verify that every connection resolves to an output → input pair
    /// and that no edge is duplicated.
    pub fn check_integrity(&self) -> Result<(), DiagramError> {
        let mut seen = HashSet::new();
        for connection in &self.connections {
            if !seen.insert(*connection) {
                return Err(DiagramError::DuplicateConnection {
                    from: connection.from,
                    to: connection.to,
                });
            }
            match self.resolve(connection.from) {
                Some((_, _, Direction::Output)) => {}
                Some((_, _, actual)) => {
                    return Err(DiagramError::InvalidDirection {
                        port: connection.from,
                        expected: Direction::Output,
                        actual,
                    });
                }
                None => return Err(DiagramError::DanglingPort(connection.from)),
            }
            match self.resolve(connection.to) {
                Some((_, _, Direction::Input)) => {}
                Some((_, _, actual)) => {
                    return Err(DiagramError::InvalidDirection {
                        port: connection.to,
                        expected: Direction::Input,
                        actual,
                    });
                }
                None => return Err(DiagramError::DanglingPort(connection.to)),
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> DiagramStats {
        let mut by_kind = BTreeMap::new();
        let mut inputs = 0;
        let mut outputs = 0;
        for component in &self.components {
            *by_kind.entry(component.kind).or_insert(0) += 1;
            inputs += component.inputs.len();
            outputs += component.outputs.len();
        }
        DiagramStats {
            total: self.components.len(),
            by_kind,
            inputs,
            outputs,
            connections: self.connections.len(),
        }
    }
}

/// Summary counts over a diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramStats {
    pub total: usize,
    pub by_kind: BTreeMap<ComponentKind, usize>,
    pub inputs: usize,
    pub outputs: usize,
    pub connections: usize,
}
