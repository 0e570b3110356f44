//! Connection geometry.
//!
//! A connection path is four control points of a cubic Bézier running from
//! the source port anchor (right edge of its component) to the target port
//! anchor (left edge). Renderers consume the points or the `BezPath`.

use crate::id::ComponentId;
use crate::model::{Component, Connection, Diagram, Direction, HEADER_HEIGHT, PORT_SPACING, PortRef};
use kurbo::{BezPath, CubicBez, Point, Rect, Shape, Vec2};
use smallvec::SmallVec;

/// Minimum horizontal reach of the Bézier handles.
pub const MIN_HANDLE_OFFSET: f64 = 50.0;

/// Port anchor relative to the component's top-left corner.
pub fn port_offset(component: &Component, direction: Direction, index: usize) -> Vec2 {
    let x = match direction {
        Direction::Input => 0.0,
        Direction::Output => component.width,
    };
    Vec2::new(x, HEADER_HEIGHT + (index as f64 + 1.0) * PORT_SPACING)
}

/// Absolute anchor point of a port, or `None` if it does not resolve.
pub fn port_anchor(diagram: &Diagram, port: PortRef) -> Option<Point> {
    let component = diagram.component(port.component)?;
    let (index, direction) = component.port_index(port.port)?;
    Some(Point::new(component.x, component.y) + port_offset(component, direction, index))
}

/// Ordered control points for one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPath {
    pub connection: Connection,
    pub points: SmallVec<[Point; 4]>,
}

impl ConnectionPath {
    /// First control point; `None` for a path built with no points.
    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn to_bez_path(&self) -> BezPath {
        match self.points.as_slice() {
            [p0, p1, p2, p3] => CubicBez::new(*p0, *p1, *p2, *p3).to_path(0.1),
            points => {
                let mut path = BezPath::new();
                let mut iter = points.iter();
                if let Some(first) = iter.next() {
                    path.move_to(*first);
                }
                for p in iter {
                    path.line_to(*p);
                }
                path
            }
        }
    }

    pub fn bounding_box(&self) -> Rect {
        self.to_bez_path().bounding_box()
    }
}

/// Recompute the path of a single connection from current positions.
pub fn connection_path(diagram: &Diagram, connection: &Connection) -> Option<ConnectionPath> {
    let start = port_anchor(diagram, connection.from)?;
    let end = port_anchor(diagram, connection.to)?;
    let reach = ((end.x - start.x).abs() / 2.0).max(MIN_HANDLE_OFFSET);
    let handle = Vec2::new(reach, 0.0);

    let mut points = SmallVec::new();
    points.push(start);
    points.push(start + handle);
    points.push(end - handle);
    points.push(end);
    Some(ConnectionPath {
        connection: *connection,
        points,
    })
}

/// Paths for every connection touching `component`. Called after a move,
/// resize, rename, or port change on that component.
pub fn paths_touching(diagram: &Diagram, component: ComponentId) -> Vec<ConnectionPath> {
    diagram
        .connections
        .iter()
        .filter(|c| c.touches(component))
        .filter_map(|c| connection_path(diagram, c))
        .collect()
}
