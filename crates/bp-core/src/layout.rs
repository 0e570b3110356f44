//! Layered auto-layout.
//!
//! 1. Collapse port-level connections into a component-level graph.
//! 2. Assign layers breadth-first from the zero in-degree components. A
//!    fully cyclic graph seeds every component as a root instead.
//! 3. Lay each layer out as a centered row, members sorted by id.
//! 4. Push apart any pair of boxes that still overlap, for a bounded
//!    number of passes.
//!
//! The result is a proposal; the caller decides when to apply it.

use crate::id::ComponentId;
use crate::model::Diagram;
use petgraph::Direction::{Incoming, Outgoing};
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Tunables for auto-layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Shared x-center every row is spread around.
    pub center_x: f64,
    /// Top of the first row.
    pub base_y: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    /// Extra distance added when pushing overlapping boxes apart.
    pub overlap_padding: f64,
    pub max_overlap_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            center_x: 600.0,
            base_y: 80.0,
            horizontal_gap: 80.0,
            vertical_gap: 100.0,
            overlap_padding: 20.0,
            max_overlap_passes: 10,
        }
    }
}

/// Proposed top-left position for one component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: ComponentId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoLayout {
    /// Components per layer, each layer sorted by id.
    pub layers: Vec<Vec<ComponentId>>,
    pub placements: Vec<Placement>,
    /// Overlap passes that moved at least one box.
    pub overlap_passes: usize,
}

impl AutoLayout {
    pub fn layer_of(&self, id: ComponentId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.contains(&id))
    }

    pub fn position(&self, id: ComponentId) -> Option<(f64, f64)> {
        self.placements
            .iter()
            .find(|p| p.id == id)
            .map(|p| (p.x, p.y))
    }
}

/// Run the full layout pipeline over `diagram`.
#[must_use]
pub fn compute_layout(diagram: &Diagram, config: &LayoutConfig) -> AutoLayout {
    if diagram.components.is_empty() {
        return AutoLayout::default();
    }

    let layers = assign_layers(diagram);

    let max_width = diagram
        .components
        .iter()
        .map(|c| c.width)
        .fold(0.0_f64, f64::max);
    let max_height = diagram
        .components
        .iter()
        .map(|c| c.height)
        .fold(0.0_f64, f64::max);
    let spacing = max_width + config.horizontal_gap;

    let mut placements = Vec::with_capacity(diagram.components.len());
    for (layer_index, layer) in layers.iter().enumerate() {
        let y = config.base_y + layer_index as f64 * (max_height + config.vertical_gap);
        let mid = (layer.len() as f64 - 1.0) / 2.0;
        for (slot, &id) in layer.iter().enumerate() {
            let Some(component) = diagram.component(id) else {
                continue;
            };
            let slot_center = config.center_x + (slot as f64 - mid) * spacing;
            placements.push(Placement {
                id,
                x: slot_center - component.width / 2.0,
                y,
                width: component.width,
                height: component.height,
            });
        }
    }

    let overlap_passes = resolve_overlaps(
        &mut placements,
        config.overlap_padding,
        config.max_overlap_passes,
    );
    log::trace!(
        "auto-layout: {} components in {} layers, {} overlap passes",
        placements.len(),
        layers.len(),
        overlap_passes
    );

    AutoLayout {
        layers,
        placements,
        overlap_passes,
    }
}

/// Assign every component to a layer.
///
/// Layer of a component is the maximum of `predecessor layer + 1` over the
/// incoming edges observed while propagating. Self-loops are ignored. When
/// no component has zero in-degree, every component is seeded as a root.
pub fn assign_layers(diagram: &Diagram) -> Vec<Vec<ComponentId>> {
    let order = diagram.component_ids();
    let mut graph: DiGraphMap<ComponentId, ()> = diagram.component_graph();
    for &id in &order {
        graph.remove_edge(id, id);
    }

    let mut in_degree: HashMap<ComponentId, usize> = order
        .iter()
        .map(|&id| (id, graph.neighbors_directed(id, Incoming).count()))
        .collect();

    let mut queue: VecDeque<ComponentId> = order
        .iter()
        .copied()
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();
    if queue.is_empty() {
        log::debug!("auto-layout: no roots found, treating every component as a root");
        queue = order.iter().copied().collect();
    }
    let mut enqueued: HashSet<ComponentId> = queue.iter().copied().collect();
    let mut layer: HashMap<ComponentId, usize> = order.iter().map(|&id| (id, 0)).collect();

    while let Some(id) = queue.pop_front() {
        let current = layer.get(&id).copied().unwrap_or(0);
        for next in graph.neighbors_directed(id, Outgoing) {
            let entry = layer.entry(next).or_insert(0);
            *entry = (*entry).max(current + 1);
            if let Some(degree) = in_degree.get_mut(&next) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 && enqueued.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    let mut grouped: BTreeMap<usize, Vec<ComponentId>> = BTreeMap::new();
    for id in order {
        grouped.entry(layer[&id]).or_default().push(id);
    }
    grouped
        .into_values()
        .map(|mut members| {
            members.sort();
            members
        })
        .collect()
}

/// Push overlapping boxes apart.
///
/// Each pass scans all pairs sorted by `(y, x)`. For a pair that overlaps on
/// both axes, the later box moves along the axis with the larger overlap by
/// `overlap + padding`. Stops after a pass with no moves or after
/// `max_passes`. Returns the number of passes that moved something.
pub fn resolve_overlaps(placements: &mut [Placement], padding: f64, max_passes: usize) -> usize {
    let mut passes = 0;
    for _ in 0..max_passes {
        placements.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        let mut moved = false;
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                let a = placements[i];
                let b = placements[j];
                let overlap_x = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
                let overlap_y = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
                if overlap_x > 0.0 && overlap_y > 0.0 {
                    if overlap_x > overlap_y {
                        placements[j].x += overlap_x + padding;
                    } else {
                        placements[j].y += overlap_y + padding;
                    }
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
        passes += 1;
    }
    passes
}
