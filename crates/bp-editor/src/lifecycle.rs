//! Component construction helpers.
//!
//! These build new components but never touch the canonical diagram or
//! history; the orchestrator inserts what they return and takes the
//! snapshot.

use bp_core::id::IdAllocator;
use bp_core::model::{Component, ComponentKind, Port};

/// A fresh component of `kind` with the kind's default port pair and a
/// placeholder name.
pub fn spawn(kind: ComponentKind, x: f64, y: f64, ids: &mut IdAllocator) -> Component {
    spawn_named(kind, x, y, &kind.placeholder_name(), ids)
}

pub fn spawn_named(kind: ComponentKind, x: f64, y: f64, name: &str, ids: &mut IdAllocator) -> Component {
    let mut component = Component::new(ids.next_component(), kind, x, y, name);
    let ((in_name, in_type), (out_name, out_type)) = kind.default_ports();
    component.inputs.push(Port::new(ids.next_port(), in_name, in_type));
    component.outputs.push(Port::new(ids.next_port(), out_name, out_type));
    component.recompute_size();
    component
}

/// Deep copy of `source` under fresh component and port ids, shifted by
/// `offset` on both axes. Connections are never carried over.
pub fn duplicate(source: &Component, offset: f64, ids: &mut IdAllocator) -> Component {
    let mut copy = source.clone();
    copy.id = ids.next_component();
    copy.x += offset;
    copy.y += offset;
    for port in copy.inputs.iter_mut().chain(copy.outputs.iter_mut()) {
        port.id = ids.next_port();
    }
    copy.recompute_size();
    copy
}

/// Duplicate every clipboard entry, preserving clipboard order.
pub fn paste_batch(clipboard: &[Component], offset: f64, ids: &mut IdAllocator) -> Vec<Component> {
    clipboard
        .iter()
        .map(|c| duplicate(c, offset, ids))
        .collect()
}

/// Trimmed name, or `None` when nothing but whitespace remains.
pub fn normalize_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
