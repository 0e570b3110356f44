//! Integration tests: document import → auto-layout → verify layers.
//!
//! Exercises the `bp-core` pipeline end to end: JSON → Diagram → AutoLayout.

use bp_core::id::ComponentId;
use bp_core::layout::{LayoutConfig, compute_layout};
use bp_core::{export_json, import_json};

const DIAMOND: &str = r#"{
    "components": [
        {"id": 1, "x": 0, "y": 0, "name": "A", "type": "function",
         "inputs": [{"id": 1, "name": "in1"}], "outputs": [{"id": 2, "name": "out1"}]},
        {"id": 2, "x": 0, "y": 0, "name": "B", "type": "function",
         "inputs": [{"id": 3, "name": "in1"}], "outputs": [{"id": 4, "name": "out1"}]},
        {"id": 3, "x": 0, "y": 0, "name": "C", "type": "function",
         "inputs": [{"id": 5, "name": "in1"}], "outputs": [{"id": 6, "name": "out1"}]},
        {"id": 4, "x": 0, "y": 0, "name": "D", "type": "function",
         "inputs": [{"id": 7, "name": "in1"}], "outputs": [{"id": 8, "name": "out1"}]}
    ],
    "connections": [
        {"from": "1-2", "to": "2-3"},
        {"from": "1-2", "to": "3-5"},
        {"from": "2-4", "to": "4-7"},
        {"from": "3-6", "to": "4-7"}
    ]
}"#;

#[test]
fn diamond_lands_in_three_layers() {
    let diagram = import_json(DIAMOND).unwrap();
    let layout = compute_layout(&diagram, &LayoutConfig::default());

    assert_eq!(layout.layers.len(), 3);
    assert_eq!(layout.layers[0], vec![ComponentId(1)]);
    assert_eq!(layout.layers[1], vec![ComponentId(2), ComponentId(3)]);
    assert_eq!(layout.layers[2], vec![ComponentId(4)]);
}

#[test]
fn laid_out_rows_do_not_overlap() {
    let diagram = import_json(DIAMOND).unwrap();
    let layout = compute_layout(&diagram, &LayoutConfig::default());

    for (i, a) in layout.placements.iter().enumerate() {
        for b in layout.placements.iter().skip(i + 1) {
            let overlap_x = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
            let overlap_y = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
            assert!(
                overlap_x <= 0.0 || overlap_y <= 0.0,
                "{:?} overlaps {:?}",
                a.id,
                b.id
            );
        }
    }
}

#[test]
fn tight_config_still_resolves_overlaps() {
    let diagram = import_json(DIAMOND).unwrap();
    let config = LayoutConfig {
        horizontal_gap: -150.0,
        vertical_gap: -50.0,
        ..LayoutConfig::default()
    };
    let layout = compute_layout(&diagram, &config);
    assert!(layout.overlap_passes >= 1);
    assert!(layout.overlap_passes <= config.max_overlap_passes);
}

#[test]
fn layout_survives_roundtrip() {
    let diagram = import_json(DIAMOND).unwrap();
    let again = import_json(&export_json(&diagram).unwrap()).unwrap();
    let config = LayoutConfig::default();
    assert_eq!(
        compute_layout(&diagram, &config).layers,
        compute_layout(&again, &config).layers
    );
}
