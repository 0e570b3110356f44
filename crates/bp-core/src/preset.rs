//! Named canned graphs.
//!
//! A preset is `{nodes: [{name, type}], edges: [[fromName, toName]]}`. The
//! editor instantiates one by creating each node, wiring every edge from the
//! first output of the source to the first input of the target, and then
//! running auto-layout.

use crate::error::DiagramError;
use crate::model::ComponentKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<PresetNode>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

const BUILTIN: &[&str] = &["gateway", "ecommerce"];

impl Preset {
    pub fn builtin_names() -> &'static [&'static str] {
        BUILTIN
    }

    pub fn builtin(name: &str) -> Result<Self, DiagramError> {
        match name {
            "gateway" => Ok(gateway()),
            "ecommerce" | "e-commerce" => Ok(ecommerce()),
            other => Err(DiagramError::UnknownPreset(other.to_string())),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, DiagramError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Node names in creation order: declared nodes first, then any edge
    /// endpoint that was not declared (created as a `function`).
    pub fn resolved_nodes(&self) -> Vec<PresetNode> {
        let mut nodes = self.nodes.clone();
        for (from, to) in &self.edges {
            for name in [from, to] {
                if !nodes.iter().any(|n| &n.name == name) {
                    nodes.push(PresetNode {
                        name: name.clone(),
                        kind: ComponentKind::Function,
                    });
                }
            }
        }
        nodes
    }
}

fn build(name: &str, nodes: &[(&str, ComponentKind)], edges: &[(&str, &str)]) -> Preset {
    Preset {
        name: name.to_string(),
        nodes: nodes
            .iter()
            .map(|(n, kind)| PresetNode {
                name: (*n).to_string(),
                kind: *kind,
            })
            .collect(),
        edges: edges
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect(),
    }
}

fn gateway() -> Preset {
    use ComponentKind::*;
    build(
        "gateway",
        &[
            ("Client", Module),
            ("API Gateway", Module),
            ("Auth Service", Function),
            ("User Service", Class),
            ("Order Service", Class),
            ("Database", Module),
        ],
        &[
            ("Client", "API Gateway"),
            ("API Gateway", "Auth Service"),
            ("API Gateway", "User Service"),
            ("API Gateway", "Order Service"),
            ("User Service", "Database"),
            ("Order Service", "Database"),
        ],
    )
}

fn ecommerce() -> Preset {
    use ComponentKind::*;
    build(
        "ecommerce",
        &[
            ("Web Frontend", Module),
            ("Product Catalog", Class),
            ("Shopping Cart", Class),
            ("Checkout", Function),
            ("Payment Gateway", Module),
            ("Inventory", Class),
            ("Notifications", Function),
            ("Database", Module),
        ],
        &[
            ("Web Frontend", "Product Catalog"),
            ("Web Frontend", "Shopping Cart"),
            ("Shopping Cart", "Checkout"),
            ("Checkout", "Payment Gateway"),
            ("Checkout", "Inventory"),
            ("Payment Gateway", "Notifications"),
            ("Product Catalog", "Database"),
            ("Inventory", "Database"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve() {
        for name in Preset::builtin_names() {
            let preset = Preset::builtin(name).unwrap();
            assert_eq!(preset.resolved_nodes().len(), preset.nodes.len());
        }
        assert!(matches!(
            Preset::builtin("nope"),
            Err(DiagramError::UnknownPreset(_))
        ));
    }

    #[test]
    fn undeclared_edge_endpoints_become_functions() {
        let preset = Preset::from_json(
            r#"{"nodes": [{"name": "A", "type": "module"}], "edges": [["A", "B"]]}"#,
        )
        .unwrap();
        let nodes = preset.resolved_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].name, "B");
        assert_eq!(nodes[1].kind, ComponentKind::Function);
    }
}
