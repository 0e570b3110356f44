//! Persisted JSON document: `{components, connections, metadata}`.
//!
//! Import is all-or-nothing. A document is fully validated before a
//! [`Diagram`] is produced, so a rejected import never touches live state.

use crate::error::DiagramError;
use crate::model::{Component, Connection, Diagram};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const FORMAT_VERSION: &str = "1.0";
pub const MAX_COMPONENTS: usize = 10_000;
pub const MAX_CONNECTIONS: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    pub components: Vec<Component>,
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl DiagramDocument {
    /// Snapshot a diagram for export, stamped with the current time.
    pub fn from_diagram(diagram: &Diagram) -> Self {
        Self {
            components: diagram.components.clone(),
            connections: diagram.connections.clone(),
            metadata: Metadata::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, DiagramError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, DiagramError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Decode from an already-parsed JSON value. Both `components` and
    /// `connections` must be present arrays.
    pub fn from_value(value: Value) -> Result<Self, DiagramError> {
        let Some(object) = value.as_object() else {
            return Err(DiagramError::Format("document must be a JSON object".into()));
        };
        for key in ["components", "connections"] {
            match object.get(key) {
                None => {
                    return Err(DiagramError::Format(format!("missing `{key}`")));
                }
                Some(v) if !v.is_array() => {
                    return Err(DiagramError::Format(format!("`{key}` must be an array")));
                }
                Some(_) => {}
            }
        }
        let components = object.get("components").and_then(Value::as_array).map_or(0, Vec::len);
        let connections = object.get("connections").and_then(Value::as_array).map_or(0, Vec::len);
        if components > MAX_COMPONENTS {
            return Err(DiagramError::Format(format!(
                "too many components: {components} (max {MAX_COMPONENTS})"
            )));
        }
        if connections > MAX_CONNECTIONS {
            return Err(DiagramError::Format(format!(
                "too many connections: {connections} (max {MAX_CONNECTIONS})"
            )));
        }
        serde_json::from_value(value).map_err(|e| DiagramError::Format(e.to_string()))
    }

    /// Validate and convert into a live diagram. Derived sizes are
    /// recomputed; stored width/height values are not trusted.
    pub fn into_diagram(self) -> Result<Diagram, DiagramError> {
        let mut ids = HashSet::new();
        for component in &self.components {
            if !ids.insert(component.id) {
                return Err(DiagramError::Format(format!(
                    "duplicate component id {}",
                    component.id
                )));
            }
            // The allocator resumes at the largest id plus one.
            if component.id.0 == u64::MAX {
                return Err(DiagramError::Format(format!(
                    "component id {} out of range",
                    component.id
                )));
            }
            let mut ports = component.inputs.iter().chain(component.outputs.iter());
            if let Some(port) = ports.find(|p| p.id.0 == u64::MAX) {
                return Err(DiagramError::Format(format!(
                    "port id {} out of range",
                    port.id
                )));
            }
            if let Some(problem) = component.validate().into_iter().next() {
                return Err(DiagramError::Format(problem));
            }
        }

        let mut diagram = Diagram {
            components: self.components,
            connections: self.connections,
        };
        diagram
            .check_integrity()
            .map_err(|e| DiagramError::Format(e.to_string()))?;
        for component in &mut diagram.components {
            component.recompute_size();
        }
        Ok(diagram)
    }
}

/// Serialize a diagram as a pretty-printed document.
pub fn export_json(diagram: &Diagram) -> Result<String, DiagramError> {
    DiagramDocument::from_diagram(diagram).to_json()
}

/// Parse and validate a document into a diagram.
pub fn import_json(text: &str) -> Result<Diagram, DiagramError> {
    DiagramDocument::from_json(text)?.into_diagram()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const MINIMAL: &str = r#"{
        "components": [
            {"id": 1, "x": 0, "y": 0, "name": "A", "type": "function",
             "inputs": [{"id": 1, "name": "in1", "type": "any"}],
             "outputs": [{"id": 2, "name": "out1", "type": "any"}]},
            {"id": 2, "x": 300, "y": 0, "name": "B", "type": "module",
             "inputs": [{"id": 3, "name": "import"}],
             "outputs": [{"id": 4, "name": "export", "type": "any"}]}
        ],
        "connections": [{"from": "1-2", "to": "2-3"}]
    }"#;

    #[test]
    fn import_minimal_document() {
        let d = import_json(MINIMAL).unwrap();
        assert_eq!(d.components.len(), 2);
        assert_eq!(d.connections.len(), 1);
        // Missing port type defaults to `any`; missing sizes are derived.
        assert_eq!(d.components[1].inputs[0].port_type, "any");
        assert_eq!(d.components[0].height, crate::model::MIN_HEIGHT);
    }

    #[test]
    fn missing_connections_is_format_error() {
        let err = import_json(r#"{"components": []}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("connections"));
    }

    #[test]
    fn non_array_components_rejected() {
        let err = import_json(r#"{"components": {}, "connections": []}"#).unwrap_err();
        assert!(matches!(err, DiagramError::Format(_)));
    }

    #[test]
    fn invalid_json_is_format_kind() {
        let err = import_json("{ nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn dangling_connection_rejected() {
        let text = MINIMAL.replace("\"to\": \"2-3\"", "\"to\": \"7-3\"");
        assert!(matches!(
            import_json(&text).unwrap_err(),
            DiagramError::Format(_)
        ));
    }

    #[test]
    fn backwards_connection_rejected() {
        let text = MINIMAL.replace(
            r#"{"from": "1-2", "to": "2-3"}"#,
            r#"{"from": "2-3", "to": "1-2"}"#,
        );
        assert!(import_json(&text).is_err());
    }

    #[test]
    fn duplicate_component_ids_rejected() {
        let text = MINIMAL.replace("\"id\": 2, \"x\": 300", "\"id\": 1, \"x\": 300");
        assert!(import_json(&text).is_err());
    }

    #[test]
    fn largest_representable_id_rejected() {
        let text = MINIMAL.replace("\"id\": 2, \"x\": 300", "\"id\": 18446744073709551615, \"x\": 300");
        let err = import_json(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("out of range"));

        let text = MINIMAL.replace("{\"id\": 4, \"name\"", "{\"id\": 18446744073709551615, \"name\"");
        assert_eq!(import_json(&text).unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn unknown_component_type_rejected() {
        let text = MINIMAL.replace("\"module\"", "\"widget\"");
        assert!(import_json(&text).is_err());
    }

    #[test]
    fn export_then_import_is_identity() {
        let d = import_json(MINIMAL).unwrap();
        let text = export_json(&d).unwrap();
        assert!(text.contains("\"version\": \"1.0\""));
        assert_eq!(import_json(&text).unwrap(), d);
    }
}
