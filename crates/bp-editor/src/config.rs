//! Editor configuration.
//!
//! Every field has a documented default, and partial JSON overrides are
//! accepted (`{"history_depth": 50}` keeps every other default).

use bp_core::DiagramError;
use bp_core::layout::LayoutConfig;
use serde::{Deserialize, Serialize};

/// Number of undo steps kept before the oldest is evicted.
pub const DEFAULT_HISTORY_DEPTH: usize = 20;
/// Offset applied to pasted and duplicated components, in both axes.
pub const DEFAULT_PASTE_OFFSET: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_depth: usize,
    pub paste_offset: f64,
    pub duplicate_offset: f64,
    pub layout: LayoutConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            paste_offset: DEFAULT_PASTE_OFFSET,
            duplicate_offset: DEFAULT_PASTE_OFFSET,
            layout: LayoutConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, DiagramError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"history_depth": 5, "layout": {"vertical_gap": 40}}"#)
            .unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.paste_offset, DEFAULT_PASTE_OFFSET);
        assert_eq!(config.layout.vertical_gap, 40.0);
        assert_eq!(config.layout.max_overlap_passes, 10);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(EditorConfig::from_json("{").is_err());
    }
}
