//! Undo/redo history and clipboard.
//!
//! History is snapshot based: before each committed mutation the editor
//! pushes a deep copy of the whole diagram. Undo swaps the live diagram with
//! the most recent snapshot and parks the live one on the redo stack.
//!
//! Drag gestures are batched: the diagram is captured when the gesture
//! starts and pushed once when it ends, so one undo reverts the whole drag.

use bp_core::model::{Component, Diagram};
use bp_core::{DiagramError, export_json, import_json};

pub struct HistoryStore {
    undo_stack: Vec<Diagram>,
    redo_stack: Vec<Diagram>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Diagram captured at the start of a batch.
    batch_snapshot: Option<Diagram>,
    /// Copied components. Connections are never copied.
    clipboard: Vec<Component>,
}

impl HistoryStore {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
            clipboard: Vec::new(),
        }
    }

    /// Push a deep copy of `diagram` and drop all forward history.
    /// Ignored while a batch is open; the batch snapshot covers it.
    pub fn save_state(&mut self, diagram: &Diagram) {
        if self.batch_depth > 0 {
            return;
        }
        self.push_undo(diagram.clone());
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, snapshot: Diagram) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Start a batch group, capturing `diagram` as the pre-gesture state.
    pub fn begin_batch(&mut self, diagram: &Diagram) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(diagram.clone());
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and `diagram`
    /// differs from the captured state, push one snapshot. Returns whether
    /// a snapshot was pushed.
    pub fn end_batch(&mut self, diagram: &Diagram) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        match self.batch_snapshot.take() {
            Some(before) if before != *diagram => {
                self.push_undo(before);
                self.redo_stack.clear();
                true
            }
            _ => false,
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Step back. Returns the diagram to restore, or `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self, current: &Diagram) -> Option<Diagram> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.clone());
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: &Diagram) -> Option<Diagram> {
        let next = self.redo_stack.pop()?;
        self.push_undo(current.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    pub fn copy(&mut self, components: &[Component]) {
        self.clipboard = components.to_vec();
    }

    pub fn clipboard(&self) -> &[Component] {
        &self.clipboard
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn serialize(&self, diagram: &Diagram) -> Result<String, DiagramError> {
        export_json(diagram)
    }

    /// Parse a document. On error nothing is returned, so callers keep
    /// their current state untouched.
    pub fn deserialize(&self, text: &str) -> Result<Diagram, DiagramError> {
        import_json(text)
    }
}
