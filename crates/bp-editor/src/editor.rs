//! The editor orchestrator.
//!
//! `Editor` owns the canonical diagram, the id counters, history, selection
//! and the interaction state. It is the only place that snapshots history,
//! and every mutating operation follows the same protocol:
//!
//! 1. validate against the current diagram (a refusal changes nothing),
//! 2. snapshot the pre-mutation diagram,
//! 3. mutate,
//! 4. tell the render sink what changed.
//!
//! Hosts feed user gestures in through [`Editor::handle_event`] and drain
//! outbound notifications with [`Editor::drain_events`].

use crate::collab::{CollaboratorReply, DiagramCollaborator};
use crate::config::EditorConfig;
use crate::connect::ConnectionDraft;
use crate::history::HistoryStore;
use crate::input::{Hit, InputEvent, Modifiers};
use crate::interaction::{BoxGesture, DragGesture, Interaction, RenameSession, Selection};
use crate::lifecycle;
use crate::render::{NullRenderer, RenderSink};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use bp_core::geometry::{ConnectionPath, connection_path, paths_touching};
use bp_core::id::{ComponentId, IdAllocator, PortId};
use bp_core::layout::{AutoLayout, compute_layout};
use bp_core::model::{
    Component, ComponentKind, Connection, Diagram, DiagramStats, Direction, PortRef,
};
use bp_core::preset::Preset;
use bp_core::{ConnectionWarning, DiagramDocument, DiagramError, Point, Rect};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Notifications for the host, queued in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    HistoryChanged { can_undo: bool, can_redo: bool },
    SelectionChanged(Vec<ComponentId>),
    /// A connection was created between ports of different types.
    ConnectionWarning {
        connection: Connection,
        warning: ConnectionWarning,
    },
    /// The save shortcut fired; persisting is up to the host.
    SaveRequested,
    DocumentLoaded { components: usize, connections: usize },
}

/// Result of a committed connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOutcome {
    pub connection: Connection,
    pub warning: Option<ConnectionWarning>,
}

pub struct Editor<R: RenderSink = NullRenderer> {
    diagram: Diagram,
    ids: IdAllocator,
    history: HistoryStore,
    selection: Selection,
    interaction: Interaction,
    draft: ConnectionDraft,
    renderer: R,
    config: EditorConfig,
    events: Vec<EditorEvent>,
}

impl Default for Editor<NullRenderer> {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor<NullRenderer> {
    pub fn new() -> Self {
        Self::with_renderer(NullRenderer)
    }
}

impl<R: RenderSink> Editor<R> {
    pub fn with_renderer(renderer: R) -> Self {
        Self::with_config(renderer, EditorConfig::default())
    }

    pub fn with_config(renderer: R, config: EditorConfig) -> Self {
        Self {
            diagram: Diagram::new(),
            ids: IdAllocator::new(),
            history: HistoryStore::new(config.history_depth),
            selection: Selection::new(),
            interaction: Interaction::Idle,
            draft: ConnectionDraft::new(),
            renderer,
            config,
            events: Vec::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.diagram.component(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn pending_connection(&self) -> Option<PortRef> {
        self.draft.pending()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn stats(&self) -> DiagramStats {
        self.diagram.stats()
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Internal plumbing ───────────────────────────────────────────────

    /// Snapshot the current (pre-mutation) diagram.
    fn snapshot(&mut self) {
        // A discrete edit during a drag commits the drag as its own step.
        if matches!(self.interaction, Interaction::Dragging(_)) {
            self.interaction = Interaction::Idle;
            self.end_drag();
        }
        self.history.save_state(&self.diagram);
        self.notify_history();
    }

    fn notify_history(&mut self) {
        self.events.push(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn notify_selection(&mut self) {
        self.events
            .push(EditorEvent::SelectionChanged(self.selection.to_vec()));
    }

    /// Re-render a component and recompute every connection touching it.
    fn refresh_component(&mut self, id: ComponentId) {
        if let Some(component) = self.diagram.component(id) {
            self.renderer.rerender_component(component);
        }
        for path in paths_touching(&self.diagram, id) {
            self.renderer.render_connection(&path);
        }
    }

    fn insert_component(&mut self, component: Component) -> ComponentId {
        let id = component.id;
        self.renderer.render_component(&component);
        self.diagram.components.push(component);
        id
    }

    /// Remove a component and its connections without snapshotting.
    fn remove_component_inner(&mut self, id: ComponentId) -> bool {
        let Some((_, edges)) = self.diagram.remove_component(id) else {
            return false;
        };
        for edge in &edges {
            self.renderer.delete_connection_visual(edge);
        }
        self.renderer.delete_component_visual(id);

        if self.draft.pending().is_some_and(|p| p.component == id) {
            self.draft.cancel();
        }
        let stale = match &self.interaction {
            Interaction::ConnectingEdge(source) => source.component == id,
            Interaction::EditingName(session) => session.component == id,
            _ => false,
        };
        if stale {
            self.interaction = Interaction::Idle;
        }
        log::debug!("deleted component {id} and {} connection(s)", edges.len());
        true
    }

    /// Swap in a whole new diagram (undo, redo, load). Visuals are torn
    /// down and rebuilt, counters are re-synchronized, and stale selection
    /// entries are dropped.
    fn replace_diagram(&mut self, next: Diagram) {
        for connection in &self.diagram.connections {
            self.renderer.delete_connection_visual(connection);
        }
        for component in &self.diagram.components {
            self.renderer.delete_component_visual(component.id);
        }

        self.diagram = next;
        self.ids.observe(&self.diagram.components);

        for component in &self.diagram.components {
            self.renderer.render_component(component);
        }
        for connection in &self.diagram.connections {
            if let Some(path) = connection_path(&self.diagram, connection) {
                self.renderer.render_connection(&path);
            }
        }

        let before = self.selection.len();
        self.selection.retain_existing(&self.diagram);
        if self.selection.len() != before {
            self.notify_selection();
        }
    }

    // ─── Component lifecycle ─────────────────────────────────────────────

    /// Place a new component of `kind` with its default ports.
    pub fn create_component(&mut self, kind: ComponentKind, x: f64, y: f64) -> ComponentId {
        self.snapshot();
        let component = lifecycle::spawn(kind, x, y, &mut self.ids);
        log::debug!("created {kind} component {} at ({x}, {y})", component.id);
        self.insert_component(component)
    }

    /// Delete a component, every connection touching it, and its selection.
    pub fn delete_component(&mut self, id: ComponentId) -> bool {
        if !self.diagram.contains(id) {
            log::debug!("delete: component {id} not found");
            return false;
        }
        self.snapshot();
        self.remove_component_inner(id);
        if self.selection.remove(id) {
            self.notify_selection();
        }
        true
    }

    /// Delete every selected component as one undo step.
    pub fn delete_selected(&mut self) -> usize {
        let targets: Vec<ComponentId> = self
            .selection
            .iter()
            .filter(|id| self.diagram.contains(*id))
            .collect();
        if targets.is_empty() {
            return 0;
        }
        self.snapshot();
        for id in &targets {
            self.remove_component_inner(*id);
        }
        self.selection.clear();
        self.notify_selection();
        targets.len()
    }

    /// Copy a component under fresh ids, offset by the duplicate offset.
    pub fn duplicate_component(&mut self, id: ComponentId) -> Option<ComponentId> {
        let Some(source) = self.diagram.component(id).cloned() else {
            log::debug!("duplicate: component {id} not found");
            return None;
        };
        self.snapshot();
        let copy = lifecycle::duplicate(&source, self.config.duplicate_offset, &mut self.ids);
        Some(self.insert_component(copy))
    }

    fn selected_components(&self) -> Vec<Component> {
        self.diagram
            .components
            .iter()
            .filter(|c| self.selection.contains(c.id))
            .cloned()
            .collect()
    }

    /// Put the selected components on the clipboard. Connections are not
    /// copied.
    pub fn copy_selected(&mut self) -> usize {
        let components = self.selected_components();
        if components.is_empty() {
            return 0;
        }
        self.history.copy(&components);
        components.len()
    }

    pub fn cut_selected(&mut self) -> usize {
        if self.copy_selected() == 0 {
            return 0;
        }
        self.delete_selected()
    }

    /// Paste the clipboard under fresh ids, offset from the copied
    /// positions, adding every pasted component to the selection.
    pub fn paste(&mut self) -> Vec<ComponentId> {
        if !self.history.has_clipboard() {
            return Vec::new();
        }
        self.snapshot();
        let batch = lifecycle::paste_batch(
            self.history.clipboard(),
            self.config.paste_offset,
            &mut self.ids,
        );
        let mut pasted = Vec::with_capacity(batch.len());
        for component in batch {
            let id = self.insert_component(component);
            self.selection.insert(id);
            pasted.push(id);
        }
        log::debug!("pasted {} component(s)", pasted.len());
        self.notify_selection();
        pasted
    }

    /// Copy then paste.
    pub fn duplicate_selected(&mut self) -> Vec<ComponentId> {
        if self.copy_selected() == 0 {
            return Vec::new();
        }
        self.paste()
    }

    /// Programmatic move. Connection geometry follows.
    pub fn move_component(&mut self, id: ComponentId, x: f64, y: f64) -> bool {
        if !self.diagram.contains(id) {
            log::debug!("move: component {id} not found");
            return false;
        }
        self.snapshot();
        self.place(id, Point::new(x, y));
        true
    }

    fn place(&mut self, id: ComponentId, at: Point) {
        if let Some(component) = self.diagram.component_mut(id) {
            component.x = at.x;
            component.y = at.y;
        }
        self.refresh_component(id);
    }

    // ─── Ports ───────────────────────────────────────────────────────────

    pub fn add_port(&mut self, component: ComponentId, direction: Direction) -> Option<PortId> {
        if !self.diagram.contains(component) {
            log::debug!("add port: component {component} not found");
            return None;
        }
        self.snapshot();
        let owner = self.diagram.component_mut(component)?;
        let port = owner.add_port(direction, &mut self.ids).id;
        self.refresh_component(component);
        Some(port)
    }

    /// Remove a port and its connections. Refused (returning `false`) when
    /// the port does not exist or is the last one on its side.
    pub fn remove_port(&mut self, component: ComponentId, port: PortId, direction: Direction) -> bool {
        let check = self
            .diagram
            .component(component)
            .ok_or(DiagramError::ComponentNotFound(component))
            .and_then(|c| c.check_remove_port(port, direction));
        if let Err(err) = check {
            log::warn!("remove port refused: {err}");
            return false;
        }

        self.snapshot();
        match self.diagram.remove_port(component, port, direction) {
            Ok((_, dropped)) => {
                for edge in &dropped {
                    self.renderer.delete_connection_visual(edge);
                }
                self.refresh_component(component);
                true
            }
            Err(err) => {
                log::warn!("remove port failed after check: {err}");
                false
            }
        }
    }

    fn port_exists(&self, component: ComponentId, port: PortId) -> bool {
        self.diagram
            .resolve(PortRef::new(component, port))
            .is_some()
    }

    pub fn rename_port(&mut self, component: ComponentId, port: PortId, name: &str) -> bool {
        let Some(name) = lifecycle::normalize_name(name) else {
            return false;
        };
        if !self.port_exists(component, port) {
            log::debug!("rename port: {component}-{port} not found");
            return false;
        }
        self.snapshot();
        let renamed = self
            .diagram
            .component_mut(component)
            .is_some_and(|c| c.rename_port(port, &name).is_ok());
        self.refresh_component(component);
        renamed
    }

    pub fn set_port_type(&mut self, component: ComponentId, port: PortId, port_type: &str) -> bool {
        let Some(port_type) = lifecycle::normalize_name(port_type) else {
            return false;
        };
        if !self.port_exists(component, port) {
            log::debug!("set port type: {component}-{port} not found");
            return false;
        }
        self.snapshot();
        let changed = self
            .diagram
            .component_mut(component)
            .is_some_and(|c| c.set_port_type(port, &port_type).is_ok());
        self.refresh_component(component);
        changed
    }

    // ─── Rename ──────────────────────────────────────────────────────────

    /// Enter name editing on `id`. Any other gesture is settled first.
    pub fn begin_rename(&mut self, id: ComponentId) -> bool {
        let Some(component) = self.diagram.component(id) else {
            return false;
        };
        let original = component.name.clone();
        self.settle_interaction();
        self.interaction = Interaction::EditingName(RenameSession {
            component: id,
            text: original.clone(),
            original,
        });
        true
    }

    pub fn set_rename_text(&mut self, text: &str) {
        if let Interaction::EditingName(session) = &mut self.interaction {
            session.text = text.to_string();
        }
    }

    /// Commit the rename (blur or Enter). Empty input reverts and returns
    /// `false`.
    pub fn commit_rename(&mut self) -> bool {
        let session = match std::mem::take(&mut self.interaction) {
            Interaction::EditingName(session) => session,
            other => {
                self.interaction = other;
                return false;
            }
        };
        let Some(name) = lifecycle::normalize_name(&session.text) else {
            log::debug!("rename of {} reverted: empty name", session.component);
            self.refresh_component(session.component);
            return false;
        };
        if !self.diagram.contains(session.component) {
            return false;
        }
        self.snapshot();
        if let Some(component) = self.diagram.component_mut(session.component) {
            component.name = name;
            component.recompute_size();
        }
        self.refresh_component(session.component);
        true
    }

    /// Abandon the rename, keeping the original name.
    pub fn cancel_rename(&mut self) -> bool {
        let session = match std::mem::take(&mut self.interaction) {
            Interaction::EditingName(session) => session,
            other => {
                self.interaction = other;
                return false;
            }
        };
        self.refresh_component(session.component);
        true
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// First phase: mark an output port as the pending source.
    pub fn start_connection(&mut self, source: PortRef) -> Result<(), DiagramError> {
        if let Err(err) = self.draft.start(&self.diagram, source) {
            log::warn!("cannot start connection from {source}: {err}");
            return Err(err);
        }
        self.interaction = Interaction::ConnectingEdge(source);
        Ok(())
    }

    /// Second phase: finish on an input port and commit the edge. The
    /// pending marker is cleared whatever the outcome.
    pub fn finish_connection(&mut self, target: PortRef) -> Result<ConnectOutcome, DiagramError> {
        let candidate = self.draft.finish(&self.diagram, target);
        if matches!(self.interaction, Interaction::ConnectingEdge(_)) {
            self.interaction = Interaction::Idle;
        }
        match candidate {
            Ok(connection) => self.connect(connection.from, connection.to),
            Err(err) => {
                log::warn!("connection to {target} refused: {err}");
                Err(err)
            }
        }
    }

    pub fn cancel_connection(&mut self) -> bool {
        if matches!(self.interaction, Interaction::ConnectingEdge(_)) {
            self.interaction = Interaction::Idle;
        }
        self.draft.cancel()
    }

    /// Validate and commit an edge directly.
    pub fn connect(&mut self, from: PortRef, to: PortRef) -> Result<ConnectOutcome, DiagramError> {
        let warning = match self.diagram.validate_connection(from, to) {
            Ok(warning) => warning,
            Err(err) => {
                log::warn!("connection {from} -> {to} refused: {err}");
                return Err(err);
            }
        };

        self.snapshot();
        let connection = Connection::new(from, to);
        self.diagram.connections.push(connection);
        if let Some(path) = connection_path(&self.diagram, &connection) {
            self.renderer.render_connection(&path);
        }
        log::debug!("connected {from} -> {to}");

        if let Some(warning) = &warning {
            log::warn!("connection {from} -> {to}: {warning}");
            self.events.push(EditorEvent::ConnectionWarning {
                connection,
                warning: warning.clone(),
            });
        }
        Ok(ConnectOutcome {
            connection,
            warning,
        })
    }

    pub fn delete_connection(&mut self, from: PortRef, to: PortRef) -> bool {
        if !self.diagram.contains_connection(from, to) {
            log::debug!("delete connection: {from} -> {to} not found");
            return false;
        }
        self.snapshot();
        self.diagram.remove_connection(from, to);
        self.renderer
            .delete_connection_visual(&Connection::new(from, to));
        true
    }

    pub fn connection_path(&self, connection: &Connection) -> Option<ConnectionPath> {
        connection_path(&self.diagram, connection)
    }

    pub fn connection_paths(&self) -> Vec<ConnectionPath> {
        self.diagram
            .connections
            .iter()
            .filter_map(|c| connection_path(&self.diagram, c))
            .collect()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Click selection: replace, or toggle with the additive modifier.
    pub fn select(&mut self, id: ComponentId, additive: bool) -> bool {
        if !self.diagram.contains(id) {
            return false;
        }
        if additive {
            self.selection.toggle(id);
        } else {
            self.selection.replace(id);
        }
        self.notify_selection();
        true
    }

    pub fn select_all(&mut self) -> usize {
        self.selection.clear();
        for id in self.diagram.component_ids() {
            self.selection.insert(id);
        }
        self.notify_selection();
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.selection.clear();
        self.notify_selection();
    }

    /// Select everything whose bounds intersect `rect`.
    pub fn box_select(&mut self, rect: Rect, additive: bool) -> Vec<ComponentId> {
        let hits = self.diagram.components_intersecting(rect);
        self.selection.apply_box(hits.iter().copied(), additive);
        self.notify_selection();
        hits
    }

    // ─── Input dispatch ──────────────────────────────────────────────────

    /// Interpret one input event against the current state. Key events
    /// return the shortcut action that ran, if any.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<ShortcutAction> {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                hit,
                modifiers,
            } => {
                self.pointer_down(Point::new(x, y), hit, modifiers);
                None
            }
            InputEvent::PointerMove { x, y, .. } => {
                self.pointer_move(Point::new(x, y));
                None
            }
            InputEvent::PointerUp {
                x,
                y,
                hit,
                modifiers,
            } => {
                self.pointer_up(Point::new(x, y), hit, modifiers);
                None
            }
            InputEvent::DoubleClick { hit } => {
                if let Hit::Component(id) = hit {
                    self.begin_rename(id);
                }
                None
            }
            InputEvent::Key {
                key,
                modifiers,
                in_text_field,
            } => self.handle_key(&key, modifiers, in_text_field),
        }
    }

    fn pointer_down(&mut self, at: Point, hit: Hit, modifiers: Modifiers) {
        if let Interaction::EditingName(session) = &self.interaction {
            // Clicks inside the component being renamed belong to the
            // text field.
            if hit == Hit::Component(session.component) {
                return;
            }
            self.commit_rename();
        }
        // A press without a matching release must not leave its gesture open.
        self.settle_interaction();

        match hit {
            Hit::Port(port) => {
                if let Some((_, _, Direction::Output)) = self.diagram.resolve(port) {
                    let _ = self.start_connection(port);
                }
            }
            Hit::Component(id) => {
                if !self.diagram.contains(id) {
                    return;
                }
                if modifiers.additive() {
                    let now_selected = self.selection.toggle(id);
                    self.notify_selection();
                    if !now_selected {
                        return;
                    }
                } else if !self.selection.contains(id) {
                    self.selection.replace(id);
                    self.notify_selection();
                }
                self.history.begin_batch(&self.diagram);
                self.interaction =
                    Interaction::Dragging(DragGesture::capture(&self.diagram, &self.selection, at));
            }
            Hit::Empty => {
                self.interaction = Interaction::BoxSelecting(BoxGesture::new(at));
            }
        }
    }

    fn pointer_move(&mut self, at: Point) {
        let targets = match &mut self.interaction {
            Interaction::Dragging(drag) => {
                drag.moved = true;
                drag.targets(at)
            }
            Interaction::BoxSelecting(gesture) => {
                gesture.current = at;
                return;
            }
            _ => return,
        };
        for (id, position) in targets {
            self.place(id, position);
        }
    }

    fn pointer_up(&mut self, at: Point, hit: Hit, modifiers: Modifiers) {
        match std::mem::take(&mut self.interaction) {
            Interaction::Dragging(_) => self.end_drag(),
            Interaction::BoxSelecting(mut gesture) => {
                gesture.current = at;
                self.box_select(gesture.rect(), modifiers.additive());
            }
            Interaction::ConnectingEdge(_) => match hit {
                Hit::Port(target) => {
                    let _ = self.finish_connection(target);
                }
                _ => {
                    self.draft.cancel();
                }
            },
            other => self.interaction = other,
        }
    }

    /// Close the drag batch; one snapshot if anything moved.
    fn end_drag(&mut self) {
        if self.history.end_batch(&self.diagram) {
            self.notify_history();
        }
    }

    /// Bring the state machine back to `Idle`. Drags keep the delta reached
    /// so far; pending connections and renames are dropped.
    fn settle_interaction(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::Dragging(_) => self.end_drag(),
            Interaction::ConnectingEdge(_) => {
                self.draft.cancel();
            }
            Interaction::EditingName(session) => self.refresh_component(session.component),
            Interaction::BoxSelecting(_) | Interaction::Idle => {}
        }
    }

    /// Resolve and run a keyboard shortcut.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers, in_text_field: bool) -> Option<ShortcutAction> {
        if matches!(self.interaction, Interaction::EditingName(_)) && key == "Enter" {
            self.commit_rename();
            return None;
        }
        let action = ShortcutMap::resolve(key, modifiers, in_text_field)?;
        // Clipboard and select-all belong to the focused text field.
        if in_text_field
            && matches!(
                action,
                ShortcutAction::Copy
                    | ShortcutAction::Cut
                    | ShortcutAction::Paste
                    | ShortcutAction::SelectAll
            )
        {
            return None;
        }
        self.perform(action);
        Some(action)
    }

    /// Run a shortcut action. Returns whether anything changed.
    pub fn perform(&mut self, action: ShortcutAction) -> bool {
        log::trace!("shortcut {action:?}");
        match action {
            ShortcutAction::Copy => self.copy_selected() > 0,
            ShortcutAction::Paste => !self.paste().is_empty(),
            ShortcutAction::Cut => self.cut_selected() > 0,
            ShortcutAction::Delete => self.delete_selected() > 0,
            ShortcutAction::Duplicate => !self.duplicate_selected().is_empty(),
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::SelectAll => self.select_all() > 0,
            ShortcutAction::Save => {
                self.events.push(EditorEvent::SaveRequested);
                true
            }
            ShortcutAction::Escape => {
                self.escape();
                true
            }
        }
    }

    /// Clear the selection and cancel any pending connection or rename.
    pub fn escape(&mut self) {
        self.settle_interaction();
        self.draft.cancel();
        self.clear_selection();
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.settle_interaction();
        let Some(previous) = self.history.undo(&self.diagram) else {
            return false;
        };
        self.replace_diagram(previous);
        self.notify_history();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.settle_interaction();
        let Some(next) = self.history.redo(&self.diagram) else {
            return false;
        };
        self.replace_diagram(next);
        self.notify_history();
        true
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    /// Layer the graph and reposition every component, as one undo step.
    pub fn auto_layout(&mut self) -> AutoLayout {
        if self.diagram.components.is_empty() {
            return AutoLayout::default();
        }
        self.settle_interaction();
        let layout = compute_layout(&self.diagram, &self.config.layout);
        self.snapshot();
        apply_layout(&mut self.diagram, &layout);
        for component in &self.diagram.components {
            self.renderer.rerender_component(component);
        }
        for connection in &self.diagram.connections {
            if let Some(path) = connection_path(&self.diagram, connection) {
                self.renderer.render_connection(&path);
            }
        }
        log::debug!("auto-layout placed {} components", layout.placements.len());
        layout
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn export_document(&self) -> DiagramDocument {
        DiagramDocument::from_diagram(&self.diagram)
    }

    pub fn save_json(&self) -> Result<String, DiagramError> {
        self.history.serialize(&self.diagram)
    }

    /// Import a JSON document. A rejected document leaves the diagram,
    /// selection and history exactly as they were.
    pub fn load_json(&mut self, text: &str) -> Result<(), DiagramError> {
        let diagram = self.history.deserialize(text).inspect_err(|err| {
            log::warn!("import rejected: {err}");
        })?;
        self.load_diagram(diagram);
        Ok(())
    }

    pub fn load_value(&mut self, value: Value) -> Result<(), DiagramError> {
        let diagram = DiagramDocument::from_value(value)
            .and_then(DiagramDocument::into_diagram)
            .inspect_err(|err| log::warn!("import rejected: {err}"))?;
        self.load_diagram(diagram);
        Ok(())
    }

    /// Replace the canonical diagram wholesale as one undo step.
    pub fn load_diagram(&mut self, diagram: Diagram) {
        self.settle_interaction();
        self.snapshot();
        self.replace_diagram(diagram);
        self.clear_selection();
        log::info!(
            "loaded diagram: {} components, {} connections",
            self.diagram.components.len(),
            self.diagram.connections.len()
        );
        self.events.push(EditorEvent::DocumentLoaded {
            components: self.diagram.components.len(),
            connections: self.diagram.connections.len(),
        });
    }

    pub async fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), DiagramError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        self.load_json(&text)
    }

    pub async fn save_file(&self, path: impl AsRef<Path>) -> Result<(), DiagramError> {
        let text = self.save_json()?;
        tokio::fs::write(path.as_ref(), text).await?;
        Ok(())
    }

    // ─── Presets & collaborator ──────────────────────────────────────────

    /// Replace the diagram with a preset: one component per node, edges
    /// wired first output to first input, then auto-layout. The whole load
    /// is a single undo step.
    pub fn load_preset(&mut self, preset: &Preset) -> Vec<ComponentId> {
        let mut diagram = Diagram::new();
        let mut by_name: HashMap<String, ComponentId> = HashMap::new();
        for node in preset.resolved_nodes() {
            if by_name.contains_key(&node.name) {
                continue;
            }
            let component = lifecycle::spawn_named(node.kind, 0.0, 0.0, &node.name, &mut self.ids);
            by_name.insert(node.name.clone(), component.id);
            diagram.components.push(component);
        }

        for (from_name, to_name) in &preset.edges {
            let (Some(&from_id), Some(&to_id)) = (by_name.get(from_name), by_name.get(to_name)) else {
                continue;
            };
            let from = diagram
                .component(from_id)
                .and_then(|c| c.first_port(Direction::Output))
                .map(|p| PortRef::new(from_id, p.id));
            let to = diagram
                .component(to_id)
                .and_then(|c| c.first_port(Direction::Input))
                .map(|p| PortRef::new(to_id, p.id));
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };
            if diagram.contains_connection(from, to) {
                continue;
            }
            diagram.connections.push(Connection::new(from, to));
        }

        let layout = compute_layout(&diagram, &self.config.layout);
        apply_layout(&mut diagram, &layout);
        let created = diagram.component_ids();
        log::info!("preset `{}`: {} components", preset.name, created.len());
        self.load_diagram(diagram);
        created
    }

    pub fn load_builtin_preset(&mut self, name: &str) -> Result<Vec<ComponentId>, DiagramError> {
        let preset = Preset::builtin(name)?;
        Ok(self.load_preset(&preset))
    }

    /// Send `message` and the current document to `collaborator`. A
    /// returned diagram is imported through the same path as a file load.
    pub async fn ask_collaborator<C: DiagramCollaborator>(
        &mut self,
        collaborator: &C,
        message: &str,
    ) -> Result<CollaboratorReply, DiagramError> {
        let document = self.export_document();
        let reply = collaborator.respond(message, &document).await?;
        if let Some(value) = reply.diagram.clone() {
            self.load_value(value)?;
        }
        Ok(reply)
    }
}

fn apply_layout(diagram: &mut Diagram, layout: &AutoLayout) {
    for placement in &layout.placements {
        if let Some(component) = diagram.component_mut(placement.id) {
            component.x = placement.x;
            component.y = placement.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RecordingRenderer, RenderCall};
    use pretty_assertions::assert_eq;

    fn out1(editor: &Editor<impl RenderSink>, id: ComponentId) -> PortRef {
        PortRef::new(id, editor.component(id).unwrap().outputs[0].id)
    }

    fn in1(editor: &Editor<impl RenderSink>, id: ComponentId) -> PortRef {
        PortRef::new(id, editor.component(id).unwrap().inputs[0].id)
    }

    #[test]
    fn create_renders_and_snapshots() {
        let mut editor = Editor::with_renderer(RecordingRenderer::default());
        let id = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        assert_eq!(editor.renderer().calls, vec![RenderCall::Render(id)]);
        assert!(editor.can_undo());
        assert_eq!(editor.history().undo_depth(), 1);
    }

    #[test]
    fn refused_remove_port_leaves_history_alone() {
        let mut editor = Editor::new();
        let id = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        let only = editor.component(id).unwrap().inputs[0].id;
        let depth = editor.history().undo_depth();

        assert!(!editor.remove_port(id, only, Direction::Input));
        assert_eq!(editor.history().undo_depth(), depth);
        assert_eq!(editor.component(id).unwrap().inputs.len(), 1);
    }

    #[test]
    fn remove_port_drops_its_connections() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        let b = editor.create_component(ComponentKind::Function, 300.0, 0.0);
        let extra = editor.add_port(b, Direction::Input).unwrap();
        editor
            .connect(out1(&editor, a), PortRef::new(b, extra))
            .unwrap();
        assert_eq!(editor.diagram().connections.len(), 1);

        assert!(editor.remove_port(b, extra, Direction::Input));
        assert!(editor.diagram().connections.is_empty());
        assert_eq!(editor.component(b).unwrap().inputs.len(), 1);
    }

    #[test]
    fn type_mismatch_connects_with_warning() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Class, 0.0, 0.0);
        let b = editor.create_component(ComponentKind::Function, 300.0, 0.0);
        let target = in1(&editor, b);
        assert!(editor.set_port_type(b, target.port, "string"));
        editor.drain_events();

        let outcome = editor.connect(out1(&editor, a), target).unwrap();
        assert!(outcome.warning.is_some());
        assert_eq!(editor.diagram().connections.len(), 1);
        assert!(
            editor
                .drain_events()
                .iter()
                .any(|e| matches!(e, EditorEvent::ConnectionWarning { .. }))
        );
    }

    #[test]
    fn rename_commit_and_revert() {
        let mut editor = Editor::new();
        let id = editor.create_component(ComponentKind::Module, 0.0, 0.0);

        assert!(editor.begin_rename(id));
        editor.set_rename_text("   ");
        assert!(!editor.commit_rename());
        assert_eq!(editor.component(id).unwrap().name, "New module");

        editor.begin_rename(id);
        editor.set_rename_text("  A very long component name indeed  ");
        assert!(editor.commit_rename());
        let c = editor.component(id).unwrap();
        assert_eq!(c.name, "A very long component name indeed");
        assert!(c.width > bp_core::model::MIN_WIDTH);
        assert!(editor.interaction().is_idle());

        editor.begin_rename(id);
        editor.set_rename_text("discarded");
        assert!(editor.cancel_rename());
        assert_eq!(
            editor.component(id).unwrap().name,
            "A very long component name indeed"
        );
    }

    #[test]
    fn escape_cancels_pending_connection_and_clears_selection() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        editor.select(a, false);
        editor.start_connection(out1(&editor, a)).unwrap();
        assert!(editor.pending_connection().is_some());

        editor.perform(ShortcutAction::Escape);
        assert!(editor.pending_connection().is_none());
        assert!(editor.selection().is_empty());
        assert!(editor.interaction().is_idle());
    }

    #[test]
    fn drag_is_one_undo_step() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        let b = editor.create_component(ComponentKind::Function, 300.0, 0.0);
        editor.select(a, false);
        editor.select(b, true);
        let depth = editor.history().undo_depth();

        editor.handle_event(InputEvent::PointerDown {
            x: 10.0,
            y: 10.0,
            hit: Hit::Component(a),
            modifiers: Modifiers::NONE,
        });
        for step in 1..=5 {
            editor.handle_event(InputEvent::PointerMove {
                x: 10.0 + step as f64 * 10.0,
                y: 10.0,
                modifiers: Modifiers::NONE,
            });
        }
        editor.handle_event(InputEvent::PointerUp {
            x: 60.0,
            y: 10.0,
            hit: Hit::Component(a),
            modifiers: Modifiers::NONE,
        });

        assert_eq!(editor.component(a).unwrap().x, 50.0);
        assert_eq!(editor.component(b).unwrap().x, 350.0);
        assert_eq!(editor.history().undo_depth(), depth + 1);

        assert!(editor.undo());
        assert_eq!(editor.component(a).unwrap().x, 0.0);
        assert_eq!(editor.component(b).unwrap().x, 300.0);
    }

    #[test]
    fn click_without_move_takes_no_snapshot() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        let depth = editor.history().undo_depth();
        let down = InputEvent::PointerDown {
            x: 5.0,
            y: 5.0,
            hit: Hit::Component(a),
            modifiers: Modifiers::NONE,
        };
        editor.handle_event(down);
        editor.handle_event(InputEvent::PointerUp {
            x: 5.0,
            y: 5.0,
            hit: Hit::Component(a),
            modifiers: Modifiers::NONE,
        });
        assert_eq!(editor.history().undo_depth(), depth);
        assert_eq!(editor.selection().to_vec(), vec![a]);
    }

    fn press(editor: &mut Editor, x: f64, y: f64, hit: Hit) {
        editor.handle_event(InputEvent::PointerDown {
            x,
            y,
            hit,
            modifiers: Modifiers::NONE,
        });
    }

    #[test]
    fn press_without_release_then_press_keeps_history_recording() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        press(&mut editor, 5.0, 5.0, Hit::Component(a));
        // The release for the first press never arrives.
        press(&mut editor, 900.0, 900.0, Hit::Empty);
        editor.handle_event(InputEvent::PointerUp {
            x: 900.0,
            y: 900.0,
            hit: Hit::Empty,
            modifiers: Modifiers::NONE,
        });
        assert!(!editor.history().is_batching());

        let depth = editor.history().undo_depth();
        editor.create_component(ComponentKind::Class, 300.0, 0.0);
        editor.create_component(ComponentKind::Module, 600.0, 0.0);
        assert_eq!(editor.history().undo_depth(), depth + 2);
        assert!(editor.undo());
        assert_eq!(editor.diagram().components.len(), 2);
    }

    #[test]
    fn press_on_component_drops_pending_connection() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        let b = editor.create_component(ComponentKind::Function, 300.0, 0.0);
        let port = out1(&editor, a);
        press(&mut editor, 200.0, 55.0, Hit::Port(port));
        assert!(editor.pending_connection().is_some());

        press(&mut editor, 305.0, 5.0, Hit::Component(b));
        assert_eq!(editor.pending_connection(), None);
        assert_eq!(editor.interaction().name(), "dragging");
    }

    #[test]
    fn delete_during_drag_is_its_own_undo_step() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        editor.select(a, false);

        press(&mut editor, 10.0, 10.0, Hit::Component(a));
        editor.handle_event(InputEvent::PointerMove {
            x: 60.0,
            y: 10.0,
            modifiers: Modifiers::NONE,
        });
        editor.handle_key("Delete", Modifiers::NONE, false);
        editor.handle_event(InputEvent::PointerUp {
            x: 60.0,
            y: 10.0,
            hit: Hit::Empty,
            modifiers: Modifiers::NONE,
        });
        assert!(editor.component(a).is_none());
        assert!(!editor.history().is_batching());

        assert!(editor.undo());
        assert_eq!(editor.component(a).unwrap().x, 50.0);
        assert!(editor.undo());
        assert_eq!(editor.component(a).unwrap().x, 0.0);
    }

    #[test]
    fn rename_calls_outside_a_rename_keep_the_gesture() {
        let mut editor = Editor::new();
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        editor.start_connection(out1(&editor, a)).unwrap();

        assert!(!editor.commit_rename());
        assert!(!editor.cancel_rename());
        assert_eq!(editor.interaction().name(), "connecting");
        assert!(editor.pending_connection().is_some());
    }

    #[test]
    fn save_shortcut_emits_event() {
        let mut editor = Editor::new();
        let action = editor.handle_key("s", Modifiers::CMD, false);
        assert_eq!(action, Some(ShortcutAction::Save));
        assert_eq!(editor.drain_events(), vec![EditorEvent::SaveRequested]);
    }

    #[test]
    fn undo_rerenders_from_scratch() {
        let mut editor = Editor::with_renderer(RecordingRenderer::default());
        let a = editor.create_component(ComponentKind::Function, 0.0, 0.0);
        let b = editor.create_component(ComponentKind::Function, 300.0, 0.0);
        editor.renderer_mut().take();

        assert!(editor.undo());
        assert_eq!(
            editor.renderer_mut().take(),
            vec![
                RenderCall::DeleteComponent(a),
                RenderCall::DeleteComponent(b),
                RenderCall::Render(a),
            ]
        );
    }
}
