//! Render contract.
//!
//! The editor calls into a [`RenderSink`] after every committed mutation.
//! Pixel and DOM specifics belong to the sink; the editor only says which
//! entity changed.

use bp_core::geometry::ConnectionPath;
use bp_core::id::ComponentId;
use bp_core::model::{Component, Connection};

pub trait RenderSink {
    fn render_component(&mut self, component: &Component);
    fn rerender_component(&mut self, component: &Component);
    fn render_connection(&mut self, path: &ConnectionPath);
    fn delete_component_visual(&mut self, id: ComponentId);
    fn delete_connection_visual(&mut self, connection: &Connection);
}

/// Discards every call. Used by headless tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn render_component(&mut self, _: &Component) {}
    fn rerender_component(&mut self, _: &Component) {}
    fn render_connection(&mut self, _: &ConnectionPath) {}
    fn delete_component_visual(&mut self, _: ComponentId) {}
    fn delete_connection_visual(&mut self, _: &Connection) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Render(ComponentId),
    Rerender(ComponentId),
    Connection(Connection),
    DeleteComponent(ComponentId),
    DeleteConnection(Connection),
}

/// Records calls in order, for tests and debugging hosts.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
}

impl RecordingRenderer {
    pub fn take(&mut self) -> Vec<RenderCall> {
        std::mem::take(&mut self.calls)
    }
}

impl RenderSink for RecordingRenderer {
    fn render_component(&mut self, component: &Component) {
        self.calls.push(RenderCall::Render(component.id));
    }

    fn rerender_component(&mut self, component: &Component) {
        self.calls.push(RenderCall::Rerender(component.id));
    }

    fn render_connection(&mut self, path: &ConnectionPath) {
        self.calls.push(RenderCall::Connection(path.connection));
    }

    fn delete_component_visual(&mut self, id: ComponentId) {
        self.calls.push(RenderCall::DeleteComponent(id));
    }

    fn delete_connection_visual(&mut self, connection: &Connection) {
        self.calls.push(RenderCall::DeleteConnection(*connection));
    }
}
