pub mod collab;
pub mod config;
pub mod connect;
pub mod editor;
pub mod history;
pub mod input;
pub mod interaction;
pub mod lifecycle;
pub mod render;
pub mod shortcuts;

pub use config::EditorConfig;
pub use editor::{ConnectOutcome, Editor, EditorEvent};
pub use render::{NullRenderer, RecordingRenderer, RenderCall, RenderSink};
