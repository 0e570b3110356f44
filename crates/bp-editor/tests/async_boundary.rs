//! File load/save and collaborator round trips.

use bp_core::model::ComponentKind;
use bp_core::{DiagramDocument, DiagramError, ErrorKind};
use bp_editor::Editor;
use bp_editor::collab::{CollaboratorReply, DiagramCollaborator};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bp-editor-{}-{name}.json", std::process::id()))
}

/// Answers with a fixed reply and records what it was asked.
struct Scripted {
    reply: CollaboratorReply,
    seen: std::sync::Mutex<Vec<(String, usize)>>,
}

impl Scripted {
    fn new(reply: CollaboratorReply) -> Self {
        Self {
            reply,
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl DiagramCollaborator for Scripted {
    async fn respond(
        &self,
        message: &str,
        diagram: &DiagramDocument,
    ) -> Result<CollaboratorReply, DiagramError> {
        self.seen
            .lock()
            .unwrap()
            .push((message.to_string(), diagram.components.len()));
        Ok(self.reply.clone())
    }
}

struct Offline;

impl DiagramCollaborator for Offline {
    async fn respond(&self, _: &str, _: &DiagramDocument) -> Result<CollaboratorReply, DiagramError> {
        Err(DiagramError::Collaborator("offline".into()))
    }
}

#[tokio::test]
async fn save_then_load_file() {
    let path = scratch_path("roundtrip");
    let mut editor = Editor::new();
    editor.create_component(ComponentKind::Class, 10.0, 20.0);
    editor.create_component(ComponentKind::Module, 300.0, 20.0);
    editor.save_file(&path).await.unwrap();

    let mut other = Editor::new();
    other.load_file(&path).await.unwrap();
    assert_eq!(other.diagram(), editor.diagram());
    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let mut editor = Editor::new();
    let err = editor
        .load_file(scratch_path("does-not-exist"))
        .await
        .unwrap_err();
    assert!(matches!(err, DiagramError::Io(_)));
    assert!(editor.diagram().is_empty());
}

#[tokio::test]
async fn malformed_file_leaves_state_untouched() {
    let path = scratch_path("malformed");
    tokio::fs::write(&path, r#"{"connections": []}"#).await.unwrap();

    let mut editor = Editor::new();
    editor.create_component(ComponentKind::Function, 0.0, 0.0);
    let before = editor.diagram().clone();

    let err = editor.load_file(&path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(editor.diagram(), &before);
    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn collaborator_diagram_replaces_graph() {
    let replacement = serde_json::json!({
        "components": [
            {"id": 7, "x": 0, "y": 0, "name": "Gateway", "type": "module",
             "inputs": [{"id": 70, "name": "import"}],
             "outputs": [{"id": 71, "name": "export"}]}
        ],
        "connections": []
    });
    let collaborator = Scripted::new(CollaboratorReply {
        message: "replaced".into(),
        diagram: Some(replacement),
    });

    let mut editor = Editor::new();
    editor.create_component(ComponentKind::Function, 0.0, 0.0);
    let reply = editor
        .ask_collaborator(&collaborator, "make it a gateway")
        .await
        .unwrap();

    assert_eq!(reply.message, "replaced");
    assert_eq!(
        collaborator.seen.lock().unwrap().as_slice(),
        &[("make it a gateway".to_string(), 1)]
    );
    assert_eq!(editor.diagram().components.len(), 1);
    assert_eq!(editor.diagram().components[0].name, "Gateway");

    // The replacement is undoable like any load.
    assert!(editor.undo());
    assert_eq!(editor.diagram().components[0].name, "New function");
}

#[tokio::test]
async fn text_only_reply_keeps_graph() {
    let collaborator = Scripted::new(CollaboratorReply::text("looks fine"));
    let mut editor = Editor::new();
    editor.create_component(ComponentKind::Function, 0.0, 0.0);
    let before = editor.diagram().clone();

    editor.ask_collaborator(&collaborator, "review").await.unwrap();
    assert_eq!(editor.diagram(), &before);
}

#[tokio::test]
async fn collaborator_failure_changes_nothing() {
    let mut editor = Editor::new();
    editor.create_component(ComponentKind::Function, 0.0, 0.0);
    let depth = editor.history().undo_depth();

    let err = editor.ask_collaborator(&Offline, "hello").await.unwrap_err();
    assert!(matches!(err, DiagramError::Collaborator(_)));
    assert_eq!(editor.history().undo_depth(), depth);
}
