//! Chat collaborator contract.
//!
//! A collaborator receives a message and the current document, and may
//! answer with a full replacement diagram. The editor imports that through
//! the same validated path as a file load.

use bp_core::{DiagramDocument, DiagramError};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollaboratorReply {
    #[serde(default)]
    pub message: String,
    /// Replacement `{components, connections}` document, if any.
    #[serde(default)]
    pub diagram: Option<Value>,
}

impl CollaboratorReply {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagram: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, DiagramError> {
        Ok(serde_json::from_str(text)?)
    }
}

pub trait DiagramCollaborator {
    fn respond(
        &self,
        message: &str,
        diagram: &DiagramDocument,
    ) -> impl Future<Output = Result<CollaboratorReply, DiagramError>>;
}
