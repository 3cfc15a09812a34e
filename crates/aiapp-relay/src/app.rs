//! Application directory types
//!
//! Every relayed request targets one registered Dify application. The kind
//! decides which upstream endpoint is called and which streaming event shape
//! the answer arrives in.

use serde::{Deserialize, Serialize};

/// Dify application kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppKind {
    Chat,
    Completion,
    Workflow,
}

impl AppKind {
    /// Upstream path for message/run requests of this kind.
    pub fn endpoint(&self) -> &'static str {
        match self {
            AppKind::Chat => "/chat-messages",
            AppKind::Completion => "/completion-messages",
            AppKind::Workflow => "/workflows/run",
        }
    }

    /// Workflow apps stream `text_chunk`/`workflow_finished` events instead
    /// of `message`/`message_end`.
    pub fn is_workflow(&self) -> bool {
        matches!(self, AppKind::Workflow)
    }
}

/// One registered application: the resolution target for an `appId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppProfile {
    pub id: String,
    pub name: String,
    pub kind: AppKind,
    pub api_key: String,
    #[serde(default)]
    pub description: String,
}
