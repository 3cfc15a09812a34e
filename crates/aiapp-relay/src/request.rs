//! Typed request payloads and upstream wire-body shaping

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upstream response delivery mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Streaming,
    Blocking,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Streaming => "streaming",
            ResponseMode::Blocking => "blocking",
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, ResponseMode::Blocking)
    }
}

/// Chat and completion message request.
///
/// Unknown fields are carried through to the upstream body untouched, so
/// callers can use upstream features this crate does not model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<ResponseMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generate_name: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Mode requested by the caller, defaulting to streaming.
    pub fn mode(&self) -> ResponseMode {
        self.response_mode.unwrap_or_default()
    }

    /// Build the upstream body with `response_mode` forced to `mode`.
    ///
    /// A blank `conversation_id` is dropped entirely, and
    /// `auto_generate_name` is only forwarded for new conversations.
    pub fn wire_body(&self, mode: ResponseMode) -> Value {
        let mut body = Map::new();
        for (key, value) in &self.extra {
            body.insert(key.clone(), value.clone());
        }

        body.insert("query".into(), self.query.clone().into());
        body.insert("inputs".into(), Value::Object(self.inputs.clone()));
        body.insert("response_mode".into(), mode.as_str().into());
        if let Some(user) = &self.user {
            body.insert("user".into(), user.clone().into());
        }

        let conversation = self
            .conversation_id
            .as_deref()
            .map(str::trim)
            .unwrap_or("");
        if !conversation.is_empty() {
            body.insert("conversation_id".into(), conversation.into());
        } else if let Some(auto) = self.auto_generate_name {
            body.insert("auto_generate_name".into(), auto.into());
        }

        if !self.files.is_empty() {
            body.insert("files".into(), Value::Array(self.files.clone()));
        }

        Value::Object(body)
    }
}

/// Workflow run request: named inputs instead of a free-form query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRunRequest {
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<ResponseMode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowRunRequest {
    pub fn wire_body(&self, mode: ResponseMode) -> Value {
        let mut body = Map::new();
        for (key, value) in &self.extra {
            body.insert(key.clone(), value.clone());
        }

        body.insert("inputs".into(), Value::Object(self.inputs.clone()));
        body.insert("response_mode".into(), mode.as_str().into());
        if let Some(user) = &self.user {
            body.insert("user".into(), user.clone().into());
        }

        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_mode_is_forced() {
        let mut request = ChatRequest::new("hi");
        request.response_mode = Some(ResponseMode::Blocking);

        let body = request.wire_body(ResponseMode::Streaming);
        assert_eq!(body["response_mode"], "streaming");
    }

    #[test]
    fn blank_conversation_is_dropped_and_auto_name_kept() {
        let mut request = ChatRequest::new("hi");
        request.conversation_id = Some("  ".into());
        request.auto_generate_name = Some(true);

        let body = request.wire_body(ResponseMode::Streaming);
        assert!(body.get("conversation_id").is_none());
        assert_eq!(body["auto_generate_name"], true);
    }

    #[test]
    fn existing_conversation_suppresses_auto_name() {
        let mut request = ChatRequest::new("hi").with_conversation("conv-1");
        request.auto_generate_name = Some(true);

        let body = request.wire_body(ResponseMode::Streaming);
        assert_eq!(body["conversation_id"], "conv-1");
        assert!(body.get("auto_generate_name").is_none());
    }

    #[test]
    fn extra_fields_pass_through_without_clobbering() {
        let payload = serde_json::json!({
            "query": "hi",
            "response_mode": "blocking",
            "custom_flag": 7,
        });
        let request: ChatRequest = serde_json::from_value(payload).unwrap();

        let body = request.wire_body(ResponseMode::Streaming);
        assert_eq!(body["custom_flag"], 7);
        assert_eq!(body["response_mode"], "streaming");
    }

    #[test]
    fn workflow_body_carries_inputs() {
        let mut request = WorkflowRunRequest::default();
        request.inputs.insert("topic".into(), "rust".into());
        request.user = Some("u-1".into());

        let body = request.wire_body(ResponseMode::Blocking);
        assert_eq!(body["inputs"]["topic"], "rust");
        assert_eq!(body["response_mode"], "blocking");
        assert_eq!(body["user"], "u-1");
    }
}
