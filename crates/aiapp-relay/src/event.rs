//! Upstream event-stream frame model

use serde::Deserialize;
use serde_json::{Map, Value};

/// One parsed `data:` payload.
///
/// Dify tags its frames with an `event` field; relay-level failures arrive
/// as a bare `{"error": ...}` object with no tag.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StreamFrame {
    Event(StreamEvent),
    RelayError { error: String },
}

impl StreamFrame {
    pub fn parse(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

/// Dify stream event, dispatched on the `event` tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    Message {
        #[serde(default)]
        answer: String,
        #[serde(default)]
        conversation_id: Option<String>,
    },
    AgentMessage {
        #[serde(default)]
        answer: String,
    },
    MessageEnd {
        #[serde(default)]
        conversation_id: Option<String>,
    },
    TextChunk {
        #[serde(default)]
        data: TextChunkData,
    },
    WorkflowFinished {
        #[serde(default)]
        data: WorkflowFinishedData,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<Value>,
    },
    /// Anything else (`ping`, node lifecycle, tts frames) is ignored.
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextChunkData {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkflowFinishedData {
    #[serde(default)]
    pub outputs: Option<Map<String, Value>>,
}

impl WorkflowFinishedData {
    /// Join output values with newlines, in mapping insertion order.
    /// `None` when there are no outputs to render.
    pub fn joined_outputs(&self) -> Option<String> {
        let outputs = self.outputs.as_ref()?;
        if outputs.is_empty() {
            return None;
        }
        Some(join_output_values(outputs))
    }
}

/// String values join verbatim; anything else joins as compact JSON.
pub(crate) fn join_output_values(outputs: &Map<String, Value>) -> String {
    outputs
        .values()
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Best human-readable message for an error frame.
///
/// Covers both the flat `{"event":"error","message":...}` shape and the
/// relayed `{"event":"error","error":{"message":...}}` shape.
pub fn error_frame_message(message: Option<String>, error: Option<Value>) -> String {
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        return message;
    }
    match error {
        Some(Value::String(text)) if !text.is_empty() => text,
        Some(Value::Object(map)) => match map.get("message") {
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            _ => "upstream reported an error".to_string(),
        },
        _ => "upstream reported an error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_frame_parses() {
        let frame = StreamFrame::parse(r#"{"event":"message","answer":"Hel","conversation_id":"c1"}"#).unwrap();
        match frame {
            StreamFrame::Event(StreamEvent::Message {
                answer,
                conversation_id,
            }) => {
                assert_eq!(answer, "Hel");
                assert_eq!(conversation_id.as_deref(), Some("c1"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_is_ignored_variant() {
        let frame = StreamFrame::parse(r#"{"event":"node_started","data":{}}"#).unwrap();
        assert!(matches!(frame, StreamFrame::Event(StreamEvent::Ignored)));
    }

    #[test]
    fn bare_error_object_is_relay_error() {
        let frame = StreamFrame::parse(r#"{"error":"boom"}"#).unwrap();
        match frame {
            StreamFrame::RelayError { error } => assert_eq!(error, "boom"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn wrapped_error_event_yields_inner_message() {
        let frame =
            StreamFrame::parse(r#"{"event":"error","error":{"message":"nested boom"}}"#).unwrap();
        match frame {
            StreamFrame::Event(StreamEvent::Error { message, error }) => {
                assert_eq!(error_frame_message(message, error), "nested boom");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn outputs_join_in_insertion_order() {
        let frame = StreamFrame::parse(
            r#"{"event":"workflow_finished","data":{"outputs":{"a":"x","b":"y","n":3}}}"#,
        )
        .unwrap();
        match frame {
            StreamFrame::Event(StreamEvent::WorkflowFinished { data }) => {
                assert_eq!(data.joined_outputs().unwrap(), "x\ny\n3");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn empty_outputs_join_to_none() {
        let frame =
            StreamFrame::parse(r#"{"event":"workflow_finished","data":{"outputs":{}}}"#).unwrap();
        match frame {
            StreamFrame::Event(StreamEvent::WorkflowFinished { data }) => {
                assert!(data.joined_outputs().is_none());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
