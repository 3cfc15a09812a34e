//! Blocking-response normalization
//!
//! A blocking call returns one JSON object. Content extraction follows the
//! same preference order regardless of app kind: workflow `outputs` beat
//! `answer`/`text`, and an empty result becomes the same fallback text the
//! streaming path uses.

use serde_json::Value;

use crate::error::{RelayError, Result};
use crate::event::{error_frame_message, join_output_values};
use crate::parser::FALLBACK_CONTENT;

/// Extract final content from a blocking response body.
pub fn blocking_content(body: &Value) -> Result<String> {
    if let Some(error) = body.get("error") {
        if !error.is_null() {
            return Err(RelayError::Backend(error_frame_message(
                None,
                Some(error.clone()),
            )));
        }
    }

    if let Some(outputs) = body
        .pointer("/data/outputs")
        .or_else(|| body.get("outputs"))
        .and_then(Value::as_object)
    {
        if !outputs.is_empty() {
            return Ok(join_output_values(outputs));
        }
    }

    for key in ["answer", "text"] {
        if let Some(text) = lookup_text(body, key) {
            return Ok(text.to_string());
        }
    }

    Ok(FALLBACK_CONTENT.to_string())
}

fn lookup_text<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .or_else(|| body.pointer(&format!("/data/{key}")))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}
