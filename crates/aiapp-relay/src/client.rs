//! Dify upstream client
//!
//! One client per relay process; each call owns its own request state, so
//! concurrent requests never share a buffer or accumulator.

use futures::StreamExt;
use reqwest::Client;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::app::{AppKind, AppProfile};
use crate::error::{RelayError, Result};
use crate::http::build_http_client;
use crate::parser::{StreamParser, StreamSink};
use crate::request::{ChatRequest, ResponseMode, WorkflowRunRequest};

/// Final result of a fully consumed stream.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    pub content: String,
    pub conversation_id: Option<String>,
}

/// HTTP client for the upstream Dify API.
#[derive(Clone)]
pub struct DifyClient {
    client: Client,
    base_url: String,
}

impl DifyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: build_http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a streaming upstream response for raw relaying.
    ///
    /// The status is checked here, before any byte is forwarded; a
    /// non-success upstream answer never starts a stream.
    pub async fn open_stream(&self, app: &AppProfile, body: Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint_url(app.kind.endpoint()))
            .bearer_auth(&app.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        ensure_success(response).await
    }

    /// Blocking chat/completion call; returns the upstream JSON unmodified.
    pub async fn message_block(&self, app: &AppProfile, request: &ChatRequest) -> Result<Value> {
        self.request_blocking(app, request.wire_body(ResponseMode::Blocking))
            .await
    }

    /// Blocking workflow run; returns the upstream JSON unmodified.
    pub async fn workflow_block(
        &self,
        app: &AppProfile,
        request: &WorkflowRunRequest,
    ) -> Result<Value> {
        self.request_blocking(app, request.wire_body(ResponseMode::Blocking))
            .await
    }

    /// Stream a chat/completion request, pushing the growing answer into
    /// `sink` and returning the final content.
    pub async fn stream_message(
        &self,
        app: &AppProfile,
        request: &ChatRequest,
        sink: &mut dyn StreamSink,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome> {
        let response = self
            .open_stream(app, request.wire_body(ResponseMode::Streaming))
            .await?;
        self.drive(app.kind, response, sink, cancel).await
    }

    /// Stream a workflow run, pushing the growing answer into `sink`.
    pub async fn stream_workflow(
        &self,
        app: &AppProfile,
        request: &WorkflowRunRequest,
        sink: &mut dyn StreamSink,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome> {
        let response = self
            .open_stream(app, request.wire_body(ResponseMode::Streaming))
            .await?;
        self.drive(app.kind, response, sink, cancel).await
    }

    /// Stop a running generation task.
    pub async fn stop_generation(
        &self,
        app: &AppProfile,
        task_id: &str,
        user: &str,
    ) -> Result<Value> {
        let url = self.endpoint_url(&format!("/chat-messages/{task_id}/stop"));
        let response = self
            .client
            .post(url)
            .bearer_auth(&app.api_key)
            .json(&json!({ "user": user }))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Send like/dislike feedback for a message.
    pub async fn message_feedback(
        &self,
        app: &AppProfile,
        message_id: &str,
        rating: Option<&str>,
        user: &str,
        content: Option<&str>,
    ) -> Result<Value> {
        let mut body = json!({ "rating": rating, "user": user });
        if let Some(content) = content.filter(|content| !content.is_empty()) {
            body["content"] = content.into();
        }

        let url = self.endpoint_url(&format!("/messages/{message_id}/feedbacks"));
        let response = self
            .client
            .post(url)
            .bearer_auth(&app.api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Suggested follow-up questions for a finished message.
    pub async fn suggested_questions(
        &self,
        app: &AppProfile,
        message_id: &str,
        user: &str,
    ) -> Result<Vec<String>> {
        let url = self.endpoint_url(&format!("/messages/{message_id}/suggested"));
        let response = self
            .client
            .get(url)
            .bearer_auth(&app.api_key)
            .query(&[("user", user)])
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: Value = response.json().await?;
        let Some(entries) = body.get("data").and_then(Value::as_array) else {
            tracing::warn!("suggested questions response carried no data array");
            return Ok(Vec::new());
        };
        Ok(entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }

    async fn request_blocking(&self, app: &AppProfile, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.endpoint_url(app.kind.endpoint()))
            .bearer_auth(&app.api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Read loop: one parser per request, cancellation-aware, and the end
    /// callback fires exactly once on every exit path.
    async fn drive(
        &self,
        kind: AppKind,
        response: reqwest::Response,
        sink: &mut dyn StreamSink,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome> {
        let mut parser = StreamParser::new(kind);
        let mut stream = response.bytes_stream();

        let result = loop {
            tokio::select! {
                // Cancellation wins over pending bytes.
                biased;
                _ = cancel.cancelled() => break Err(RelayError::Cancelled),
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        let text = String::from_utf8_lossy(&bytes);
                        if let Err(err) = parser.feed(&text, sink) {
                            break Err(err);
                        }
                        if parser.is_terminated() {
                            break Ok(());
                        }
                    }
                    Some(Err(err)) => break Err(RelayError::Transport(err)),
                    None => break Ok(()),
                },
            }
        };

        match result {
            Ok(()) => {
                let content = parser.close(sink);
                Ok(StreamOutcome {
                    content,
                    conversation_id: parser.conversation_id().map(str::to_string),
                })
            }
            Err(err) => {
                parser.abort(sink);
                Err(err)
            }
        }
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RelayError::UpstreamStatus {
        status: status.as_u16(),
        body,
    })
}
