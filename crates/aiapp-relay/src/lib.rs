//! AiApp Relay - Dify upstream client and streaming answer parser
//!
//! This crate provides:
//! - Typed request shaping for chat / completion / workflow apps
//! - A streaming client that re-exposes upstream SSE responses
//! - An incremental parser folding SSE frames into a growing answer
//! - Blocking-response normalization sharing the streaming fallback

pub mod app;
pub mod blocking;
pub mod client;
pub mod error;
pub mod event;
mod http;
pub mod line_buffer;
pub mod parser;
pub mod request;
pub mod session;

// Re-export commonly used types
pub use app::{AppKind, AppProfile};
pub use blocking::blocking_content;
pub use client::{DifyClient, StreamOutcome};
pub use error::{RelayError, Result};
pub use line_buffer::LineBuffer;
pub use parser::{FALLBACK_CONTENT, StreamParser, StreamSink};
pub use request::{ChatRequest, ResponseMode, WorkflowRunRequest};
pub use session::{ChatMessage, ChatRole};
pub use tokio_util::sync::CancellationToken;
