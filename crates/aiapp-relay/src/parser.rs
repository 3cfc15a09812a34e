//! Incremental answer parser
//!
//! Folds a stream of SSE frames into one growing answer string. The parser
//! is a plain value owned by its request: concurrent requests each hold
//! their own parser and never share state.

use crate::app::AppKind;
use crate::error::{RelayError, Result};
use crate::event::{StreamEvent, StreamFrame, error_frame_message};
use crate::line_buffer::LineBuffer;

/// Shown when a request finishes without producing any usable content.
/// Shared with the blocking normalizer so the two paths cannot drift.
pub const FALLBACK_CONTENT: &str =
    "No valid content was received. Please try rephrasing your request.";

/// Receiver for incremental answer updates.
///
/// `on_answer` gets the full accumulated answer after every growth step.
/// `on_end` fires exactly once per request, on terminal event, natural
/// close, error, or cancellation.
pub trait StreamSink {
    fn on_answer(&mut self, answer: &str);
    fn on_end(&mut self);
}

/// Per-request parse context.
#[derive(Debug)]
pub struct StreamParser {
    kind: AppKind,
    lines: LineBuffer,
    answer: String,
    conversation_id: Option<String>,
    has_content: bool,
    has_text_chunk: bool,
    terminated: bool,
    end_fired: bool,
}

impl StreamParser {
    pub fn new(kind: AppKind) -> Self {
        Self {
            kind,
            lines: LineBuffer::new(),
            answer: String::new(),
            conversation_id: None,
            has_content: false,
            has_text_chunk: false,
            terminated: false,
            end_fired: false,
        }
    }

    /// Feed one decoded chunk, emitting updates for every completed frame.
    ///
    /// An error frame aborts with `RelayError::Backend`; the caller is then
    /// responsible for `abort()` so the end callback still fires.
    pub fn feed(&mut self, chunk: &str, sink: &mut dyn StreamSink) -> Result<()> {
        for line in self.lines.push(chunk) {
            if self.terminated {
                break;
            }
            self.handle_line(&line, sink)?;
        }
        Ok(())
    }

    /// Terminal event already seen; remaining frames will be ignored.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Last conversation id carried by a `message`/`message_end` frame.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Clean close of the byte stream. Emits the fallback text when nothing
    /// was ever produced, fires the end callback if it has not fired, and
    /// returns the final answer.
    pub fn close(&mut self, sink: &mut dyn StreamSink) -> String {
        self.finish(sink);
        self.answer.clone()
    }

    /// Error or cancellation teardown: fires the end callback (once) without
    /// emitting any further content.
    pub fn abort(&mut self, sink: &mut dyn StreamSink) {
        self.fire_end(sink);
    }

    fn handle_line(&mut self, line: &str, sink: &mut dyn StreamSink) -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        let Some(payload) = line.strip_prefix("data:") else {
            return Ok(());
        };
        let payload = payload.trim();
        if payload.is_empty() {
            return Ok(());
        }

        let frame = match StreamFrame::parse(payload) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::debug!("skipping malformed stream frame: {} ({})", payload, err);
                return Ok(());
            }
        };

        match frame {
            StreamFrame::RelayError { error } => Err(RelayError::Backend(error)),
            StreamFrame::Event(event) => self.handle_event(event, sink),
        }
    }

    fn handle_event(&mut self, event: StreamEvent, sink: &mut dyn StreamSink) -> Result<()> {
        match event {
            StreamEvent::Error { message, error } => {
                return Err(RelayError::Backend(error_frame_message(message, error)));
            }

            StreamEvent::Message {
                answer,
                conversation_id,
            } if !self.kind.is_workflow() => {
                if let Some(id) = conversation_id {
                    self.conversation_id = Some(id);
                }
                self.append(&answer, sink);
            }
            StreamEvent::AgentMessage { answer } if !self.kind.is_workflow() => {
                self.append(&answer, sink);
            }
            StreamEvent::MessageEnd { conversation_id } if !self.kind.is_workflow() => {
                if let Some(id) = conversation_id {
                    self.conversation_id = Some(id);
                }
                self.terminated = true;
                self.finish(sink);
            }

            StreamEvent::TextChunk { data } if self.kind.is_workflow() => {
                if !data.text.is_empty() {
                    self.has_text_chunk = true;
                    self.append(&data.text, sink);
                }
            }
            StreamEvent::WorkflowFinished { data } if self.kind.is_workflow() => {
                if !self.has_text_chunk {
                    if let Some(joined) = data.joined_outputs() {
                        self.answer = joined;
                        self.has_content = true;
                        sink.on_answer(&self.answer);
                    }
                }
                self.terminated = true;
                self.finish(sink);
            }

            // Frames from the other protocol family, and anything unknown.
            _ => {}
        }
        Ok(())
    }

    fn append(&mut self, text: &str, sink: &mut dyn StreamSink) {
        if text.is_empty() {
            return;
        }
        self.answer.push_str(text);
        self.has_content = true;
        sink.on_answer(&self.answer);
    }

    fn finish(&mut self, sink: &mut dyn StreamSink) {
        if self.end_fired {
            return;
        }
        if !self.has_content {
            self.answer = FALLBACK_CONTENT.to_string();
            self.has_content = true;
            sink.on_answer(&self.answer);
        }
        self.fire_end(sink);
    }

    fn fire_end(&mut self, sink: &mut dyn StreamSink) {
        if !self.end_fired {
            self.end_fired = true;
            sink.on_end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSink {
        answers: Vec<String>,
        ends: usize,
    }

    impl StreamSink for RecordingSink {
        fn on_answer(&mut self, answer: &str) {
            self.answers.push(answer.to_string());
        }

        fn on_end(&mut self) {
            self.ends += 1;
        }
    }

    const CHAT_STREAM: &str = concat!(
        "data: {\"event\":\"message\",\"answer\":\"Hel\"}\n\n",
        "data: {\"event\":\"message\",\"answer\":\"lo\",\"conversation_id\":\"c-9\"}\n\n",
        "data: {\"event\":\"message_end\"}\n\n",
    );

    fn run_chat(chunks: &[&str]) -> (RecordingSink, String) {
        let mut parser = StreamParser::new(AppKind::Chat);
        let mut sink = RecordingSink::default();
        for chunk in chunks {
            parser.feed(chunk, &mut sink).unwrap();
        }
        let answer = parser.close(&mut sink);
        (sink, answer)
    }

    #[test]
    fn chat_stream_emits_growing_answer_then_ends_once() {
        let (sink, answer) = run_chat(&[CHAT_STREAM]);
        assert_eq!(sink.answers, vec!["Hel".to_string(), "Hello".to_string()]);
        assert_eq!(sink.ends, 1);
        assert_eq!(answer, "Hello");
    }

    #[test]
    fn every_chunk_split_reconstructs_the_same_answer() {
        let (whole, expected) = run_chat(&[CHAT_STREAM]);

        for split in 0..=CHAT_STREAM.len() {
            let (sink, answer) = run_chat(&[&CHAT_STREAM[..split], &CHAT_STREAM[split..]]);
            assert_eq!(answer, expected, "split at byte {split}");
            assert_eq!(sink.answers, whole.answers, "split at byte {split}");
            assert_eq!(sink.ends, 1, "split at byte {split}");
        }
    }

    #[test]
    fn single_byte_chunks_reconstruct_the_same_answer() {
        let (_, expected) = run_chat(&[CHAT_STREAM]);

        let mut parser = StreamParser::new(AppKind::Chat);
        let mut sink = RecordingSink::default();
        for index in 0..CHAT_STREAM.len() {
            parser
                .feed(&CHAT_STREAM[index..index + 1], &mut sink)
                .unwrap();
        }
        assert_eq!(parser.close(&mut sink), expected);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn malformed_frame_is_skipped_without_effect() {
        let with_garbage = concat!(
            "data: {\"event\":\"message\",\"answer\":\"Hel\"}\n\n",
            "data: {not json at all\n\n",
            "data: {\"event\":\"message\",\"answer\":\"lo\",\"conversation_id\":\"c-9\"}\n\n",
            "data: {\"event\":\"message_end\"}\n\n",
        );
        let (_, clean) = run_chat(&[CHAT_STREAM]);
        let (sink, garbled) = run_chat(&[with_garbage]);
        assert_eq!(garbled, clean);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn agent_message_counts_as_chat_content() {
        let (sink, answer) = run_chat(&[
            "data: {\"event\":\"agent_message\",\"answer\":\"Hi\"}\n\n",
            "data: {\"event\":\"message_end\"}\n\n",
        ]);
        assert_eq!(answer, "Hi");
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn frames_after_terminal_event_are_ignored() {
        let (sink, answer) = run_chat(&[
            "data: {\"event\":\"message\",\"answer\":\"Hi\"}\n\n",
            "data: {\"event\":\"message_end\"}\n\n",
            "data: {\"event\":\"message\",\"answer\":\" there\"}\n\n",
        ]);
        assert_eq!(answer, "Hi");
        assert_eq!(sink.answers.last().unwrap(), "Hi");
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn conversation_id_is_retained() {
        let mut parser = StreamParser::new(AppKind::Chat);
        let mut sink = RecordingSink::default();
        parser.feed(CHAT_STREAM, &mut sink).unwrap();
        assert_eq!(parser.conversation_id(), Some("c-9"));
    }

    #[test]
    fn workflow_outputs_join_when_no_text_chunks_seen() {
        let mut parser = StreamParser::new(AppKind::Workflow);
        let mut sink = RecordingSink::default();
        parser
            .feed(
                "data: {\"event\":\"workflow_finished\",\"data\":{\"outputs\":{\"a\":\"x\",\"b\":\"y\"}}}\n\n",
                &mut sink,
            )
            .unwrap();
        let answer = parser.close(&mut sink);
        assert_eq!(answer, "x\ny");
        assert_eq!(sink.answers, vec!["x\ny".to_string()]);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn text_chunks_suppress_final_outputs() {
        let mut parser = StreamParser::new(AppKind::Workflow);
        let mut sink = RecordingSink::default();
        parser
            .feed(
                concat!(
                    "data: {\"event\":\"text_chunk\",\"data\":{\"text\":\"par\"}}\n\n",
                    "data: {\"event\":\"text_chunk\",\"data\":{\"text\":\"tial\"}}\n\n",
                    "data: {\"event\":\"workflow_finished\",\"data\":{\"outputs\":{\"a\":\"ignored\"}}}\n\n",
                ),
                &mut sink,
            )
            .unwrap();
        let answer = parser.close(&mut sink);
        assert_eq!(answer, "partial");
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn empty_close_emits_fallback_once() {
        let (sink, answer) = run_chat(&[]);
        assert_eq!(answer, FALLBACK_CONTENT);
        assert_eq!(sink.answers, vec![FALLBACK_CONTENT.to_string()]);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn terminal_without_content_also_falls_back() {
        let (sink, answer) = run_chat(&["data: {\"event\":\"message_end\"}\n\n"]);
        assert_eq!(answer, FALLBACK_CONTENT);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn error_frame_aborts_with_message() {
        let mut parser = StreamParser::new(AppKind::Chat);
        let mut sink = RecordingSink::default();
        let err = parser
            .feed("data: {\"error\":\"boom\"}\n\n", &mut sink)
            .unwrap_err();
        assert!(matches!(err, RelayError::Backend(message) if message == "boom"));

        parser.abort(&mut sink);
        parser.abort(&mut sink);
        assert_eq!(sink.ends, 1);
        assert!(sink.answers.is_empty());
    }

    #[test]
    fn error_event_aborts_with_message() {
        let mut parser = StreamParser::new(AppKind::Workflow);
        let mut sink = RecordingSink::default();
        let err = parser
            .feed(
                "data: {\"event\":\"error\",\"message\":\"quota exceeded\"}\n\n",
                &mut sink,
            )
            .unwrap_err();
        assert!(matches!(err, RelayError::Backend(message) if message == "quota exceeded"));
    }

    #[test]
    fn blank_and_non_data_lines_are_skipped() {
        let (sink, answer) = run_chat(&[
            "\n: keep-alive comment\nevent: message\ndata: {\"event\":\"message\",\"answer\":\"ok\"}\n\n",
            "data: {\"event\":\"message_end\"}\n\n",
        ]);
        assert_eq!(answer, "ok");
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn close_is_idempotent_for_end_callback() {
        let mut parser = StreamParser::new(AppKind::Chat);
        let mut sink = RecordingSink::default();
        parser.feed(CHAT_STREAM, &mut sink).unwrap();
        parser.close(&mut sink);
        parser.close(&mut sink);
        assert_eq!(sink.ends, 1);
    }
}
