//! The chat widget core: transcript plus the submit lifecycle.
//!
//! A submission is split into [`ChatWidget::begin_submit`] and
//! [`ChatWidget::complete_submit`] so a front end can run the request on a
//! background task; [`ChatWidget::submit`] does both inline.

use std::fmt::Display;

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::format::render_analysis;
use crate::protocol::ApiResponse;
use crate::state::{Message, WidgetState};

pub const NETWORK_ERROR_MESSAGE: &str = "Sorry, I couldn't reach the server. Please try again.";
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Sorry, I received an unexpected response.";

/// A submission accepted by [`ChatWidget::begin_submit`] whose request has
/// not been sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub text: String,
}

#[derive(Debug)]
pub struct ChatWidget {
    transcript: Vec<Message>,
    state: WidgetState,
    input_focused: bool,
}

impl Default for ChatWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatWidget {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            state: WidgetState::Idle,
            input_focused: true,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == WidgetState::Pending
    }

    /// Whether the input and send controls accept interaction.
    pub fn controls_enabled(&self) -> bool {
        self.state == WidgetState::Idle
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    /// Accept `text` for sending. Returns `None` (and changes nothing) when
    /// the text is blank or a request is already in flight.
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingSubmission> {
        if text.trim().is_empty() {
            return None;
        }
        if self.is_pending() {
            warn!("submission ignored: a request is already pending");
            return None;
        }

        self.transcript.push(Message::user(text));
        self.state = WidgetState::Pending;
        self.input_focused = false;
        info!(chars = text.chars().count(), "submitting query");

        Some(PendingSubmission {
            text: text.to_string(),
        })
    }

    /// Record the outcome of the pending request and return to `Idle`.
    ///
    /// Any error, whatever its source, becomes the fixed network message.
    pub fn complete_submit<E: Display>(
        &mut self,
        outcome: std::result::Result<ApiResponse, E>,
    ) -> &Message {
        let message = match outcome {
            Ok(response) => render_response(&response),
            Err(err) => {
                warn!(error = %err, "query failed");
                Message::error(NETWORK_ERROR_MESSAGE)
            }
        };

        self.transcript.push(message);
        self.state = WidgetState::Idle;
        self.input_focused = true;

        &self.transcript[self.transcript.len() - 1]
    }

    /// Submit `text` through `client` and wait for the reply. Returns the
    /// bot message, or `None` if the submission was refused.
    pub async fn submit(&mut self, client: &ApiClient, text: &str) -> Option<&Message> {
        let pending = self.begin_submit(text)?;
        let outcome = client.query(&pending.text).await;
        Some(self.complete_submit(outcome))
    }

    /// Drop the transcript. Refused while a request is pending so the reply
    /// still has its user message to follow.
    pub fn clear(&mut self) -> bool {
        if self.is_pending() {
            return false;
        }
        self.transcript.clear();
        true
    }
}

/// Map a decoded response onto the bot message shown for it.
pub fn render_response(response: &ApiResponse) -> Message {
    match response {
        ApiResponse::Qa { answer, confidence } => {
            info!(?confidence, "answer received");
            Message::bot(answer.clone())
        }
        ApiResponse::NoAnswer { answer } => {
            info!("backend found no answer");
            Message::bot(answer.clone())
        }
        ApiResponse::CodeAnalysis { result } => {
            info!(
                success = result.success,
                suggestions = result.suggestions.len(),
                "code analysis received"
            );
            render_analysis(result)
        }
        ApiResponse::Unrecognized { tag } => {
            warn!(tag = tag.as_deref().unwrap_or("<missing>"), "unrecognized response type");
            Message::error(UNEXPECTED_RESPONSE_MESSAGE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::{AnalysisResult, Suggestion};
    use crate::state::{MessageKind, Sender};
    use tracing_test::traced_test;

    fn qa(answer: &str) -> ApiResponse {
        ApiResponse::Qa {
            answer: answer.to_string(),
            confidence: Some(0.9),
        }
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut widget = ChatWidget::new();
        assert!(widget.begin_submit("").is_none());
        assert!(widget.begin_submit("   \n\t ").is_none());
        assert!(widget.transcript().is_empty());
        assert_eq!(widget.state(), WidgetState::Idle);
    }

    #[test]
    fn test_begin_submit_enters_pending() {
        let mut widget = ChatWidget::new();
        let pending = widget.begin_submit("What is a JVM?").unwrap();

        assert_eq!(pending.text, "What is a JVM?");
        assert_eq!(widget.state(), WidgetState::Pending);
        assert!(!widget.controls_enabled());
        assert!(!widget.input_focused());
        assert_eq!(widget.transcript(), &[Message::user("What is a JVM?")]);
    }

    #[test]
    fn test_second_submit_while_pending_is_refused() {
        let mut widget = ChatWidget::new();
        widget.begin_submit("first").unwrap();

        assert!(widget.begin_submit("second").is_none());
        assert_eq!(widget.transcript().len(), 1);
    }

    #[test]
    fn test_qa_answer_is_verbatim() {
        let mut widget = ChatWidget::new();
        widget.begin_submit("meaning of life").unwrap();
        let reply = widget.complete_submit::<Error>(Ok(qa("42"))).clone();

        assert_eq!(reply.content, "42");
        assert_eq!(reply.sender, Sender::Bot);
        assert_eq!(reply.kind, MessageKind::Plain);
        assert_eq!(widget.transcript().len(), 2);
        assert_eq!(widget.transcript()[0].sender, Sender::User);
    }

    #[test]
    #[traced_test]
    fn test_missing_confidence_is_logged_as_absent() {
        render_response(&ApiResponse::Qa {
            answer: "42".to_string(),
            confidence: None,
        });
        assert!(logs_contain("confidence=None"));

        render_response(&qa("42"));
        assert!(logs_contain("confidence=Some(0.9)"));
    }

    #[test]
    fn test_no_answer_is_plain() {
        let reply = render_response(&ApiResponse::NoAnswer {
            answer: "No relevant Java answer found.".to_string(),
        });
        assert_eq!(reply, Message::bot("No relevant Java answer found."));
    }

    #[test]
    fn test_code_analysis_goes_through_formatter() {
        let reply = render_response(&ApiResponse::CodeAnalysis {
            result: AnalysisResult {
                success: false,
                suggestions: vec![Suggestion {
                    title: "Fix import".to_string(),
                    explanation: "Add java.util.*".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        });
        assert_eq!(reply.kind, MessageKind::Error);
        assert!(reply.content.contains("1. <b>Fix import</b>"));
    }

    #[test]
    fn test_unrecognized_uses_fallback() {
        let reply = render_response(&ApiResponse::Unrecognized {
            tag: Some("EMPTY_INPUT".to_string()),
        });
        assert_eq!(reply, Message::error(UNEXPECTED_RESPONSE_MESSAGE));
    }

    #[test]
    fn test_every_outcome_returns_to_idle() {
        let outcomes: Vec<std::result::Result<ApiResponse, String>> = vec![
            Ok(qa("ok")),
            Ok(ApiResponse::Unrecognized { tag: None }),
            Err("connection refused".to_string()),
        ];

        for outcome in outcomes {
            let mut widget = ChatWidget::new();
            widget.begin_submit("hello").unwrap();
            widget.complete_submit(outcome);

            assert_eq!(widget.state(), WidgetState::Idle);
            assert!(widget.controls_enabled());
            assert!(widget.input_focused());
            assert_eq!(widget.transcript().len(), 2);
        }
    }

    #[test]
    fn test_error_hides_detail() {
        let mut widget = ChatWidget::new();
        widget.begin_submit("hello").unwrap();
        let reply = widget.complete_submit::<String>(Err("secret stack trace".to_string()));

        assert_eq!(reply.content, NETWORK_ERROR_MESSAGE);
        assert_eq!(reply.kind, MessageKind::Error);
    }

    #[test]
    fn test_transcript_keeps_insertion_order() {
        let mut widget = ChatWidget::new();
        for (question, answer) in [("q1", "a1"), ("q2", "a2")] {
            widget.begin_submit(question).unwrap();
            widget.complete_submit::<Error>(Ok(qa(answer)));
        }

        let contents: Vec<&str> = widget.transcript().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q1", "a1", "q2", "a2"]);
    }

    #[test]
    fn test_clear_refused_while_pending() {
        let mut widget = ChatWidget::new();
        widget.begin_submit("hello").unwrap();
        assert!(!widget.clear());

        widget.complete_submit::<Error>(Ok(qa("hi")));
        assert!(widget.clear());
        assert!(widget.transcript().is_empty());
    }
}
