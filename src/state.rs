//! UI-agnostic chat state types
//!
//! Shared by the terminal front end and the one-shot `ask` command; nothing
//! here depends on a rendering framework.

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// Presentation class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Plain,
    Success,
    Error,
}

/// One entry in the transcript.
///
/// `content` is either plain text or a markup fragment using `<br>`, `<b>`
/// and `<i>`, as produced by [`crate::format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
    pub kind: MessageKind,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
            kind: MessageKind::Plain,
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::bot_with_kind(content, MessageKind::Plain)
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::bot_with_kind(content, MessageKind::Success)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::bot_with_kind(content, MessageKind::Error)
    }

    fn bot_with_kind(content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            sender: Sender::Bot,
            content: content.into(),
            kind,
        }
    }

    /// Whether `content` carries markup rather than plain text.
    pub fn is_markup(&self) -> bool {
        self.sender == Sender::Bot && self.kind != MessageKind::Plain
    }
}

/// Submission lifecycle. `Pending` covers the span between dispatching a
/// request and handling its outcome; sending is refused while in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Idle,
    Pending,
}
