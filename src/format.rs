//! Rendering of code-analysis results into transcript markup.

use crate::protocol::{AnalysisResult, Suggestion};
use crate::state::Message;

pub const SUCCESS_HEADLINE: &str = "✅ Code ran successfully!";
pub const FAILURE_HEADLINE: &str = "❌ Your code has problems.";

const BREAK: &str = "<br>";

/// Convert line endings to `<br>` breaks. Trailing newlines are dropped so a
/// program's final `println` does not leave a dangling break.
pub fn nl2br(text: &str) -> String {
    text.trim_end_matches(['\r', '\n'])
        .replace("\r\n", "\n")
        .replace('\n', BREAK)
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Build the bot message for a `CODE_ANALYSIS` response.
pub fn render_analysis(result: &AnalysisResult) -> Message {
    if result.success {
        let mut content = String::from(SUCCESS_HEADLINE);
        if let Some(output) = non_blank(result.runtime_output.as_deref()) {
            content.push_str(BREAK);
            content.push_str(BREAK);
            content.push_str("<b>Output:</b>");
            content.push_str(BREAK);
            content.push_str(&nl2br(output));
        }
        return Message::success(content);
    }

    let mut sections = vec![FAILURE_HEADLINE.to_string()];

    if let Some(output) = non_blank(result.compile_output.as_deref()) {
        sections.push(format!("<b>Compiler output:</b>{}{}", BREAK, nl2br(output)));
    }

    if let Some(output) = non_blank(result.runtime_output.as_deref()) {
        sections.push(format!("<b>Runtime output:</b>{}{}", BREAK, nl2br(output)));
    }

    if !result.suggestions.is_empty() {
        let mut list = String::from("<b>Suggestions:</b>");
        for (i, suggestion) in result.suggestions.iter().enumerate() {
            list.push_str(BREAK);
            list.push_str(&render_suggestion(i + 1, suggestion));
        }
        sections.push(list);
    }

    Message::error(sections.join(&format!("{BREAK}{BREAK}")))
}

fn render_suggestion(number: usize, suggestion: &Suggestion) -> String {
    let mut item = format!(
        "{}. <b>{}</b>{}{}",
        number,
        nl2br(&suggestion.title),
        BREAK,
        nl2br(&suggestion.explanation)
    );

    if let Some(fix) = non_blank(suggestion.fix_example.as_deref()) {
        item.push_str(BREAK);
        item.push_str("<i>Fix:</i> ");
        item.push_str(&nl2br(fix));
    }

    item
}

/// A tag from the small markup vocabulary the formatter emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupTag {
    Break,
    Bold(bool),
    Italic(bool),
}

/// Recognize a markup tag at the start of `s`, returning it and its byte
/// length. Anything else, `List<String>` included, is not a tag.
pub fn parse_tag(s: &str) -> Option<(MarkupTag, usize)> {
    if !s.starts_with('<') {
        return None;
    }
    let end = s.find('>')?;
    let inner = s[1..end].trim().to_ascii_lowercase();
    let tag = match inner.as_str() {
        "br" | "br/" | "br /" => MarkupTag::Break,
        "b" | "strong" => MarkupTag::Bold(true),
        "/b" | "/strong" => MarkupTag::Bold(false),
        "i" | "em" => MarkupTag::Italic(true),
        "/i" | "/em" => MarkupTag::Italic(false),
        _ => return None,
    };
    Some((tag, end + 1))
}

/// Flatten markup to plain text for output that cannot style it.
pub fn strip_markup(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(c) = rest.chars().next() {
        if let Some((tag, len)) = parse_tag(rest) {
            if tag == MarkupTag::Break {
                out.push('\n');
            }
            rest = &rest[len..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}
