//! Error contract shared by both parsers and source-excerpt rendering.

use crate::pos::Pos;

/// Label used for sources parsed without a filename.
const ANONYMOUS_SOURCE: &str = "<input>";

/// An error that may point at a location in the parsed source.
///
/// The position is optional: failures that cannot be attributed to a
/// location (invalid UTF-8 input, for instance) report `None` rather than
/// a made-up `0:0`.
pub trait PositionedError: std::error::Error {
    fn pos(&self) -> Option<&Pos>;

    fn message(&self) -> &str;

    /// Render the error with an excerpt of `source` underlining the
    /// offending line and column.
    fn render(&self, source: &str) -> String {
        render(source, self.pos(), self.message())
    }
}

/// Format the ` at <pos>` suffix used by the error `Display` impls.
pub fn at(pos: Option<&Pos>) -> String {
    match pos {
        Some(pos) => format!(" at {pos}"),
        None => String::new(),
    }
}

/// Render `message` as a report over `source`.
///
/// Without a usable position only the message line is produced. Colour output is
/// disabled so the result is stable across terminals.
pub fn render(source: &str, pos: Option<&Pos>, message: &str) -> String {
    use ariadne::{Config, Label, Report, ReportKind, Source};

    let Some(pos) = pos.filter(|pos| pos.is_valid()) else {
        return format!("Error: {message}");
    };

    let id = pos.filename().unwrap_or(ANONYMOUS_SOURCE).to_string();
    let start = char_index(source, pos);
    let len = source.chars().count();
    let span = start..(start + 1).min(len).max(start);

    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, id.clone(), start)
        .with_config(Config::default().with_color(false))
        .with_message(message)
        .with_label(Label::new((id.clone(), span)).with_message(message))
        .finish()
        .write((id, Source::from(source)), &mut output);

    match written {
        Ok(()) => String::from_utf8_lossy(&output).into_owned(),
        Err(_) => format!("Error{}: {message}", at(Some(pos))),
    }
}

/// Character index of `pos` within `source`, clamped to the end of input.
///
/// ariadne spans count characters, while `Pos::offset` counts bytes and may
/// be relative to an embedded snippet, so the line and column are used.
fn char_index(source: &str, pos: &Pos) -> usize {
    let mut line = 1;
    let mut column = 1;
    let mut index = 0;

    for ch in source.chars() {
        if line == pos.line && column == pos.column {
            return index;
        }
        if line > pos.line {
            // Column ran past the end of the target line.
            return index.saturating_sub(1);
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
        index += 1;
    }

    index
}
