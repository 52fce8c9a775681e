//! HCL Parser
//!
//! Parses HCL configuration source into an Abstract Syntax Tree.
//! Native syntax goes through the `hcl-lexer` token stream and a recursive
//! descent parser; documents whose first non-blank character is `{` are
//! read as JSON into the same tree.
//!
//! The parser is a pure syntax layer: duplicate keys are preserved and
//! nothing is evaluated or merged.
//!
//! # Example
//!
//! ```
//! use hcl_parser::Parser;
//!
//! let doc = Parser::parse("a = 1\na = 2\n").unwrap();
//! let root = doc.as_object().unwrap();
//! assert_eq!(root.filter("a").count(), 2);
//! ```

pub mod ast;
pub mod json;
pub mod parser;

pub use ast::{Literal, Node, NodeKind, ObjectItem, ObjectKey, ObjectList};
pub use parser::Parser;

use hcl_lexer::LexerError;
use hcl_span::{Pos, PositionedError};

/// Deepest nesting of objects and lists either parser accepts. Past this a
/// positioned error is returned instead of recursing further.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parser error with optional position information.
///
/// `pos` is `None` only when the failure cannot be tied to a location,
/// such as input that is not valid UTF-8.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("Parse error{}: {}", hcl_span::at(.pos.as_ref()), .message)]
pub struct ParseError {
    pub message: String,
    pub pos: Option<Pos>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: Pos) -> Self {
        Self {
            message: message.into(),
            pos: Some(pos),
        }
    }

    pub fn unpositioned(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pos: None,
        }
    }
}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        Self::new(e.message, e.pos)
    }
}

impl PositionedError for ParseError {
    fn pos(&self) -> Option<&Pos> {
        self.pos.as_ref()
    }

    fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_with_position() {
        let err = ParseError::new("Unexpected '}'", Pos::new(3, 1, 20).with_filename("a.hcl"));
        assert_eq!(err.to_string(), "Parse error at a.hcl:3:1: Unexpected '}'");
    }

    #[test]
    fn test_display_without_position() {
        let err = ParseError::unpositioned("Source is not valid UTF-8");
        assert_eq!(err.to_string(), "Parse error: Source is not valid UTF-8");
    }

    #[test]
    fn test_from_lexer_error_keeps_position() {
        let err: ParseError = LexerError {
            message: "Unterminated string".into(),
            pos: Pos::new(2, 4, 9),
        }
        .into();
        assert_eq!(err.pos, Some(Pos::new(2, 4, 9)));
        assert_eq!(err.message, "Unterminated string");
    }
}
