//! HIL Parser
//!
//! Parses interpolation templates such as `web-${var.env}-${count.index + 1}`
//! into an expression AST. Literal text and `${ }` interpolations are
//! tokenized by a moded [`Scanner`], then parsed by recursive descent with
//! precedence climbing for the binary operators.
//!
//! Positions can be reported relative to where the template sits in an
//! enclosing file via [`Parser::parse_with_position`].
//!
//! # Example
//!
//! ```
//! use hcl_span::Pos;
//! use hil_parser::{ExprKind, Parser};
//!
//! let expr = Parser::parse_with_position("${1 + }", Pos::new(5, 10, 0));
//! let err = expr.unwrap_err();
//! assert_eq!(err.pos.unwrap().line_column(), (5, 16));
//!
//! let expr = Parser::parse("plain text").unwrap();
//! assert!(matches!(expr.kind, ExprKind::Literal(_)));
//! ```

pub mod ast;
pub mod parser;
pub mod scanner;
pub mod token;

pub use ast::{BinaryOp, Expr, ExprKind, Literal, MapEntry, UnaryOp, VariableRef};
pub use parser::Parser;
pub use scanner::Scanner;
pub use token::{Token, TokenKind};

use hcl_span::{Pos, PositionedError};

/// Deepest nesting of sub-expressions the parser accepts. Groups, lists,
/// maps, call arguments, indexes, conditionals, quoted strings and unary
/// operators each add a level.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Template parse error, lexical or syntactic.
///
/// The scanner and parser always set `pos`.
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
}

impl PositionedError for ParseError {
    fn pos(&self) -> Option<&Pos> {
        self.pos.as_ref()
    }

    fn message(&self) -> &str {
        &self.message
    }
}
