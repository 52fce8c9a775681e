//! HCL Lexer
//!
//! Tokenizes HCL configuration source into a stream of tokens.
//! Handles identifiers, quoted strings (with `${...}` regions kept verbatim),
//! heredocs, numbers, punctuation and the three comment styles.
//!
//! # Example
//!
//! ```
//! use hcl_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("port = 8080").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Ident("port".into()));
//! assert_eq!(tokens[2].kind, TokenKind::Number(8080));
//! assert_eq!(tokens[3].kind, TokenKind::Eof);
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};

use hcl_span::{Pos, PositionedError};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("Lexer error at {pos}: {message}")]
pub struct LexerError {
    pub message: String,
    pub pos: Pos,
}

impl PositionedError for LexerError {
    fn pos(&self) -> Option<&Pos> {
        Some(&self.pos)
    }

    fn message(&self) -> &str {
        &self.message
    }
}
