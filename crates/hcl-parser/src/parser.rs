//! Document parser for HCL.
//!
//! Pulls tokens from the `hcl-lexer` scanner one at a time (single token
//! lookahead) and builds the `Node` tree by recursive descent:
//!
//! ```text
//! document    = object_list EOF
//! object_list = { object_item [","] }
//! object_item = keys ( "=" value | object )
//! keys        = ( IDENT | STRING ) { IDENT | STRING }
//! value       = literal | object | list
//! object      = "{" object_list "}"
//! list        = "[" [ element { "," element } [","] ] "]"
//! ```

use hcl_lexer::{Scanner, Token, TokenKind};

use crate::ast::{Literal, Node, NodeKind, ObjectItem, ObjectKey, ObjectList};
use crate::json::JsonParser;
use crate::{ParseError, MAX_NESTING_DEPTH};

/// HCL document parser.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    tok: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser over a scanner, reading the first token.
    pub fn new(mut scanner: Scanner<'a>) -> Result<Self, ParseError> {
        let tok = scanner.next_token()?;
        Ok(Self {
            scanner,
            tok,
            depth: 0,
        })
    }

    /// Parse source into a document AST.
    pub fn parse(source: &str) -> Result<Node, ParseError> {
        Self::parse_with_filename(source, "")
    }

    /// Parse source, stamping every position with `filename`.
    pub fn parse_with_filename(source: &str, filename: &str) -> Result<Node, ParseError> {
        tracing::debug!(bytes = source.len(), filename, "parsing HCL document");

        let result = if is_json(source) {
            JsonParser::new(source).with_filename(filename).parse()
        } else {
            Parser::new(Scanner::new(source).with_filename(filename))
                .and_then(|mut parser| parser.parse_document())
        };

        if let Err(e) = &result {
            tracing::debug!(error = %e, "HCL document rejected");
        }
        result
    }

    /// Parse raw bytes. Input that is not valid UTF-8 fails without a position.
    pub fn parse_bytes(source: &[u8]) -> Result<Node, ParseError> {
        let source = std::str::from_utf8(source)
            .map_err(|e| ParseError::unpositioned(format!("Source is not valid UTF-8: {e}")))?;
        Self::parse(source)
    }

    /// Parse a full document. The root object takes the position of the
    /// first token.
    pub fn parse_document(&mut self) -> Result<Node, ParseError> {
        let pos = self.tok.pos.clone();
        let list = self.parse_object_list(false)?;

        // Top-level lists end only at EOF.
        if self.tok.kind != TokenKind::Eof {
            return Err(self.unexpected("end of file"));
        }

        Ok(Node::new(NodeKind::Object(list), pos))
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Parse items until EOF, or until `}` when inside braces.
    fn parse_object_list(&mut self, nested: bool) -> Result<ObjectList, ParseError> {
        let mut items = Vec::new();

        loop {
            match self.tok.kind {
                TokenKind::Eof => break,
                TokenKind::RBrace if nested => break,
                TokenKind::RBrace => return Err(self.unexpected("object key")),
                _ => {}
            }

            items.push(self.parse_object_item()?);

            // Items may be separated by commas
            if self.tok.kind == TokenKind::Comma {
                self.bump()?;
            }
        }

        Ok(ObjectList { items })
    }

    /// Parse `keys = value` or `keys { ... }`.
    fn parse_object_item(&mut self) -> Result<ObjectItem, ParseError> {
        let keys = self.parse_object_keys()?;
        let pos = keys[0].pos.clone();

        let value = match self.tok.kind {
            TokenKind::Assign if keys.len() > 1 => {
                return Err(self.error(format!(
                    "Nested object expected after keys {}, found '='",
                    quote_keys(&keys)
                )));
            }
            TokenKind::Assign => {
                self.bump()?;
                self.parse_value()?
            }
            TokenKind::LBrace => self.parse_object()?,
            _ => {
                return Err(self.error(format!(
                    "Key '{}' expected start of object ('{{') or assignment ('='), found {}",
                    keys[keys.len() - 1].name,
                    self.tok.describe()
                )));
            }
        };

        Ok(ObjectItem { keys, value, pos })
    }

    /// Parse one or more keys, stopping at `=`, `{`, or anything else that
    /// cannot be a key.
    fn parse_object_keys(&mut self) -> Result<Vec<ObjectKey>, ParseError> {
        let mut keys = Vec::new();

        loop {
            let (name, quoted) = match &self.tok.kind {
                TokenKind::Ident(name) => (name.clone(), false),
                TokenKind::String(name) => (name.clone(), true),
                _ if keys.is_empty() => return Err(self.unexpected("object key")),
                _ => return Ok(keys),
            };

            let tok = self.bump()?;
            keys.push(ObjectKey {
                name,
                quoted,
                pos: tok.pos,
            });
        }
    }

    /// Parse `{ ... }`.
    fn parse_object(&mut self) -> Result<Node, ParseError> {
        self.enter()?;
        let open = self.bump()?; // consume `{`
        let list = self.parse_object_list(true)?;

        if self.tok.kind != TokenKind::RBrace {
            return Err(self.error(format!(
                "Object expected closing '}}', found {}",
                self.tok.describe()
            )));
        }
        self.bump()?;
        self.depth -= 1;

        Ok(Node::new(NodeKind::Object(list), open.pos))
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        match self.tok.kind {
            _ if self.tok.kind.is_literal() => self.parse_literal(),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBrack => self.parse_list(),
            _ => Err(self.unexpected("value")),
        }
    }

    /// Parse `[ v, v, ... ]`. Commas are required between elements; a
    /// trailing comma is allowed.
    fn parse_list(&mut self) -> Result<Node, ParseError> {
        self.enter()?;
        let open = self.bump()?; // consume `[`
        let mut elements = Vec::new();
        let mut need_comma = false;

        loop {
            match self.tok.kind {
                TokenKind::RBrack => {
                    self.bump()?;
                    break;
                }
                TokenKind::Comma if need_comma => {
                    self.bump()?;
                    need_comma = false;
                }
                TokenKind::Eof => {
                    return Err(self.error(format!(
                        "List expected closing ']', found {}",
                        self.tok.describe()
                    )));
                }
                _ if need_comma => {
                    return Err(self.error(format!(
                        "Expected ',' or ']' in list, found {}",
                        self.tok.describe()
                    )));
                }
                _ if self.tok.kind.is_literal() => {
                    elements.push(self.parse_literal()?);
                    need_comma = true;
                }
                TokenKind::LBrace => {
                    elements.push(self.parse_object()?);
                    need_comma = true;
                }
                TokenKind::LBrack => {
                    elements.push(self.parse_list()?);
                    need_comma = true;
                }
                _ => {
                    return Err(self.error(format!(
                        "Unexpected token while parsing list: {}",
                        self.tok.describe()
                    )));
                }
            }
        }

        self.depth -= 1;
        Ok(Node::new(NodeKind::List(elements), open.pos))
    }

    fn parse_literal(&mut self) -> Result<Node, ParseError> {
        let tok = self.bump()?;
        let literal = match tok.kind {
            TokenKind::String(s) => Literal::String(s),
            TokenKind::Heredoc(s) => Literal::Heredoc(s),
            TokenKind::Number(n) => Literal::Number(n),
            TokenKind::Float(f) => Literal::Float(f),
            TokenKind::Bool(b) => Literal::Bool(b),
            other => {
                return Err(ParseError::new(
                    format!("Expected literal, found {}", other.name()),
                    tok.pos,
                ))
            }
        };
        Ok(Node::new(NodeKind::Literal(literal), tok.pos))
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    /// Consume the current token and return it, pulling the next one.
    fn bump(&mut self) -> Result<Token, ParseError> {
        let next = self.scanner.next_token()?;
        Ok(std::mem::replace(&mut self.tok, next))
    }

    /// Step into an object or list, failing at its opening token once the
    /// nesting limit is passed. Only the success paths step back out.
    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth == MAX_NESTING_DEPTH {
            return Err(self.error(format!(
                "Nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.error(format!("Expected {expected}, found {}", self.tok.describe()))
    }

    fn error(&self, message: String) -> ParseError {
        ParseError::new(message, self.tok.pos.clone())
    }
}

/// JSON documents start with `{` after optional whitespace.
fn is_json(source: &str) -> bool {
    source.trim_start().starts_with('{')
}

fn quote_keys(keys: &[ObjectKey]) -> String {
    keys.iter()
        .map(|k| format!("'{}'", k.name))
        .collect::<Vec<_>>()
        .join(" ")
}
