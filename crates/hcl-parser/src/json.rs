//! JSON documents.
//!
//! A JSON document maps onto the same tree as native syntax: every object
//! becomes an [`ObjectList`] whose items carry quoted keys, arrays become
//! lists, and `null` becomes [`Literal::Null`]. Keys are kept in source
//! order and duplicates are preserved.
//!
//! Nested objects are then folded into block form, so that
//! `{"resource": {"aws_instance": {"web": {...}}}}` yields the same item as
//! `resource "aws_instance" "web" {...}`:
//!
//! - an item whose value is a non-empty object made only of object-valued
//!   items is replaced by one item per inner item, keys concatenated;
//! - an item whose value is a non-empty array of objects is replaced by one
//!   item per element, keys repeated.
//!
//! Anything else is kept as written.

use std::sync::Arc;

use hcl_span::Pos;

use crate::ast::{Literal, Node, NodeKind, ObjectItem, ObjectKey, ObjectList};
use crate::{ParseError, MAX_NESTING_DEPTH};

/// Recursive descent parser for JSON configuration.
pub struct JsonParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
    filename: Option<Arc<str>>,
    depth: usize,
}

impl<'a> JsonParser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            filename: None,
            depth: 0,
        }
    }

    pub fn with_filename(mut self, filename: impl AsRef<str>) -> Self {
        self.filename = Pos::start().with_filename(filename).filename;
        self
    }

    /// Parse the document. The root value must be an object.
    pub fn parse(mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        if self.peek() != '{' {
            return Err(self.error("JSON document must be an object"));
        }

        let root = self.parse_object()?;

        self.skip_whitespace();
        if !self.is_at_end() {
            return Err(self.error(format!(
                "Unexpected '{}' after end of JSON document",
                self.peek()
            )));
        }
        Ok(flatten_node(root))
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        let start = self.current_pos();

        let literal = match self.peek() {
            '{' => return self.parse_object(),
            '[' => return self.parse_array(),
            '"' => Literal::String(self.parse_string()?),
            '-' | '0'..='9' => self.parse_number()?,
            c if c.is_alphabetic() => match self.parse_word().as_str() {
                "true" => Literal::Bool(true),
                "false" => Literal::Bool(false),
                "null" => Literal::Null,
                word => {
                    return Err(ParseError::new(format!("Unexpected word '{word}' in JSON"), start))
                }
            },
            _ if self.is_at_end() => return Err(self.error("Expected JSON value, found end of file")),
            c => return Err(self.error(format!("Expected JSON value, found '{c}'"))),
        };

        Ok(Node::new(NodeKind::Literal(literal), start))
    }

    /// `{ "key": value, ... }`
    fn parse_object(&mut self) -> Result<Node, ParseError> {
        self.enter()?;
        let start = self.current_pos();
        self.advance(); // consume `{`

        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == '}' {
            self.advance();
            self.depth -= 1;
            return Ok(Node::new(NodeKind::Object(ObjectList { items }), start));
        }

        loop {
            self.skip_whitespace();
            if self.peek() != '"' {
                return Err(self.expected("object key string"));
            }
            let key_pos = self.current_pos();
            let name = self.parse_string()?;

            self.skip_whitespace();
            if self.peek() != ':' {
                return Err(self.expected("':' after object key"));
            }
            self.advance();

            let value = self.parse_value()?;
            items.push(ObjectItem {
                keys: vec![ObjectKey {
                    name,
                    quoted: true,
                    pos: key_pos.clone(),
                }],
                value,
                pos: key_pos,
            });

            self.skip_whitespace();
            match self.peek() {
                ',' => self.advance(),
                '}' => {
                    self.advance();
                    break;
                }
                _ => return Err(self.expected("',' or '}' in object")),
            }
        }

        self.depth -= 1;
        Ok(Node::new(NodeKind::Object(ObjectList { items }), start))
    }

    /// `[ value, ... ]`
    fn parse_array(&mut self) -> Result<Node, ParseError> {
        self.enter()?;
        let start = self.current_pos();
        self.advance(); // consume `[`

        let mut elements = Vec::new();
        self.skip_whitespace();
        if self.peek() == ']' {
            self.advance();
            self.depth -= 1;
            return Ok(Node::new(NodeKind::List(elements), start));
        }

        loop {
            elements.push(self.parse_value()?);

            self.skip_whitespace();
            match self.peek() {
                ',' => self.advance(),
                ']' => {
                    self.advance();
                    break;
                }
                _ => return Err(self.expected("',' or ']' in array")),
            }
        }

        self.depth -= 1;
        Ok(Node::new(NodeKind::List(elements), start))
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.current_pos();
        self.advance(); // consume opening quote

        let mut value = String::new();
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(ParseError::new("Unterminated string", start));
            }

            let ch = self.peek();
            self.advance();
            match ch {
                '"' => return Ok(value),
                '\\' => value.push(self.parse_escape()?),
                _ => value.push(ch),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, ParseError> {
        let ch = self.peek();
        self.advance();

        let decoded = match ch {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                let high = self.parse_hex4()?;
                if (0xd800..0xdc00).contains(&high) && self.peek() == '\\' && self.peek_next() == 'u' {
                    self.advance();
                    self.advance();
                    let low = self.parse_hex4()?;
                    let combined = 0x10000 + ((high - 0xd800) << 10) + (low.wrapping_sub(0xdc00) & 0x3ff);
                    char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER)
                } else {
                    char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER)
                }
            }
            _ => return Err(self.error(format!("Invalid escape sequence: '\\{ch}'"))),
        };
        Ok(decoded)
    }

    fn parse_hex4(&mut self) -> Result<u32, ParseError> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = self
                .peek()
                .to_digit(16)
                .ok_or_else(|| self.error("Escape sequence expects 4 hexadecimal digits"))?;
            value = value * 16 + digit;
            self.advance();
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Literal, ParseError> {
        let start = self.current_pos();
        let mut is_float = false;

        if self.peek() == '-' {
            self.advance();
        }
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == '.' {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        if matches!(self.peek(), 'e' | 'E') {
            is_float = true;
            self.advance();
            if matches!(self.peek(), '+' | '-') {
                self.advance();
            }
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = &self.source[start.offset..self.offset];
        let literal = if is_float {
            text.parse::<f64>().ok().map(Literal::Float)
        } else {
            text.parse::<i64>().ok().map(Literal::Number)
        };
        literal.ok_or_else(|| ParseError::new(format!("Invalid number: '{text}'"), start))
    }

    fn parse_word(&mut self) -> String {
        let start = self.offset;
        while self.peek().is_alphanumeric() {
            self.advance();
        }
        self.source[start..self.offset].to_string()
    }

    // =========================================================================
    // Cursor helpers
    // =========================================================================

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if let Some(&ch) = self.chars.get(self.pos) {
            self.pos += 1;
            self.offset += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn current_pos(&self) -> Pos {
        Pos::new(self.line, self.column, self.offset).with_shared_filename(self.filename.clone())
    }

    fn expected(&self, what: &str) -> ParseError {
        let found = if self.is_at_end() {
            "end of file".to_string()
        } else {
            format!("'{}'", self.peek())
        };
        self.error(format!("Expected {what}, found {found}"))
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current_pos())
    }

    /// Step into an object or array sitting at the cursor.
    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth == MAX_NESTING_DEPTH {
            return Err(self.error(format!(
                "Nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}"
            )));
        }
        self.depth += 1;
        Ok(())
    }
}

// =========================================================================
// Block folding
// =========================================================================

fn flatten_node(node: Node) -> Node {
    let kind = match node.kind {
        NodeKind::Object(list) => NodeKind::Object(flatten_list(list)),
        NodeKind::List(elements) => NodeKind::List(elements.into_iter().map(flatten_node).collect()),
        literal => literal,
    };
    Node::new(kind, node.pos)
}

fn flatten_list(list: ObjectList) -> ObjectList {
    let mut items = Vec::with_capacity(list.items.len());
    for item in list.items {
        flatten_item(item, &mut items);
    }
    ObjectList { items }
}

/// Push `item` onto `out`, expanded into one item per nested block.
fn flatten_item(item: ObjectItem, out: &mut Vec<ObjectItem>) {
    let ObjectItem { keys, value, pos } = item;

    match value.kind {
        NodeKind::Object(list) if is_block_body(&list) => {
            for inner in list.items {
                let mut inner_keys = keys.clone();
                inner_keys.extend(inner.keys);
                let folded = ObjectItem {
                    keys: inner_keys,
                    value: inner.value,
                    pos: pos.clone(),
                };
                flatten_item(folded, out);
            }
        }
        NodeKind::List(elements) if is_block_list(&elements) => {
            for element in elements {
                let repeated = ObjectItem {
                    keys: keys.clone(),
                    value: element,
                    pos: pos.clone(),
                };
                flatten_item(repeated, out);
            }
        }
        kind => out.push(ObjectItem {
            keys,
            value: flatten_node(Node::new(kind, value.pos)),
            pos,
        }),
    }
}

fn is_block_body(list: &ObjectList) -> bool {
    !list.is_empty()
        && list
            .items
            .iter()
            .all(|item| matches!(item.value.kind, NodeKind::Object(_)))
}

fn is_block_list(elements: &[Node]) -> bool {
    !elements.is_empty()
        && elements
            .iter()
            .all(|element| matches!(element.kind, NodeKind::Object(_)))
}
