//! Moded scanner for interpolation templates.
//!
//! The scanner keeps a stack of modes. Outside `${ }` it produces
//! `Literal` text; `${` enters expression mode, where braces are counted so
//! that map literals do not close the interpolation early; `"` inside an
//! expression enters a quoted string, which may itself contain `${ }`.
//!
//! ```text
//! Literal ──${──▶ Expression(1) ──{──▶ Expression(2)
//!    ▲                 │   ▲               │
//!    └────────}────────┘   └──────}────────┘
//!                      │
//!                      "──▶ Quoted ──${──▶ Expression(1) ...
//! ```

use std::iter::FusedIterator;

use hcl_span::Pos;

use crate::token::{Token, TokenKind};
use crate::ParseError;

#[derive(Debug, Clone)]
enum Mode {
    Literal,
    Expression { depth: usize, open: Pos },
    Quoted { open: Pos },
}

/// Template scanner.
///
/// Positions are reported relative to a caller-supplied start position, so
/// an expression embedded in a larger file reports file coordinates: the
/// first line is shifted by `start.column - 1`, later lines are not.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
    start: Pos,
    modes: Vec<Mode>,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            start: Pos::start(),
            modes: vec![Mode::Literal],
            finished: false,
        }
    }

    /// Report positions relative to `start` (line, column and filename).
    pub fn with_start(mut self, start: Pos) -> Self {
        self.start = start;
        self
    }

    /// Tokenize the entire template into a vector ending in `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
        Scanner::new(source).collect()
    }

    /// Scan the next token. Returns `Eof` repeatedly once the input is used up.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        let token = match self.modes.last().cloned() {
            Some(Mode::Expression { open, .. }) => self.scan_expression(open)?,
            Some(Mode::Quoted { open }) => self.scan_quoted(open)?,
            Some(Mode::Literal) | None => self.scan_literal(),
        };

        tracing::trace!(kind = token.kind.name(), pos = %token.pos, "scanned template token");
        Ok(token)
    }

    // --- Literal text ---

    fn scan_literal(&mut self) -> Token {
        let start = self.current_pos();

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, "", start);
        }
        if self.at_interpolation() {
            return self.begin(start);
        }

        let mut value = String::new();
        while !self.is_at_end() && !self.at_interpolation() {
            if self.at_escaped_interpolation() {
                value.push_str("${");
                self.advance_n(3);
                continue;
            }
            value.push(self.peek());
            self.advance();
        }

        self.token(TokenKind::Literal(value), start)
    }

    // --- Quoted strings inside expressions ---

    fn scan_quoted(&mut self, open: Pos) -> Result<Token, ParseError> {
        let start = self.current_pos();

        if self.is_at_end() {
            return Err(ParseError::new("Unterminated string", open));
        }
        if self.peek() == '"' {
            self.advance();
            self.modes.pop();
            return Ok(self.token(TokenKind::CQuote, start));
        }
        if self.at_interpolation() {
            return Ok(self.begin(start));
        }

        let mut value = String::new();
        while !self.is_at_end() && self.peek() != '"' && !self.at_interpolation() {
            match self.peek() {
                '\\' => value.push(self.scan_escape(&open)?),
                '$' if self.at_escaped_interpolation() => {
                    value.push_str("${");
                    self.advance_n(3);
                }
                ch => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Ok(self.token(TokenKind::Literal(value), start))
    }

    fn scan_escape(&mut self, open: &Pos) -> Result<char, ParseError> {
        let escape_pos = self.current_pos();
        self.advance(); // consume backslash

        if self.is_at_end() {
            return Err(ParseError::new("Unterminated string", open.clone()));
        }

        let ch = self.peek();
        self.advance();
        match ch {
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            '"' => Ok('"'),
            '\\' => Ok('\\'),
            _ => Err(ParseError::new(
                format!("Invalid escape sequence: '\\{ch}'"),
                escape_pos,
            )),
        }
    }

    // --- Expression tokens ---

    fn scan_expression(&mut self, open: Pos) -> Result<Token, ParseError> {
        self.skip_whitespace();
        let start = self.current_pos();

        if self.is_at_end() {
            return Err(ParseError::new(
                "Unterminated interpolation, expected closing '}'",
                open,
            ));
        }

        let ch = self.peek();
        let next = self.peek_next();
        let kind = match ch {
            '}' => {
                self.advance();
                self.close_brace()
            }
            '{' => {
                self.advance();
                if let Some(Mode::Expression { depth, .. }) = self.modes.last_mut() {
                    *depth += 1;
                }
                TokenKind::LBrace
            }
            '"' => {
                self.advance();
                self.modes.push(Mode::Quoted { open: start.clone() });
                TokenKind::OQuote
            }

            '0'..='9' => return self.scan_number(start),
            c if c.is_alphabetic() || c == '_' => return Ok(self.scan_identifier(start)),

            // Two-character operators
            '&' if next == '&' => self.operator(2, TokenKind::And),
            '|' if next == '|' => self.operator(2, TokenKind::Or),
            '=' if next == '=' => self.operator(2, TokenKind::Eq),
            '!' if next == '=' => self.operator(2, TokenKind::NotEq),
            '<' if next == '=' => self.operator(2, TokenKind::Lte),
            '>' if next == '=' => self.operator(2, TokenKind::Gte),

            // Single-character tokens
            '+' => self.operator(1, TokenKind::Plus),
            '-' => self.operator(1, TokenKind::Minus),
            '*' => self.operator(1, TokenKind::Star),
            '/' => self.operator(1, TokenKind::Slash),
            '%' => self.operator(1, TokenKind::Percent),
            '!' => self.operator(1, TokenKind::Not),
            '<' => self.operator(1, TokenKind::Lt),
            '>' => self.operator(1, TokenKind::Gt),
            '=' => self.operator(1, TokenKind::Assign),
            '(' => self.operator(1, TokenKind::LParen),
            ')' => self.operator(1, TokenKind::RParen),
            '[' => self.operator(1, TokenKind::LBracket),
            ']' => self.operator(1, TokenKind::RBracket),
            ',' => self.operator(1, TokenKind::Comma),
            '?' => self.operator(1, TokenKind::Question),
            ':' => self.operator(1, TokenKind::Colon),

            _ => {
                return Err(ParseError::new(
                    format!("Unexpected character: '{ch}'"),
                    start,
                ))
            }
        };

        Ok(self.token(kind, start))
    }

    /// `}` closes a nested brace, or the interpolation itself at depth 1.
    fn close_brace(&mut self) -> TokenKind {
        if let Some(Mode::Expression { depth, .. }) = self.modes.last_mut() {
            if *depth > 1 {
                *depth -= 1;
                return TokenKind::RBrace;
            }
        }

        self.modes.pop();
        tracing::trace!(depth = self.modes.len(), "leaving interpolation");
        TokenKind::End
    }

    /// Scan an integer or a float (`1.5`). Signs are unary operators.
    fn scan_number(&mut self, start: Pos) -> Result<Token, ParseError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.slice_from(&start);
        let kind = if is_float {
            text.parse::<f64>().ok().map(TokenKind::Float)
        } else {
            text.parse::<i64>().ok().map(TokenKind::Integer)
        };

        match kind {
            Some(kind) => Ok(self.token(kind, start)),
            None => Err(ParseError::new(format!("Invalid number: '{text}'"), start)),
        }
    }

    /// Scan a variable path or function name. After the first character,
    /// `-` and `.` are allowed, and `*` directly after a `.` (`aws.*.id`).
    fn scan_identifier(&mut self, start: Pos) -> Token {
        loop {
            let c = self.peek();
            let splat = c == '*' && self.previous() == '.';
            if !(c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || splat) {
                break;
            }
            self.advance();
        }

        let kind = match self.slice_from(&start) {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            text => TokenKind::Identifier(text.to_string()),
        };
        self.token(kind, start)
    }

    // --- Helpers ---

    fn begin(&mut self, start: Pos) -> Token {
        self.advance_n(2);
        self.modes.push(Mode::Expression {
            depth: 1,
            open: start.clone(),
        });
        tracing::trace!(depth = self.modes.len(), pos = %start, "entering interpolation");
        self.token(TokenKind::Begin, start)
    }

    fn operator(&mut self, len: usize, kind: TokenKind) -> TokenKind {
        self.advance_n(len);
        kind
    }

    fn token(&self, kind: TokenKind, start: Pos) -> Token {
        Token::new(kind, self.slice_from(&start), start)
    }

    fn slice_from(&self, start: &Pos) -> &'a str {
        &self.source[start.offset..self.offset]
    }

    /// Position in caller coordinates; the byte offset stays local.
    fn current_pos(&self) -> Pos {
        let line = self.start.line + self.line - 1;
        let column = if self.line == 1 {
            self.start.column + self.column - 1
        } else {
            self.column
        };
        Pos::new(line, column, self.offset).with_shared_filename(self.start.filename.clone())
    }

    fn at_interpolation(&self) -> bool {
        self.peek() == '$' && self.peek_next() == '{'
    }

    fn at_escaped_interpolation(&self) -> bool {
        self.peek() == '$' && self.peek_next() == '$' && self.peek_at(2) == '{'
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn previous(&self) -> char {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.chars.get(i))
            .copied()
            .unwrap_or('\0')
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_next(&self) -> char {
        self.peek_at(1)
    }

    fn peek_at(&self, n: usize) -> char {
        self.chars.get(self.pos + n).copied().unwrap_or('\0')
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

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.next_token();
        if matches!(&result, Ok(Token { kind: TokenKind::Eof, .. }) | Err(_)) {
            self.finished = true;
        }
        Some(result)
    }
}

impl FusedIterator for Scanner<'_> {}
