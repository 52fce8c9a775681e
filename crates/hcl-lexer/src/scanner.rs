use std::iter::FusedIterator;
use std::sync::Arc;

use hcl_span::Pos;

use crate::token::{Token, TokenKind};
use crate::LexerError;

/// HCL source scanner.
///
/// A pull-based tokenizer: each call to [`Scanner::next_token`] (or
/// `Iterator::next`) scans exactly one token. The iterator yields a final
/// `Eof` token and is exhausted afterwards, or right after the first error.
///
/// - `Vec<char>` source for index-based navigation
/// - Byte offset, line and column tracked on every advance
/// - Comments discarded unless [`Scanner::keep_comments`] is set
pub struct Scanner<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
    filename: Option<Arc<str>>,
    keep_comments: bool,
    finished: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            filename: None,
            keep_comments: false,
            finished: false,
        }
    }

    /// Stamp every token position with `filename`.
    pub fn with_filename(mut self, filename: impl AsRef<str>) -> Self {
        self.filename = Pos::start().with_filename(filename).filename;
        self
    }

    /// Emit `Comment` tokens instead of discarding them.
    pub fn keep_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }

    /// Tokenize the entire source into a vector of tokens ending in `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
        Scanner::new(source).collect()
    }

    /// Scan the next token. Returns `Eof` repeatedly once the input is used up.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        loop {
            self.skip_whitespace();
            let start = self.current_pos();

            if self.is_at_end() {
                return Ok(Token::new(TokenKind::Eof, "", start));
            }

            let token = self.scan_token(start)?;
            if matches!(token.kind, TokenKind::Comment(_)) && !self.keep_comments {
                continue;
            }

            tracing::trace!(kind = token.kind.name(), pos = %token.pos, "scanned token");
            return Ok(token);
        }
    }

    fn scan_token(&mut self, start: Pos) -> Result<Token, LexerError> {
        let ch = self.peek();

        match ch {
            // Comments
            '#' => Ok(self.scan_line_comment(start)),
            '/' if self.peek_next() == '/' => Ok(self.scan_line_comment(start)),
            '/' if self.peek_next() == '*' => self.scan_block_comment(start),

            // Strings
            '"' => self.scan_string(start),
            '<' if self.peek_next() == '<' => self.scan_heredoc(start),

            // Numbers
            '0'..='9' => self.scan_number(start),
            '-' if self.peek_next().is_ascii_digit() => self.scan_number(start),

            // Identifiers and booleans
            c if c.is_alphabetic() || c == '_' => Ok(self.scan_identifier(start)),

            // Punctuation
            '[' => Ok(self.single(TokenKind::LBrack, start)),
            ']' => Ok(self.single(TokenKind::RBrack, start)),
            '{' => Ok(self.single(TokenKind::LBrace, start)),
            '}' => Ok(self.single(TokenKind::RBrace, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            '.' => Ok(self.single(TokenKind::Period, start)),
            '=' => Ok(self.single(TokenKind::Assign, start)),
            '+' => Ok(self.single(TokenKind::Add, start)),
            '-' => Ok(self.single(TokenKind::Sub, start)),

            _ => Err(LexerError {
                message: format!("Unexpected character: '{ch}'"),
                pos: start,
            }),
        }
    }

    // --- Comments ---

    /// Scan a `#` or `//` comment up to (not including) the line break.
    fn scan_line_comment(&mut self, start: Pos) -> Token {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
        let text = self.slice_from(&start);
        let text = text.strip_suffix('\r').unwrap_or(text);
        Token::new(TokenKind::Comment(text.to_string()), text, start)
    }

    /// Scan a `/* ... */` comment. Block comments do not nest.
    fn scan_block_comment(&mut self, start: Pos) -> Result<Token, LexerError> {
        self.advance();
        self.advance();

        loop {
            if self.is_at_end() {
                return Err(LexerError {
                    message: "Unterminated comment".into(),
                    pos: start,
                });
            }
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }

        let text = self.slice_from(&start).to_string();
        Ok(self.token(TokenKind::Comment(text), start))
    }

    // --- Strings ---

    /// Scan a double-quoted string.
    ///
    /// Escapes are decoded outside interpolations. Inside `${ ... }` the text
    /// is kept verbatim and quotes or line breaks do not end the string, so
    /// `"${lookup(var.m, "k")}"` is one token.
    fn scan_string(&mut self, start: Pos) -> Result<Token, LexerError> {
        self.advance(); // consume opening quote

        let mut value = String::new();
        let mut braces = 0usize;

        loop {
            if self.is_at_end() || (braces == 0 && self.peek() == '\n') {
                return Err(LexerError {
                    message: "Unterminated string".into(),
                    pos: start,
                });
            }

            let ch = self.peek();
            match ch {
                '"' if braces == 0 => {
                    self.advance();
                    break;
                }
                '$' if braces == 0 && self.peek_next() == '{' => {
                    braces += 1;
                    value.push_str("${");
                    self.advance();
                    self.advance();
                }
                '{' if braces > 0 => {
                    braces += 1;
                    value.push(ch);
                    self.advance();
                }
                '}' if braces > 0 => {
                    braces -= 1;
                    value.push(ch);
                    self.advance();
                }
                '\\' if braces == 0 => {
                    let decoded = self.scan_escape()?;
                    value.push(decoded);
                }
                '\\' => {
                    // Interpolated text is decoded by the expression parser.
                    value.push(ch);
                    self.advance();
                    if !self.is_at_end() {
                        value.push(self.peek());
                        self.advance();
                    }
                }
                _ => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Ok(self.token(TokenKind::String(value), start))
    }

    /// Decode one escape sequence starting at the backslash.
    fn scan_escape(&mut self) -> Result<char, LexerError> {
        let escape_pos = self.current_pos();
        self.advance(); // consume backslash

        if self.is_at_end() {
            return Err(LexerError {
                message: "Unterminated escape sequence".into(),
                pos: escape_pos,
            });
        }

        let ch = self.peek();
        self.advance();

        let decoded = match ch {
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            '\\' => '\\',
            '"' => '"',
            '0'..='7' => {
                let mut value = ch.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    let digit = self.peek().to_digit(8).ok_or_else(|| LexerError {
                        message: "Invalid octal escape sequence".into(),
                        pos: escape_pos.clone(),
                    })?;
                    value = value * 8 + digit;
                    self.advance();
                }
                if value > 0xff {
                    return Err(LexerError {
                        message: "Octal escape sequence out of range".into(),
                        pos: escape_pos,
                    });
                }
                self.code_point(value, escape_pos)?
            }
            'x' => self.scan_hex_escape(2, escape_pos)?,
            'u' => self.scan_hex_escape(4, escape_pos)?,
            'U' => self.scan_hex_escape(8, escape_pos)?,
            _ => {
                return Err(LexerError {
                    message: format!("Invalid escape sequence: '\\{ch}'"),
                    pos: escape_pos,
                })
            }
        };

        Ok(decoded)
    }

    fn scan_hex_escape(&mut self, digits: usize, escape_pos: Pos) -> Result<char, LexerError> {
        let mut value = 0u32;
        for _ in 0..digits {
            let digit = self.peek().to_digit(16).ok_or_else(|| LexerError {
                message: format!("Escape sequence expects {digits} hexadecimal digits"),
                pos: escape_pos.clone(),
            })?;
            value = value * 16 + digit;
            self.advance();
        }
        self.code_point(value, escape_pos)
    }

    fn code_point(&self, value: u32, escape_pos: Pos) -> Result<char, LexerError> {
        char::from_u32(value).ok_or_else(|| LexerError {
            message: format!("Escape sequence is not a valid Unicode code point: {value:#x}"),
            pos: escape_pos,
        })
    }

    /// Scan a heredoc:
    /// ```text
    /// <<EOF          <<-EOF
    /// text             indented text
    /// EOF              EOF
    /// ```
    /// The body ends at the first line holding only the anchor (surrounding
    /// whitespace allowed). `<<-` removes the terminator line's indentation
    /// from every body line, provided all of them start with it.
    fn scan_heredoc(&mut self, start: Pos) -> Result<Token, LexerError> {
        let source = self.source;

        self.advance(); // consume `<<`
        self.advance();

        let indented = self.peek() == '-';
        if indented {
            self.advance();
        }

        if !(self.peek().is_alphabetic() || self.peek() == '_') {
            return Err(self.error("Heredoc expects an anchor identifier after '<<'".into()));
        }

        let anchor_start = self.offset;
        while self.peek().is_alphanumeric() || self.peek() == '_' || self.peek() == '-' {
            self.advance();
        }
        let anchor = &source[anchor_start..self.offset];

        if self.peek() == '\r' && self.peek_next() == '\n' {
            self.advance();
        }
        if self.peek() != '\n' {
            return Err(self.error(format!(
                "Heredoc anchor '{anchor}' must be followed by a line break"
            )));
        }
        self.advance();

        let mut lines = Vec::new();
        let terminator_indent = loop {
            if self.is_at_end() {
                return Err(LexerError {
                    message: format!("Unterminated heredoc, expected closing '{anchor}'"),
                    pos: start,
                });
            }

            let line_start = self.offset;
            while !self.is_at_end() && self.peek() != '\n' {
                self.advance();
            }
            let line = &source[line_start..self.offset];
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.trim() == anchor {
                break &line[..line.len() - line.trim_start().len()];
            }

            lines.push(line);
            self.advance(); // consume newline (no-op at end of input)
        };

        let value = if indented {
            unindent(&lines, terminator_indent)
        } else {
            lines.iter().map(|line| format!("{line}\n")).collect()
        };

        Ok(self.token(TokenKind::Heredoc(value), start))
    }

    // --- Numbers and identifiers ---

    /// Scan an integer (decimal, `0x` hex or leading-zero octal) or a float.
    /// A leading `-` is part of the literal.
    fn scan_number(&mut self, start: Pos) -> Result<Token, LexerError> {
        let negative = self.peek() == '-';
        if negative {
            self.advance();
        }

        if self.peek() == '0' && matches!(self.peek_next(), 'x' | 'X') {
            self.advance();
            self.advance();
            let digits_start = self.offset;
            while self.peek().is_ascii_hexdigit() {
                self.advance();
            }
            let digits = &self.source[digits_start..self.offset];
            let value = i64::from_str_radix(digits, 16).map_err(|_| self.invalid_number(&start))?;
            let value = if negative { -value } else { value };
            return Ok(self.token(TokenKind::Number(value), start));
        }

        let digits_start = self.offset;
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let digits_end = self.offset;

        let mut is_float = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        if matches!(self.peek(), 'e' | 'E') {
            let signed = matches!(self.peek_next(), '+' | '-') && self.peek_at(2).is_ascii_digit();
            if signed || self.peek_next().is_ascii_digit() {
                is_float = true;
                self.advance();
                if signed {
                    self.advance();
                }
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        let text = self.slice_from(&start);
        let kind = if is_float {
            text.parse::<f64>().map(TokenKind::Float).ok()
        } else {
            let digits = &self.source[digits_start..digits_end];
            let value = if digits.len() > 1 && digits.starts_with('0') {
                i64::from_str_radix(digits, 8)
                    .ok()
                    .map(|v| if negative { -v } else { v })
            } else {
                text.parse::<i64>().ok()
            };
            value.map(TokenKind::Number)
        };

        match kind {
            Some(kind) => Ok(self.token(kind, start)),
            None => Err(self.invalid_number(&start)),
        }
    }

    /// Scan an identifier. Identifiers may contain `-` and `.` after the
    /// first character, so `aws_instance.web-1.id` is a single token.
    fn scan_identifier(&mut self, start: Pos) -> Token {
        while {
            let c = self.peek();
            c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
        } {
            self.advance();
        }

        let kind = match self.slice_from(&start) {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            text => TokenKind::Ident(text.to_string()),
        };
        self.token(kind, start)
    }

    // --- Helpers ---

    fn single(&mut self, kind: TokenKind, start: Pos) -> Token {
        self.advance();
        self.token(kind, start)
    }

    fn token(&self, kind: TokenKind, start: Pos) -> Token {
        let text = self.slice_from(&start);
        Token::new(kind, text, start)
    }

    fn slice_from(&self, start: &Pos) -> &'a str {
        &self.source[start.offset..self.offset]
    }

    fn current_pos(&self) -> Pos {
        Pos::new(self.line, self.column, self.offset).with_shared_filename(self.filename.clone())
    }

    fn invalid_number(&self, start: &Pos) -> LexerError {
        LexerError {
            message: format!("Invalid number: '{}'", self.slice_from(start)),
            pos: start.clone(),
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
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

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            pos: self.current_pos(),
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, LexerError>;

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

/// Strip `indent` from every line when all lines carry it; otherwise keep
/// the body as written.
fn unindent(lines: &[&str], indent: &str) -> String {
    let all_indented = lines
        .iter()
        .all(|line| line.starts_with(indent) || line.trim().is_empty());

    lines
        .iter()
        .map(|line| {
            let line = if all_indented {
                line.strip_prefix(indent).unwrap_or_else(|| line.trim_start())
            } else {
                line
            };
            format!("{line}\n")
        })
        .collect()
}
