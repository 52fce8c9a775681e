use hcl_span::Pos;

/// Token classification for HCL source.
///
/// Data-carrying variants hold the decoded value (escapes processed,
/// numbers parsed); the raw source slice lives in [`Token::text`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenKind {
    // Literals (carry data)
    Ident(String),
    String(String),
    Heredoc(String),
    Number(i64),
    Float(f64),
    Bool(bool),
    Comment(String),

    // Punctuation
    LBrack, // [
    RBrack, // ]
    LBrace, // {
    RBrace, // }
    Comma,
    Period,
    Assign,

    // Operators
    Add,
    Sub,

    // End of input
    Eof,
}

impl TokenKind {
    /// Human-readable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::String(_) => "string",
            TokenKind::Heredoc(_) => "heredoc",
            TokenKind::Number(_) => "number",
            TokenKind::Float(_) => "float",
            TokenKind::Bool(_) => "bool",
            TokenKind::Comment(_) => "comment",
            TokenKind::LBrack => "'['",
            TokenKind::RBrack => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Period => "'.'",
            TokenKind::Assign => "'='",
            TokenKind::Add => "'+'",
            TokenKind::Sub => "'-'",
            TokenKind::Eof => "end of file",
        }
    }

    /// `true` for tokens that can stand alone as a value.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::String(_)
                | TokenKind::Heredoc(_)
                | TokenKind::Number(_)
                | TokenKind::Float(_)
                | TokenKind::Bool(_)
        )
    }
}

/// A token produced by the HCL scanner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub kind: TokenKind,
    /// The raw source text of the token (empty for `Eof`).
    pub text: String,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Pos) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// Describe the token for error messages, e.g. `identifier "foo"`.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(_)
            | TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::Float(_)
            | TokenKind::Bool(_) => format!("{} {}", self.kind.name(), self.text),
            kind => kind.name().to_string(),
        }
    }
}
