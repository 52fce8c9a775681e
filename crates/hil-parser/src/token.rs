use hcl_span::Pos;

/// Token classification for interpolation templates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenKind {
    // Template structure
    Literal(String),
    Begin,  // ${
    End,    // } closing an interpolation
    OQuote, // " opening a string inside an expression
    CQuote, // " closing it

    // Literals (carry data)
    Identifier(String),
    Integer(i64),
    Float(f64),
    Bool(bool),

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,

    // Logical
    And,
    Or,
    Not,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Punctuation
    Comma,
    Question,
    Colon,
    Assign,

    // End of input
    Eof,
}

impl TokenKind {
    /// Human-readable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Literal(_) => "literal text",
            TokenKind::Begin => "'${'",
            TokenKind::End => "'}'",
            TokenKind::OQuote => "opening quote",
            TokenKind::CQuote => "closing quote",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Integer(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::Bool(_) => "bool",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Eq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Lte => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Gte => "'>='",
            TokenKind::And => "'&&'",
            TokenKind::Or => "'||'",
            TokenKind::Not => "'!'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Question => "'?'",
            TokenKind::Colon => "':'",
            TokenKind::Assign => "'='",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A token produced by the template scanner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text of the token (empty for `Eof`).
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

    /// Describe the token for error messages, e.g. `identifier foo`.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Identifier(_)
            | TokenKind::Integer(_)
            | TokenKind::Float(_)
            | TokenKind::Bool(_) => format!("{} {}", self.kind.name(), self.text),
            kind => kind.name().to_string(),
        }
    }
}
