//! Expression parser for interpolation templates.
//!
//! Pulls tokens from the moded [`Scanner`] with one token of lookahead and
//! builds an [`Expr`] tree by recursive descent. Binary operators use
//! precedence climbing:
//!
//! ```text
//! template    = { LITERAL | "${" expr "}" }
//! expr        = binary [ "?" expr ":" expr ]
//! binary      = unary { binop unary }          (|| && == != < <= > >= + - * / %)
//! unary       = ( "!" | "-" ) unary | postfix
//! postfix     = primary { "[" expr "]" }
//! primary     = INTEGER | FLOAT | BOOL | string | IDENT [ call ]
//!             | "(" expr ")" | list | map
//! string      = '"' template '"'
//! call        = "(" [ expr { "," expr } ] ")"
//! list        = "[" [ expr { "," expr } [","] ] "]"
//! map         = "{" [ entry { "," entry } [","] ] "}"
//! entry       = ( IDENT | string ) ( "=" | ":" ) expr
//! ```

use hcl_span::Pos;

use crate::ast::{BinaryOp, Expr, ExprKind, Literal, MapEntry, UnaryOp, VariableRef};
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::{ParseError, MAX_NESTING_DEPTH};

/// Interpolation expression parser.
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

    /// Parse a template with positions starting at 1:1.
    pub fn parse(source: &str) -> Result<Expr, ParseError> {
        Self::parse_with_position(source, Pos::start())
    }

    /// Parse a template whose first character sits at `start` in some
    /// enclosing file. Lines and columns (and the filename) of every node
    /// and error are reported relative to it.
    pub fn parse_with_position(source: &str, start: Pos) -> Result<Expr, ParseError> {
        tracing::debug!(bytes = source.len(), start = %start, "parsing interpolation template");

        let result = Parser::new(Scanner::new(source).with_start(start.clone()))
            .and_then(|mut parser| parser.parse_template(TokenKind::Eof, start));

        if let Err(e) = &result {
            tracing::debug!(error = %e, "interpolation template rejected");
        }
        result
    }

    // =========================================================================
    // Templates
    // =========================================================================

    /// Parse literal text and interpolations up to `until` (not consumed).
    ///
    /// Text alone becomes a single string literal, nothing at all an empty
    /// one; anything with an interpolation becomes a `Concat`.
    fn parse_template(&mut self, until: TokenKind, pos: Pos) -> Result<Expr, ParseError> {
        let mut parts = Vec::new();

        while self.tok.kind != until {
            match self.tok.kind {
                TokenKind::Literal(_) => {
                    let tok = self.bump()?;
                    if let TokenKind::Literal(text) = tok.kind {
                        parts.push(Expr::new(ExprKind::Literal(Literal::String(text)), tok.pos));
                    }
                }
                TokenKind::Begin => parts.push(self.parse_interpolation()?),
                _ => return Err(self.unexpected("text or '${'")),
            }
        }

        let is_plain_text = matches!(
            parts.as_slice(),
            [Expr { kind: ExprKind::Literal(_), .. }]
        );
        let expr = match parts.len() {
            0 => Expr::new(ExprKind::Literal(Literal::String(String::new())), pos),
            1 if is_plain_text => parts.remove(0),
            _ => Expr::new(ExprKind::Concat(parts), pos),
        };
        Ok(expr)
    }

    /// `${ expr }`
    fn parse_interpolation(&mut self) -> Result<Expr, ParseError> {
        self.bump()?; // consume `${`

        if self.tok.kind == TokenKind::End {
            return Err(self.error("Empty interpolation, expected an expression".into()));
        }

        let expr = self.parse_expr()?;
        if self.tok.kind != TokenKind::End {
            return Err(self.error(format!(
                "Expected '}}' to close interpolation, found {}",
                self.tok.describe()
            )));
        }
        self.bump()?;

        Ok(expr)
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// Conditional: the lowest precedence level.
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let condition = self.parse_binary(1)?;

        if self.tok.kind != TokenKind::Question {
            self.depth -= 1;
            return Ok(condition);
        }
        self.bump()?;

        let then = self.parse_expr()?;
        self.expect(TokenKind::Colon, "in conditional expression")?;
        let otherwise = self.parse_expr()?;
        self.depth -= 1;

        let pos = condition.pos.clone();
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            pos,
        ))
    }

    /// Precedence climbing over binary operators; all are left-associative.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = binary_op(&self.tok.kind) {
            if op.precedence() < min_precedence {
                break;
            }
            self.bump()?;

            let right = self.parse_binary(op.precedence() + 1)?;
            let pos = left.pos.clone();
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                pos,
            );
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.tok.kind {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };

        self.enter()?;
        let tok = self.bump()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            tok.pos,
        ))
    }

    /// Chained indexing: `a[0][1]`.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        while self.tok.kind == TokenKind::LBracket {
            self.bump()?;
            let key = self.parse_expr()?;
            self.expect(TokenKind::RBracket, "to close index")?;

            let pos = expr.pos.clone();
            expr = Expr::new(
                ExprKind::Index {
                    target: Box::new(expr),
                    key: Box::new(key),
                },
                pos,
            );
        }

        Ok(expr)
    }

    // =========================================================================
    // Primary expressions
    // =========================================================================

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let literal = match self.tok.kind {
            TokenKind::Integer(n) => Literal::Integer(n),
            TokenKind::Float(f) => Literal::Float(f),
            TokenKind::Bool(b) => Literal::Bool(b),
            TokenKind::OQuote => return self.parse_string(),
            TokenKind::Identifier(_) => return self.parse_identifier(),
            TokenKind::LParen => {
                let open = self.bump()?;
                let mut expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "to close group")?;
                expr.pos = open.pos;
                return Ok(expr);
            }
            TokenKind::LBracket => return self.parse_list(),
            TokenKind::LBrace => return self.parse_map(),
            _ => return Err(self.unexpected("expression")),
        };

        let tok = self.bump()?;
        Ok(Expr::new(ExprKind::Literal(literal), tok.pos))
    }

    /// `"text ${expr} text"`
    fn parse_string(&mut self) -> Result<Expr, ParseError> {
        let open = self.bump()?;
        let expr = self.parse_template(TokenKind::CQuote, open.pos)?;
        self.bump()?; // consume closing quote
        Ok(expr)
    }

    /// Variable reference or function call.
    fn parse_identifier(&mut self) -> Result<Expr, ParseError> {
        let tok = self.bump()?;
        let TokenKind::Identifier(name) = tok.kind else {
            return Err(ParseError::new("Expected identifier", tok.pos));
        };

        if self.tok.kind != TokenKind::LParen {
            return Ok(Expr::new(ExprKind::Variable(VariableRef { name }), tok.pos));
        }
        self.bump()?;

        let mut args = Vec::new();
        if self.tok.kind != TokenKind::RParen {
            loop {
                args.push(self.parse_expr()?);
                match self.tok.kind {
                    TokenKind::Comma => {
                        self.bump()?;
                    }
                    TokenKind::RParen => break,
                    _ => {
                        return Err(self.error(format!(
                            "Expected ',' or ')' in call to '{name}', found {}",
                            self.tok.describe()
                        )))
                    }
                }
            }
        }
        self.bump()?; // consume `)`

        Ok(Expr::new(ExprKind::Call { name, args }, tok.pos))
    }

    /// `[a, b]`, trailing comma allowed.
    fn parse_list(&mut self) -> Result<Expr, ParseError> {
        let open = self.bump()?;
        let mut elements = Vec::new();

        while self.tok.kind != TokenKind::RBracket {
            elements.push(self.parse_expr()?);
            match self.tok.kind {
                TokenKind::Comma => {
                    self.bump()?;
                }
                TokenKind::RBracket => break,
                _ => {
                    return Err(self.error(format!(
                        "Expected ',' or ']' in list, found {}",
                        self.tok.describe()
                    )))
                }
            }
        }
        self.bump()?;

        Ok(Expr::new(ExprKind::List(elements), open.pos))
    }

    /// `{ key = value, "key": value }`, trailing comma allowed.
    fn parse_map(&mut self) -> Result<Expr, ParseError> {
        let open = self.bump()?;
        let mut entries = Vec::new();

        while self.tok.kind != TokenKind::RBrace {
            entries.push(self.parse_map_entry()?);
            match self.tok.kind {
                TokenKind::Comma => {
                    self.bump()?;
                }
                TokenKind::RBrace => break,
                _ => {
                    return Err(self.error(format!(
                        "Expected ',' or '}}' in map, found {}",
                        self.tok.describe()
                    )))
                }
            }
        }
        self.bump()?;

        Ok(Expr::new(ExprKind::Map(entries), open.pos))
    }

    fn parse_map_entry(&mut self) -> Result<MapEntry, ParseError> {
        let pos = self.tok.pos.clone();
        let key = match &self.tok.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.bump()?;
                name
            }
            TokenKind::OQuote => match self.parse_string()?.kind {
                ExprKind::Literal(Literal::String(text)) => text,
                _ => {
                    return Err(ParseError::new(
                        "Map keys must be plain strings without interpolation",
                        pos,
                    ))
                }
            },
            _ => return Err(self.unexpected("map key")),
        };

        if !matches!(self.tok.kind, TokenKind::Assign | TokenKind::Colon) {
            return Err(self.error(format!(
                "Expected '=' or ':' after map key '{key}', found {}",
                self.tok.describe()
            )));
        }
        self.bump()?;

        let value = self.parse_expr()?;
        Ok(MapEntry { key, value, pos })
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    /// Consume the current token and return it, pulling the next one.
    fn bump(&mut self) -> Result<Token, ParseError> {
        let next = self.scanner.next_token()?;
        Ok(std::mem::replace(&mut self.tok, next))
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token, ParseError> {
        if self.tok.kind == kind {
            self.bump()
        } else {
            Err(self.error(format!(
                "Expected {} {context}, found {}",
                kind.name(),
                self.tok.describe()
            )))
        }
    }

    /// Step one level deeper, failing at the current token once the
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

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Lte => BinaryOp::Lte,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Gte => BinaryOp::Gte,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Render an expression as a compact S-expression for assertions.
    fn show(expr: &Expr) -> String {
        let join = |items: &[Expr]| items.iter().map(show).collect::<Vec<_>>().join(" ");
        match &expr.kind {
            ExprKind::Literal(Literal::String(s)) => format!("{s:?}"),
            ExprKind::Literal(Literal::Integer(n)) => n.to_string(),
            ExprKind::Literal(Literal::Float(f)) => format!("{f:?}"),
            ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
            ExprKind::Variable(var) => var.name.clone(),
            ExprKind::Call { name, args } => format!("({name} {})", join(args)),
            ExprKind::Index { target, key } => format!("(index {} {})", show(target), show(key)),
            ExprKind::Binary { op, left, right } => {
                format!("({} {} {})", op.symbol(), show(left), show(right))
            }
            ExprKind::Unary { op, operand } => format!("({} {})", op.symbol(), show(operand)),
            ExprKind::Conditional {
                condition,
                then,
                otherwise,
            } => format!("(? {} {} {})", show(condition), show(then), show(otherwise)),
            ExprKind::List(items) => format!("[{}]", join(items)),
            ExprKind::Map(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|e| format!("{}={}", e.key, show(&e.value)))
                    .collect();
                format!("{{{}}}", entries.join(" "))
            }
            ExprKind::Concat(parts) => format!("(concat {})", join(parts)),
        }
    }

    fn parse(source: &str) -> Expr {
        Parser::parse(source).unwrap()
    }

    /// Parse `${source}` and return the single interpolated expression.
    fn interp(source: &str) -> String {
        match parse(&format!("${{{source}}}")).kind {
            ExprKind::Concat(parts) if parts.len() == 1 => show(&parts[0]),
            other => panic!("Expected a single interpolation, got {other:?}"),
        }
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::parse(source).unwrap_err()
    }

    fn err_at(err: &ParseError) -> (usize, usize) {
        err.pos.as_ref().expect("error should have a position").line_column()
    }

    // =========================================================================
    // Templates
    // =========================================================================

    #[test]
    fn test_empty_template() {
        let expr = parse("");
        assert_eq!(expr.kind, ExprKind::Literal(Literal::String(String::new())));
        assert_eq!(expr.pos, Pos::start());
    }

    #[test]
    fn test_plain_text_is_single_literal() {
        assert_eq!(show(&parse("just text")), "\"just text\"");
    }

    #[test]
    fn test_escaped_interpolation_is_text() {
        assert_eq!(show(&parse("cost: $${price}")), "\"cost: ${price}\"");
    }

    #[test]
    fn test_concat_of_text_and_interpolations() {
        assert_eq!(
            show(&parse("web-${var.env}-${count.index}")),
            "(concat \"web-\" var.env \"-\" count.index)"
        );
    }

    #[test]
    fn test_single_interpolation_is_concat() {
        assert_eq!(show(&parse("${var.region}")), "(concat var.region)");
    }

    // =========================================================================
    // Operators and precedence
    // =========================================================================

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(interp("1 + 2 * 3"), "(+ 1 (* 2 3))");
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(interp("10 - 4 - 3"), "(- (- 10 4) 3)");
        assert_eq!(interp("8 / 4 % 3"), "(% (/ 8 4) 3)");
    }

    #[test]
    fn test_parentheses_group() {
        assert_eq!(interp("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    }

    #[test]
    fn test_logical_and_comparison_levels() {
        assert_eq!(
            interp("a || b && c == d"),
            "(|| a (&& b (== c d)))"
        );
        assert_eq!(interp("a < b == c >= d"), "(== (< a b) (>= c d))");
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(interp("!a && -b < 0"), "(&& (! a) (< (- b) 0))");
        assert_eq!(interp("!!true"), "(! (! true))");
    }

    #[test]
    fn test_conditional_lowest_precedence() {
        assert_eq!(
            interp("a == 1 ? \"x\" : b || c"),
            "(? (== a 1) \"x\" (|| b c))"
        );
    }

    #[test]
    fn test_nested_conditional_is_right_associative() {
        assert_eq!(interp("a ? 1 : b ? 2 : 3"), "(? a 1 (? b 2 3))");
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(interp("1.5 * 2"), "(* 1.5 2)");
    }

    // =========================================================================
    // Variables, calls, indexing
    // =========================================================================

    #[test]
    fn test_splat_variable() {
        let expr = parse("${aws_instance.web.*.id}");
        let ExprKind::Concat(parts) = &expr.kind else {
            panic!("expected concat");
        };
        let ExprKind::Variable(var) = &parts[0].kind else {
            panic!("expected variable");
        };
        assert!(var.is_splat());
    }

    #[test]
    fn test_call_with_arguments() {
        assert_eq!(
            interp("lookup(var.map, \"key\", \"default\")"),
            "(lookup var.map \"key\" \"default\")"
        );
    }

    #[test]
    fn test_call_without_arguments() {
        assert_eq!(interp("timestamp()"), "(timestamp )");
    }

    #[test]
    fn test_nested_calls() {
        assert_eq!(
            interp("join(\",\", concat(a, [b, c]))"),
            "(join \",\" (concat a [b c]))"
        );
    }

    #[test]
    fn test_call_with_map_argument() {
        assert_eq!(interp("foo({a = 1})"), "(foo {a=1})");
    }

    #[test]
    fn test_chained_index() {
        assert_eq!(interp("var.list[0][i + 1]"), "(index (index var.list 0) (+ i 1))");
    }

    #[test]
    fn test_index_binds_tighter_than_unary() {
        assert_eq!(interp("-a[0]"), "(- (index a 0))");
    }

    // =========================================================================
    // Strings, lists, maps
    // =========================================================================

    #[test]
    fn test_quoted_string_with_interpolation() {
        assert_eq!(
            interp("upper(\"id-${var.n}\")"),
            "(upper (concat \"id-\" var.n))"
        );
    }

    #[test]
    fn test_quoted_string_escapes() {
        assert_eq!(interp(r#""a\"b\\c\td""#), r#""a\"b\\c\td""#);
    }

    #[test]
    fn test_empty_quoted_string() {
        assert_eq!(interp("\"\""), "\"\"");
    }

    #[test]
    fn test_list_literal() {
        assert_eq!(interp("[1, \"two\", [3],]"), "[1 \"two\" [3]]");
        assert_eq!(interp("[]"), "[]");
    }

    #[test]
    fn test_map_literal() {
        assert_eq!(
            interp("{a = 1, \"b\": [2], c = {d = true},}"),
            "{a=1 b=[2] c={d=true}}"
        );
        assert_eq!(interp("{}"), "{}");
    }

    #[test]
    fn test_map_keys_keep_order_and_duplicates() {
        let expr = parse("${{b = 1, a = 2, b = 3}}");
        let ExprKind::Concat(parts) = &expr.kind else {
            panic!("expected concat");
        };
        let ExprKind::Map(entries) = &parts[0].kind else {
            panic!("expected map");
        };
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "b"]);
    }

    // =========================================================================
    // Positions
    // =========================================================================

    #[test]
    fn test_node_positions() {
        let expr = parse("ab${x + y}");
        let ExprKind::Concat(parts) = &expr.kind else {
            panic!("expected concat");
        };
        assert_eq!(parts[0].pos, Pos::new(1, 1, 0));
        assert_eq!(parts[1].pos, Pos::new(1, 5, 4));
        let ExprKind::Binary { right, .. } = &parts[1].kind else {
            panic!("expected binary");
        };
        assert_eq!(right.pos, Pos::new(1, 9, 8));
    }

    #[test]
    fn test_positions_relative_to_start() {
        let start = Pos::new(5, 10, 0).with_filename("main.tf");
        let expr = Parser::parse_with_position("${a}\n${b}", start).unwrap();
        let ExprKind::Concat(parts) = &expr.kind else {
            panic!("expected concat");
        };
        assert_eq!(expr.pos.line_column(), (5, 10));
        assert_eq!(parts[0].pos.line_column(), (5, 12));
        assert_eq!(parts[2].pos.line_column(), (6, 3));
        assert_eq!(parts[2].pos.filename(), Some("main.tf"));
    }

    /// The single interpolated expression of `${source}`.
    fn interp_expr(source: &str) -> Expr {
        match parse(&format!("${{{source}}}")).kind {
            ExprKind::Concat(mut parts) if parts.len() == 1 => parts.remove(0),
            other => panic!("Expected a single interpolation, got {other:?}"),
        }
    }

    #[test]
    fn test_group_takes_open_paren_position() {
        let expr = interp_expr("(1 + 2) * 3");
        assert_eq!(expr.pos, Pos::new(1, 3, 2));
        let ExprKind::Binary { left, right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(left.pos, Pos::new(1, 3, 2));
        assert_eq!(right.pos, Pos::new(1, 13, 12));
    }

    #[test]
    fn test_group_as_right_operand_position() {
        let expr = interp_expr("x + (y)");
        let ExprKind::Binary { right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(right.pos.line_column(), (1, 7));
    }

    #[test]
    fn test_indexed_group_position() {
        let expr = interp_expr("(a)[0]");
        assert_eq!(show(&expr), "(index a 0)");
        assert_eq!(expr.pos.line_column(), (1, 3));
    }

    #[test]
    fn test_conditional_on_group_position() {
        let expr = interp_expr("(a) ? 1 : 2");
        assert_eq!(show(&expr), "(? a 1 2)");
        assert_eq!(expr.pos.line_column(), (1, 3));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_unterminated_interpolation() {
        let err = parse_err("\"${foo");
        assert!(err.message.starts_with("Unterminated interpolation"));
        assert_eq!(err_at(&err), (1, 2));
    }

    #[test]
    fn test_empty_interpolation() {
        let err = parse_err("${}");
        assert_eq!(err.message, "Empty interpolation, expected an expression");
        assert_eq!(err_at(&err), (1, 3));
    }

    #[test]
    fn test_error_offset_by_start_position() {
        let err = Parser::parse_with_position("${}", Pos::new(5, 10, 0)).unwrap_err();
        assert_eq!(err_at(&err), (5, 12));
    }

    #[test]
    fn test_error_on_later_line_ignores_start_column() {
        let err = Parser::parse_with_position("x\n  ${}", Pos::new(5, 10, 0)).unwrap_err();
        assert_eq!(err_at(&err), (6, 5));
    }

    #[test]
    fn test_trailing_tokens_in_interpolation() {
        let err = parse_err("${a b}");
        assert_eq!(err.message, "Expected '}' to close interpolation, found identifier b");
        assert_eq!(err_at(&err), (1, 5));
    }

    #[test]
    fn test_missing_operand() {
        let err = parse_err("${1 +}");
        assert_eq!(err.message, "Expected expression, found '}'");
        assert_eq!(err_at(&err), (1, 6));
    }

    #[test]
    fn test_call_trailing_comma_rejected() {
        let err = parse_err("${f(a,)}");
        assert_eq!(err.message, "Expected expression, found ')'");
    }

    #[test]
    fn test_call_missing_separator() {
        let err = parse_err("${f(a b)}");
        assert_eq!(err.message, "Expected ',' or ')' in call to 'f', found identifier b");
    }

    #[test]
    fn test_unclosed_index() {
        let err = parse_err("${a[0}");
        assert_eq!(err.message, "Expected ']' to close index, found '}'");
    }

    #[test]
    fn test_conditional_missing_colon() {
        let err = parse_err("${a ? b}");
        assert_eq!(err.message, "Expected ':' in conditional expression, found '}'");
    }

    #[test]
    fn test_interpolated_map_key_rejected() {
        let err = parse_err("${{\"${k}\" = 1}}");
        assert!(err.message.starts_with("Map keys must be plain strings"));
        assert_eq!(err_at(&err), (1, 4));
    }

    #[test]
    fn test_map_missing_assign() {
        let err = parse_err("${{a 1}}");
        assert_eq!(err.message, "Expected '=' or ':' after map key 'a', found integer 1");
    }

    #[test]
    fn test_lexical_error_surfaces() {
        let err = parse_err("${a # b}");
        assert_eq!(err.message, "Unexpected character: '#'");
        assert_eq!(err_at(&err), (1, 5));
    }

    // =========================================================================
    // Nesting limit
    // =========================================================================

    #[test]
    fn test_deep_groups_rejected() {
        let err = parse_err(&format!("${{{}1}}", "(".repeat(100_000)));
        assert_eq!(err.message, "Nesting exceeds the maximum depth of 128");
        assert_eq!(err_at(&err), (1, 3 + MAX_NESTING_DEPTH));
    }

    #[test]
    fn test_deep_unary_chain_rejected() {
        let err = parse_err(&format!("${{{}true}}", "!".repeat(100_000)));
        assert_eq!(err.message, "Nesting exceeds the maximum depth of 128");
    }

    #[test]
    fn test_deep_lists_rejected() {
        let err = parse_err(&format!("${{{}}}", "[".repeat(100_000)));
        assert_eq!(err.message, "Nesting exceeds the maximum depth of 128");
    }

    #[test]
    fn test_deep_nested_strings_rejected() {
        let err = parse_err(&"\"${".repeat(10_000));
        assert_eq!(err.message, "Nesting exceeds the maximum depth of 128");
    }

    #[test]
    fn test_moderate_nesting_accepted() {
        let src = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(interp(&src), "1");
    }

    // =========================================================================
    // Determinism
    // =========================================================================

    #[test]
    fn test_parsing_twice_is_identical() {
        let src = "${lookup(var.m, \"k\")[0] + 1 > 2 ? \"a-${b}\" : {x = [1]}}";
        assert_eq!(parse(src), parse(src));
    }
}
