//! Entry points for parsing HCL configuration and HIL templates.
//!
//! Two calls, each returning exactly one of an AST or a positioned error:
//!
//! - [`parse_config`] / [`parse_config_bytes`] for configuration documents
//! - [`parse_expression`] for `${ }` templates embedded in a document
//!
//! Hosts that need to marshal the results across a boundary can enable the
//! `serde` feature, which derives `Serialize` on every AST and error type.
//!
//! ```
//! use hclhil::{parse_config, parse_expression, PositionedError};
//!
//! let doc = parse_config("region = \"${var.region}\"").unwrap();
//! assert_eq!(doc.as_object().unwrap().len(), 1);
//!
//! let err = parse_expression("${}", 7, 3, "main.tf").unwrap_err();
//! assert_eq!(err.pos().unwrap().to_string(), "main.tf:3:9");
//! ```

pub use hcl_parser::{Literal as ConfigLiteral, Node, NodeKind, ObjectItem, ObjectKey, ObjectList};
pub use hcl_span::{Pos, PositionedError};
pub use hil_parser::{BinaryOp, Expr, ExprKind, Literal as ExprLiteral, MapEntry, UnaryOp, VariableRef};

/// Error from [`parse_config`] and [`parse_config_bytes`].
pub type ConfigParseError = hcl_parser::ParseError;

/// Error from [`parse_expression`].
pub type ExprParseError = hil_parser::ParseError;

/// Parse a configuration document (native HCL, or JSON when the first
/// non-blank character is `{`).
pub fn parse_config(text: &str) -> Result<Node, ConfigParseError> {
    hcl_parser::Parser::parse(text)
}

/// Parse a configuration document from raw bytes. Input that is not valid
/// UTF-8 fails with an error that has no position.
pub fn parse_config_bytes(bytes: &[u8]) -> Result<Node, ConfigParseError> {
    hcl_parser::Parser::parse_bytes(bytes)
}

/// Parse an interpolation template that starts at `line`:`column` (1-based)
/// of `filename`. An empty filename means none. Zero line or column values
/// are treated as 1.
pub fn parse_expression(
    text: &str,
    column: usize,
    line: usize,
    filename: &str,
) -> Result<Expr, ExprParseError> {
    let start = Pos::new(line.max(1), column.max(1), 0).with_filename(filename);
    hil_parser::Parser::parse_with_position(text, start)
}

/// Library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Configuration
    // =========================================================================

    #[test]
    fn test_empty_config() {
        let doc = parse_config("").unwrap();
        assert!(doc.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_keys_kept() {
        let doc = parse_config("a = 1\na = 2\n").unwrap();
        let root = doc.as_object().unwrap();
        assert_eq!(root.len(), 2);
        let values: Vec<&ConfigLiteral> = root
            .filter("a")
            .map(|item| item.value.as_literal().unwrap())
            .collect();
        assert_eq!(values, vec![&ConfigLiteral::Number(1), &ConfigLiteral::Number(2)]);
    }

    #[test]
    fn test_terraform_style_document() {
        let doc = parse_config(
            "variable \"region\" {\n  default = \"us-east-1\"\n}\n\nresource \"aws_instance\" \"web\" {\n  ami   = \"ami-123\"\n  count = 2\n  tags  = { Name = \"web-${count.index}\" }\n}\n",
        )
        .unwrap();
        let root = doc.as_object().unwrap();
        let resources = root.filter_prefix("resource");
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].key_names(), vec!["aws_instance", "web"]);

        let body = resources[0].value.as_object().unwrap();
        let tags = body.filter("tags").next().unwrap().value.as_object().unwrap();
        let name = tags.items[0].value.as_literal().unwrap().as_str().unwrap();
        assert_eq!(name, "web-${count.index}");
    }

    #[test]
    fn test_config_error_is_positioned() {
        let err = parse_config("a = {\n  b = \n}").unwrap_err();
        assert_eq!(err.pos().unwrap().line_column(), (3, 1));
        assert_eq!(err.message(), "Expected value, found '}'");
    }

    #[test]
    fn test_invalid_utf8_is_unpositioned() {
        let err = parse_config_bytes(b"a = \"\xc3\x28\"").unwrap_err();
        assert!(err.pos().is_none());
        assert!(err.render("").starts_with("Error: "));
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    #[test]
    fn test_expression_precedence() {
        let expr = parse_expression("${1 + 2 * 3}", 1, 1, "").unwrap();
        let ExprKind::Concat(parts) = expr.kind else {
            panic!("expected concat");
        };
        let ExprKind::Binary { op, right, .. } = &parts[0].kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_expression_call_with_map() {
        let expr = parse_expression("${foo({a = 1})}", 1, 1, "").unwrap();
        let ExprKind::Concat(parts) = expr.kind else {
            panic!("expected concat");
        };
        let ExprKind::Call { name, args } = &parts[0].kind else {
            panic!("expected call");
        };
        assert_eq!(name, "foo");
        assert_eq!(args.len(), 1);
        assert!(matches!(args[0].kind, ExprKind::Map(_)));
    }

    #[test]
    fn test_expression_positions_follow_start() {
        let err = parse_expression("${}", 10, 5, "").unwrap_err();
        assert_eq!(err.pos().unwrap().line_column(), (5, 12));
        assert_eq!(err.pos().unwrap().filename(), None);
    }

    #[test]
    fn test_expression_filename_echoed() {
        let expr = parse_expression("${a}", 4, 2, "vars.tf").unwrap();
        assert_eq!(expr.pos.filename(), Some("vars.tf"));
        assert_eq!(expr.pos.line_column(), (2, 4));
    }

    #[test]
    fn test_zero_start_treated_as_one() {
        let expr = parse_expression("x", 0, 0, "").unwrap();
        assert_eq!(expr.pos.line_column(), (1, 1));
    }

    #[test]
    fn test_unterminated_interpolation() {
        let err = parse_expression("\"${foo", 1, 1, "").unwrap_err();
        assert!(err.pos().unwrap().column >= 2);
    }

    #[test]
    fn test_rendered_expression_error() {
        let source = "${a +}";
        let err = parse_expression(source, 1, 1, "").unwrap_err();
        let report = err.render(source);
        assert!(report.contains("Expected expression"), "got: {report}");
    }

    // =========================================================================
    // Independence between calls
    // =========================================================================

    #[test]
    fn test_multiple_parses_share_no_state() {
        let first = parse_expression("${a}", 3, 3, "one.tf").unwrap();
        let second = parse_expression("${a}", 1, 1, "").unwrap();
        assert_eq!(first.pos.filename(), Some("one.tf"));
        assert_eq!(second.pos.filename(), None);
        assert_eq!(second.pos.line_column(), (1, 1));
    }

    #[test]
    fn test_parse_on_many_threads() {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    let doc = parse_config(&format!("n = {i}")).unwrap();
                    let expr = parse_expression(&format!("${{x + {i}}}"), 1, 1, "").unwrap();
                    (doc, expr)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let (doc, _expr) = handle.join().unwrap();
            let value = doc.as_object().unwrap().items[0].value.as_literal().unwrap().clone();
            assert_eq!(value, ConfigLiteral::Number(i as i64));
        }
    }

    #[test]
    fn test_version() {
        assert!(version().contains('.'));
    }
}
