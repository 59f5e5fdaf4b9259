//! Expression parser: text -> AST plus the set of referenced variables.
//!
//! Syntax errors are returned as data ([`ParseError`]); nothing here panics
//! on malformed input. No type checking or resolution is done here -- that
//! is the inferrer's and validator's job.

use crate::ast::Expr;
use crate::error::ParseError;
use crate::lexer::{self, Spanned, Token};
use indexmap::IndexSet;
use serde::Serialize;

mod expressions;

/// Maximum nesting of parentheses, calls and prefix operators.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Maximum height of the AST. Every walk over a parsed tree (variable
/// collection, inference, `Display`, `Drop`) recurses at most this deep.
pub const MAX_EXPRESSION_HEIGHT: usize = 256;

/// Successful parse: the AST and every distinct variable it references,
/// in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedExpression {
    pub ast: Expr,
    pub variables: IndexSet<String>,
}

/// Parse an expression string.
pub fn parse_expression(text: &str) -> Result<ParsedExpression, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::new(0, "expression is empty"));
    }
    let tokens = lexer::lex(text)?;
    let mut p = Parser::new(&tokens);
    let ast = p.parse_expr()?.expr;
    p.expect_end()?;

    let mut variables = IndexSet::new();
    collect_variables(&ast, &mut variables);
    Ok(ParsedExpression { ast, variables })
}

/// Collect variable names referenced by `expr`, left to right. Call names
/// are not variables.
pub fn collect_variables(expr: &Expr, out: &mut IndexSet<String>) {
    match expr {
        Expr::Literal { .. } => {}
        Expr::Variable { name, .. } => {
            if !out.contains(name) {
                out.insert(name.clone());
            }
        }
        Expr::Unary { operand, .. } => collect_variables(operand, out),
        Expr::Binary { left, right, .. } => {
            collect_variables(left, out);
            collect_variables(right, out);
        }
        Expr::Call { args, .. } => {
            for a in args {
                collect_variables(a, out);
            }
        }
    }
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn cur_offset(&self) -> usize {
        self.cur().offset
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(self.cur_offset(), msg)
    }

    fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Word(x) if x == w)
    }

    fn take_word(&mut self) -> Result<String, ParseError> {
        if let Token::Word(w) = self.peek().clone() {
            self.advance();
            Ok(w)
        } else {
            Err(self.err(format!(
                "expected identifier, got {}",
                self.peek().describe()
            )))
        }
    }

    fn expect_rparen(&mut self, open_offset: usize) -> Result<(), ParseError> {
        match self.peek() {
            Token::RParen => {
                self.advance();
                Ok(())
            }
            Token::Eof => Err(ParseError::new(
                open_offset,
                "unmatched '(': missing closing ')'",
            )),
            other => Err(self.err(format!("expected ')', got {}", other.describe()))),
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Token::Eof => Ok(()),
            Token::RParen => Err(self.err("unmatched ')'")),
            other => Err(self.err(format!(
                "unexpected {} after end of expression",
                other.describe()
            ))),
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING_DEPTH`].
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.err(format!(
                "expression nested too deeply (limit {})",
                MAX_NESTING_DEPTH
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Literal};

    fn render(src: &str) -> String {
        parse_expression(src)
            .unwrap_or_else(|e| panic!("parse failed for {:?}: {}", src, e))
            .ast
            .to_string()
    }

    fn vars(src: &str) -> Vec<String> {
        parse_expression(src)
            .unwrap_or_else(|e| panic!("parse failed for {:?}: {}", src, e))
            .variables
            .into_iter()
            .collect()
    }

    fn parse_err(src: &str) -> ParseError {
        match parse_expression(src) {
            Ok(p) => panic!("expected syntax error for {:?}, got {}", src, p.ast),
            Err(e) => e,
        }
    }

    #[test]
    fn or_binds_looser_than_and() {
        assert_eq!(render("a or b and c"), "(a or (b and c))");
        assert_eq!(render("a || b && c"), "(a or (b and c))");
    }

    #[test]
    fn not_binds_looser_than_comparison() {
        assert_eq!(render("not a == b"), "(not (a == b))");
        assert_eq!(render("!a and b"), "((not a) and b)");
    }

    #[test]
    fn arithmetic_precedence_and_left_associativity() {
        assert_eq!(render("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(render("10 - 4 - 3"), "((10 - 4) - 3)");
        assert_eq!(render("a / b * c"), "((a / b) * c)");
    }

    #[test]
    fn unary_minus_binds_tighter_than_multiplication() {
        assert_eq!(render("-a * 2"), "((-a) * 2)");
        assert_eq!(render("--1"), "(-(-1))");
    }

    #[test]
    fn comparison_of_arithmetic() {
        assert_eq!(
            render("fields.price.value.amount * 2 >= 100"),
            "((fields.price.value.amount * 2) >= 100)"
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(render("(a or b) and c"), "((a or b) and c)");
    }

    #[test]
    fn call_versus_variable() {
        let p = parse_expression("isEmpty(fields.name.value) or isAdult").unwrap();
        match &p.ast {
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
                ..
            } => {
                assert!(
                    matches!(left.as_ref(), Expr::Call { name, args, .. } if name == "isEmpty" && args.len() == 1)
                );
                assert!(
                    matches!(right.as_ref(), Expr::Variable { name, .. } if name == "isAdult")
                );
            }
            other => panic!("expected or-expression, got {:?}", other),
        }
        assert_eq!(
            p.variables.into_iter().collect::<Vec<_>>(),
            vec!["fields.name.value".to_string(), "isAdult".to_string()]
        );
    }

    #[test]
    fn call_with_no_and_many_arguments() {
        assert_eq!(render("today()"), "today()");
        assert_eq!(render("max(a, b, 3)"), "max(a, b, 3)");
    }

    #[test]
    fn literals() {
        let p = parse_expression("'abc'").unwrap();
        assert!(matches!(
            p.ast,
            Expr::Literal {
                value: Literal::Str(ref s),
                ..
            } if s == "abc"
        ));
        let p = parse_expression("false").unwrap();
        assert!(matches!(
            p.ast,
            Expr::Literal {
                value: Literal::Bool(false),
                ..
            }
        ));
        assert!(p.variables.is_empty());
    }

    #[test]
    fn variables_are_deduplicated_in_first_seen_order() {
        assert_eq!(vars("b and a and b or a"), vec!["b", "a"]);
    }

    #[test]
    fn empty_and_blank_input_is_syntax_error() {
        assert!(parse_err("").message.contains("empty"));
        assert!(parse_err("   ").message.contains("empty"));
    }

    #[test]
    fn unmatched_parentheses() {
        let e = parse_err("(a and b");
        assert!(e.message.contains("unmatched '('"), "{}", e.message);
        assert_eq!(e.offset, 0);

        let e = parse_err("a and b)");
        assert!(e.message.contains("unmatched ')'"), "{}", e.message);
        assert_eq!(e.offset, 7);
    }

    #[test]
    fn trailing_operator() {
        let e = parse_err("a >=");
        assert!(e.message.contains("end of expression"), "{}", e.message);
        assert_eq!(e.offset, 4);

        let e = parse_err("a and");
        assert!(e.message.contains("end of expression"), "{}", e.message);
    }

    #[test]
    fn chained_comparison_is_rejected() {
        let e = parse_err("1 < a < 3");
        assert!(e.message.contains("chained comparison"), "{}", e.message);
    }

    #[test]
    fn dotted_path_cannot_be_called() {
        let e = parse_err("fields.x.value(1)");
        assert!(e.message.contains("cannot be called"), "{}", e.message);
    }

    #[test]
    fn keyword_is_not_an_operand() {
        let e = parse_err("and b");
        assert!(e.message.contains("'and'"), "{}", e.message);
    }

    #[test]
    fn juxtaposed_operands_are_rejected() {
        let e = parse_err("a b");
        assert!(e.message.contains("'b'"), "{}", e.message);
        assert_eq!(e.offset, 2);
    }

    #[test]
    fn nesting_limit() {
        let deep = format!("{}a{}", "(".repeat(100), ")".repeat(100));
        let e = parse_err(&deep);
        assert!(e.message.contains("nested too deeply"), "{}", e.message);

        let ok = format!("{}a{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(render(&ok), "a");
    }

    #[test]
    fn long_operator_chain_is_rejected_not_overflowed() {
        let chain = vec!["fields.x.value"; 10_000].join(" and ");
        let e = parse_err(&chain);
        assert!(e.message.contains("too complex"), "{}", e.message);

        let sum = vec!["1"; 10_000].join(" + ");
        assert!(parse_err(&sum).message.contains("too complex"));
    }

    #[test]
    fn chain_within_height_limit_parses() {
        let chain = vec!["a"; MAX_EXPRESSION_HEIGHT].join(" or ");
        let p = parse_expression(&chain).unwrap();
        assert_eq!(p.variables.len(), 1);

        let over = vec!["a"; MAX_EXPRESSION_HEIGHT + 1].join(" or ");
        assert!(parse_err(&over).message.contains("too complex"));
    }
}
