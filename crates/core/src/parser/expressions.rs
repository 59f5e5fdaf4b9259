use super::{Parser, MAX_EXPRESSION_HEIGHT};
use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::error::ParseError;
use crate::lexer::Token;

/// Words with operator or literal meaning; never identifiers.
const RESERVED_WORDS: &[&str] = &["and", "or", "not", "true", "false"];

/// A parsed subtree and its height (a lone literal or variable is 1).
pub(super) struct Node {
    pub(super) expr: Expr,
    pub(super) height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Node { expr, height: 1 }
    }
}

impl<'a> Parser<'a> {
    // -- Boolean layer -------------------------------------------

    pub(super) fn parse_expr(&mut self) -> Result<Node, ParseError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.peek() == &Token::Or || self.is_word("or") {
            let offset = self.cur_offset();
            self.advance();
            let right = self.parse_and_expr()?;
            left = self.binary(BinaryOp::Or, left, right, offset)?;
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_not_expr()?;
        while self.peek() == &Token::And || self.is_word("and") {
            let offset = self.cur_offset();
            self.advance();
            let right = self.parse_not_expr()?;
            left = self.binary(BinaryOp::And, left, right, offset)?;
        }
        Ok(left)
    }

    fn parse_not_expr(&mut self) -> Result<Node, ParseError> {
        if self.peek() == &Token::Not || self.is_word("not") {
            let offset = self.cur_offset();
            self.advance();
            let operand = self.nested(|p| p.parse_not_expr())?;
            return self.unary(UnaryOp::Not, operand, offset);
        }
        self.parse_compare_expr()
    }

    // -- Comparison and arithmetic ---------------------------------

    fn parse_compare_expr(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_additive_expr()?;
        let Some(op) = self.compare_op() else {
            return Ok(left);
        };
        let offset = self.cur_offset();
        self.advance();
        let right = self.parse_additive_expr()?;
        if self.compare_op().is_some() {
            return Err(self.err(
                "chained comparison is not allowed; combine comparisons with 'and'",
            ));
        }
        self.binary(op, left, right, offset)
    }

    fn compare_op(&self) -> Option<BinaryOp> {
        match self.peek() {
            Token::Eq => Some(BinaryOp::Eq),
            Token::Neq => Some(BinaryOp::Neq),
            Token::Lt => Some(BinaryOp::Lt),
            Token::Lte => Some(BinaryOp::Lte),
            Token::Gt => Some(BinaryOp::Gt),
            Token::Gte => Some(BinaryOp::Gte),
            _ => None,
        }
    }

    fn parse_additive_expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            let offset = self.cur_offset();
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = self.binary(op, left, right, offset)?;
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            let offset = self.cur_offset();
            self.advance();
            let right = self.parse_unary_expr()?;
            left = self.binary(op, left, right, offset)?;
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Node, ParseError> {
        if self.peek() == &Token::Minus {
            let offset = self.cur_offset();
            self.advance();
            let operand = self.nested(|p| p.parse_unary_expr())?;
            return self.unary(UnaryOp::Neg, operand, offset);
        }
        self.parse_primary()
    }

    // -- Primary ---------------------------------------------------

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let offset = self.cur_offset();
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Node::leaf(Expr::Literal {
                    value: Literal::Number(n),
                    offset,
                }))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Node::leaf(Expr::Literal {
                    value: Literal::Str(s),
                    offset,
                }))
            }
            Token::Word(w) if w == "true" || w == "false" => {
                self.advance();
                Ok(Node::leaf(Expr::Literal {
                    value: Literal::Bool(w == "true"),
                    offset,
                }))
            }
            Token::Word(w) if RESERVED_WORDS.contains(&w.as_str()) => Err(self.err(format!(
                "expected expression, got '{}'",
                w
            ))),
            Token::Word(_) => self.parse_reference(),
            Token::LParen => {
                self.advance();
                let inner = self.nested(|p| p.parse_expr())?;
                self.expect_rparen(offset)?;
                Ok(inner)
            }
            other => Err(self.err(format!(
                "expected expression, got {}",
                other.describe()
            ))),
        }
    }

    /// A bare name, a dotted path, or a call `name(args...)`.
    fn parse_reference(&mut self) -> Result<Node, ParseError> {
        let offset = self.cur_offset();
        let first = self.take_word()?;

        if self.peek() == &Token::LParen {
            return self.parse_call(first, offset);
        }

        let mut name = first;
        while self.peek() == &Token::Dot {
            self.advance();
            if !matches!(self.peek(), Token::Word(_)) {
                return Err(self.err(format!(
                    "expected property name after '.', got {}",
                    self.peek().describe()
                )));
            }
            let segment = self.take_word()?;
            name.push('.');
            name.push_str(&segment);
        }

        if self.peek() == &Token::LParen {
            return Err(self.err(format!(
                "'{}' cannot be called; only bare function names are callable",
                name
            )));
        }

        Ok(Node::leaf(Expr::Variable { name, offset }))
    }

    fn parse_call(&mut self, name: String, offset: usize) -> Result<Node, ParseError> {
        let open_offset = self.cur_offset();
        self.advance(); // '('
        let args = self.nested(|p| {
            let mut args = Vec::new();
            if p.peek() == &Token::RParen {
                return Ok(args);
            }
            loop {
                args.push(p.parse_expr()?);
                if p.peek() == &Token::Comma {
                    p.advance();
                    if p.peek() == &Token::RParen {
                        return Err(p.err("expected argument after ','"));
                    }
                    continue;
                }
                return Ok(args);
            }
        })?;
        self.expect_rparen(open_offset)?;
        let height = args.iter().map(|a: &Node| a.height).max().unwrap_or(0) + 1;
        self.check_height(height, offset)?;
        Ok(Node {
            expr: Expr::Call {
                name,
                args: args.into_iter().map(|a| a.expr).collect(),
                offset,
            },
            height,
        })
    }

    // -- Tree construction -----------------------------------------

    fn binary(
        &self,
        op: BinaryOp,
        left: Node,
        right: Node,
        offset: usize,
    ) -> Result<Node, ParseError> {
        let height = left.height.max(right.height) + 1;
        self.check_height(height, offset)?;
        Ok(Node {
            expr: Expr::Binary {
                op,
                left: Box::new(left.expr),
                right: Box::new(right.expr),
                offset,
            },
            height,
        })
    }

    fn unary(&self, op: UnaryOp, operand: Node, offset: usize) -> Result<Node, ParseError> {
        let height = operand.height + 1;
        self.check_height(height, offset)?;
        Ok(Node {
            expr: Expr::Unary {
                op,
                operand: Box::new(operand.expr),
                offset,
            },
            height,
        })
    }

    /// Operator chains are built by loops, not recursion, so the tree height
    /// is bounded here rather than by [`Parser::nested`].
    fn check_height(&self, height: usize, offset: usize) -> Result<(), ParseError> {
        if height > MAX_EXPRESSION_HEIGHT {
            return Err(ParseError::new(
                offset,
                format!(
                    "expression too complex (more than {} nested operations)",
                    MAX_EXPRESSION_HEIGHT
                ),
            ));
        }
        Ok(())
    }
}
