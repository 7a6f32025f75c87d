//! Recursive descent parser producing [`Stmt`]s from lexed tokens.
//!
//! Newlines are not tokens, so statement boundaries follow Python's rule
//! approximately: outside of brackets an operator, call or attribute access
//! only continues an expression when it sits on the same line as the token
//! before it.

use crate::{
    ast::{BinaryOp, Expr, Stmt, UnaryOp},
    error::ParseError,
    lexer::{Spanned, Token},
};

/// Parse a whole deck.
pub fn parse(tokens: &[Spanned<Token<'_>>]) -> Result<Vec<Stmt>, ParseError> {
    let mut parser = Parser::new(tokens);
    let mut program = Vec::new();
    while !parser.at_end() {
        program.push(parser.statement()?);
    }
    Ok(program)
}

struct Parser<'t, 'src> {
    tokens: &'t [Spanned<Token<'src>>],
    pos: usize,
    /// Number of currently open `(` and `[`
    depth: usize,
}

impl<'t, 'src> Parser<'t, 'src> {
    fn new(tokens: &'t [Spanned<Token<'src>>]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token<'src>> {
        self.tokens.get(self.pos + n).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token<'src>> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, expected: &Token<'src>) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the token if it matches.
    fn eat(&mut self, expected: &Token<'src>) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token<'src>, what: &str) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn line(&self) -> usize {
        self.position().0
    }

    /// Position of the current token, or of the end of the last one at EOF.
    fn position(&self) -> (usize, usize) {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(s) => (s.line, s.column),
            None => (1, 1),
        }
    }

    fn error(&self, message: String) -> ParseError {
        let (line, column) = self.position();
        let found = match self.peek() {
            Some(token) => format!("{token:?}"),
            None => "end of input".to_string(),
        };
        ParseError {
            line,
            column,
            message: format!("{message}, found {found}"),
        }
    }

    /// Whether the current token may extend the expression before it.
    fn continues_line(&self) -> bool {
        if self.depth > 0 {
            return true;
        }
        match (self.tokens.get(self.pos), self.pos.checked_sub(1)) {
            (Some(current), Some(prev)) => current.line == self.tokens[prev].line,
            _ => false,
        }
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        let head = (self.peek().cloned(), self.peek_nth(1).cloned());
        let stmt = match head {
            (Some(Token::Import), _) => {
                self.advance();
                let module = self.identifier("a module name after `import`")?;
                Stmt::Import { module, line }
            }
            (Some(Token::Ident(name)), Some(Token::Equals)) => {
                self.pos += 2;
                let value = self.expression()?;
                Stmt::Assign {
                    name: name.to_string(),
                    value,
                    line,
                }
            }
            _ => Stmt::Expr {
                expr: self.expression()?,
                line,
            },
        };
        while self.eat(&Token::Semicolon) {}
        Ok(stmt)
    }

    fn identifier(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.additive()
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            if !self.continues_line() {
                break;
            }
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            if !self.continues_line() {
                break;
            }
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `**` is right associative and its exponent may carry a sign.
    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.postfix()?;
        if self.check(&Token::StarStar) && self.continues_line() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.check(&Token::Dot) && self.continues_line() {
                self.pos += 1;
                let attr = self.identifier("an attribute name after `.`")?;
                expr = Expr::Attr {
                    base: Box::new(expr),
                    attr,
                };
            } else if self.check(&Token::ParenOpen) && self.continues_line() {
                self.pos += 1;
                let (args, kwargs) = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    kwargs,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("expected an expression".to_string()));
        };
        let expr = match token {
            Token::Int(i) => Expr::Int(i),
            Token::Float(x) => Expr::Float(x),
            Token::Str(s) => Expr::Str(s),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::NoneLit => Expr::None,
            Token::Ident(name) => Expr::Name(name.to_string()),
            Token::BracketOpen => {
                self.pos += 1;
                self.depth += 1;
                let items = self.sequence(&Token::BracketClose)?;
                self.expect(&Token::BracketClose, "`]` to close the list")?;
                self.depth -= 1;
                return Ok(Expr::List(items));
            }
            Token::ParenOpen => {
                self.pos += 1;
                self.depth += 1;
                let mut items = self.sequence(&Token::ParenClose)?;
                let trailing_comma = matches!(
                    self.pos.checked_sub(1).map(|p| &self.tokens[p].token),
                    Some(Token::Comma)
                );
                self.expect(&Token::ParenClose, "`)`")?;
                self.depth -= 1;
                // `(a)` is grouping, `(a, b)` and `(a,)` are tuples which decks use as lists
                return match items.len() {
                    1 if !trailing_comma => Ok(items.remove(0)),
                    0 => Err(self.error("expected an expression inside `()`".to_string())),
                    _ => Ok(Expr::List(items)),
                };
            }
            _ => return Err(self.error("expected an expression".to_string())),
        };
        self.pos += 1;
        Ok(expr)
    }

    /// Comma separated expressions up to (not including) `close`.
    fn sequence(&mut self, close: &Token<'src>) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(items)
    }

    /// Call arguments after the opening `(`, consuming the closing `)`.
    fn arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), ParseError> {
        self.depth += 1;
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        while !self.check(&Token::ParenClose) && !self.at_end() {
            if let (Some(Token::Ident(name)), Some(Token::Equals)) = (self.peek(), self.peek_nth(1)) {
                let name = name.to_string();
                self.pos += 2;
                kwargs.push((name, self.expression()?));
            } else if kwargs.is_empty() {
                args.push(self.expression()?);
            } else {
                return Err(self.error("positional argument follows keyword argument".to_string()));
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::ParenClose, "`,` or `)` in argument list")?;
        self.depth -= 1;
        Ok((args, kwargs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_str(source: &str) -> Result<Vec<Stmt>, ParseError> {
        parse(&lex(source).unwrap())
    }

    fn single_expr(source: &str) -> Expr {
        match parse_str(source).unwrap().remove(0) {
            Stmt::Expr { expr, .. } => expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_power_binds_tighter_than_negation() {
        let expected = Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(Expr::Int(2)),
                rhs: Box::new(Expr::Int(2)),
            }),
        };
        assert_eq!(single_expr("-2**2"), expected);
    }

    #[test]
    fn test_statements() {
        let program = parse_str("import math\nL0 = 2.*math.pi\nMain(geometry = \"1d3v\",)").unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(
            program[0],
            Stmt::Import {
                module: "math".to_string(),
                line: 1
            }
        );
        assert!(matches!(&program[1], Stmt::Assign { name, line: 2, .. } if name == "L0"));
        let Stmt::Expr {
            expr: Expr::Call { callee, args, kwargs },
            line: 3,
        } = &program[2]
        else {
            panic!("expected a record call");
        };
        assert_eq!(**callee, Expr::Name("Main".to_string()));
        assert!(args.is_empty());
        assert_eq!(kwargs[0].0, "geometry");
    }

    #[test]
    fn test_call_arguments() {
        let expr = single_expr("trapezoidal(0.00001, xvacuum=2, xplateau=3)");
        let Expr::Call { args, kwargs, .. } = expr else {
            panic!("expected a call");
        };
        assert_eq!(args, vec![Expr::Float(0.00001)]);
        assert_eq!(kwargs.len(), 2);
        assert_eq!(kwargs[1], ("xplateau".to_string(), Expr::Int(3)));
    }

    #[test]
    fn test_newline_ends_statement() {
        let program = parse_str("a = 1\n-2\nb = [1,\n -2]").unwrap();
        assert_eq!(program.len(), 3);
        assert!(matches!(&program[1], Stmt::Expr { expr: Expr::Unary { .. }, line: 2 }));
        assert!(matches!(&program[2], Stmt::Assign { value: Expr::List(items), .. } if items.len() == 2));
    }

    #[test]
    fn test_nested_lists_and_tuples() {
        let expr = single_expr("[[\"x\", 0, 1, 2], (\"ekin\", 0.1, 1, 5, \"logscale\")]");
        let Expr::List(axes) = expr else {
            panic!("expected a list");
        };
        assert!(matches!(&axes[1], Expr::List(items) if items.len() == 5));
        assert_eq!(single_expr("(1 + 2)"), single_expr("1 + 2"));
    }

    #[test]
    fn test_positional_after_keyword() {
        let err = parse_str("f(a=1, 2)").unwrap_err();
        assert!(err.message.contains("positional argument follows keyword argument"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_unclosed_call() {
        let err = parse_str("Main(\n  timestep = 1,\n").unwrap_err();
        assert!(err.message.contains("end of input"));
    }
}
