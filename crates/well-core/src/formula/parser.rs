//! Parser descendente recursivo.
//!
//! Gramática:
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | '+' unary | atom
//! atom   := NUMBER | IDENT | '(' expr ')'
//! ```

use std::collections::BTreeSet;

use super::lexer::{tokenize, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Identificadores referenciados por la expresión.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Var(v) => {
                out.insert(v.clone());
            }
            Expr::Neg(inner) => inner.collect_vars(out),
            Expr::Binary(_, l, r) => {
                l.collect_vars(out);
                r.collect_vars(out);
            }
        }
    }
}

pub fn parse(src: &str) -> Result<Expr, String> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err("expresión vacía".to_string());
    }
    let mut p = Parser { tokens: &tokens, pos: 0 };
    let expr = p.expr()?;
    match p.peek() {
        None => Ok(expr),
        Some(t) => Err(format!("token inesperado en la posición {}", t.span.start)),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Minus) => {
                self.bump();
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(TokenKind::Plus) => {
                self.bump();
                self.unary()
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Expr, String> {
        let Some(tok) = self.bump() else {
            return Err("fin inesperado de la expresión".to_string());
        };
        match &tok.kind {
            TokenKind::Number(n) => Ok(Expr::Number(*n)),
            TokenKind::Ident(name) => Ok(Expr::Var(name.clone())),
            TokenKind::LParen => {
                let inner = self.expr()?;
                match self.bump().map(|t| &t.kind) {
                    Some(TokenKind::RParen) => Ok(inner),
                    _ => Err(format!("falta ')' para '(' en la posición {}", tok.span.start)),
                }
            }
            _ => Err(format!("token inesperado en la posición {}", tok.span.start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_associativity() {
        let e = parse("a - b - c * 2").unwrap();
        let expected = Expr::Binary(BinOp::Sub,
                                    Box::new(Expr::Binary(BinOp::Sub, Box::new(Expr::Var("a".into())), Box::new(Expr::Var("b".into())))),
                                    Box::new(Expr::Binary(BinOp::Mul, Box::new(Expr::Var("c".into())), Box::new(Expr::Number(2.0)))));
        assert_eq!(e, expected);
    }

    #[test]
    fn unary_minus_and_parens() {
        assert_eq!(parse("-(x)").unwrap(), Expr::Neg(Box::new(Expr::Var("x".into()))));
    }

    #[test]
    fn collects_variables() {
        let vars = parse("(a + b) / a * 3").unwrap().variables();
        assert_eq!(vars.into_iter().collect::<Vec<_>>(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn reports_structural_errors() {
        assert!(parse("").is_err());
        assert!(parse("(a + b").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("a +").is_err());
        assert!(parse("f(x)").is_err());
    }
}
