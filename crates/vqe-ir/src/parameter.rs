//! Parameter expressions for variational circuits.
//!
//! Expressions are either built programmatically or parsed from text such as
//! `0.5 * theta` or `-(t0 + pi / 4)`.

use logos::Logos;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

use crate::error::{IrError, IrResult};

/// Values assigned to symbolic parameters, keyed by symbol name.
pub type Bindings = FxHashMap<String, f64>;

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A symbolic parameter.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Parse an expression from text.
    ///
    /// Accepts numbers, identifiers, `pi`, unary minus, `+ - * /` with the
    /// usual precedence, and parentheses.
    pub fn parse(source: &str) -> IrResult<Self> {
        let mut parser = ExprParser::new(source)?;
        let expr = parser.expression()?;
        if let Some(token) = parser.peek() {
            return Err(IrError::InvalidExpression(format!(
                "unexpected trailing token {token:?} in '{source}'"
            )));
        }
        Ok(expr)
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Try to evaluate as a concrete f64 value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            ParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
        }
    }

    /// Evaluate the expression under `bindings`.
    ///
    /// Fails on the first symbol without a binding, or on division by zero.
    pub fn evaluate(&self, bindings: &Bindings) -> IrResult<f64> {
        match self {
            ParameterExpression::Constant(v) => Ok(*v),
            ParameterExpression::Pi => Ok(PI),
            ParameterExpression::Symbol(name) => bindings
                .get(name)
                .copied()
                .ok_or_else(|| IrError::UnboundParameter(name.clone())),
            ParameterExpression::Neg(e) => Ok(-e.evaluate(bindings)?),
            ParameterExpression::Add(a, b) => Ok(a.evaluate(bindings)? + b.evaluate(bindings)?),
            ParameterExpression::Sub(a, b) => Ok(a.evaluate(bindings)? - b.evaluate(bindings)?),
            ParameterExpression::Mul(a, b) => Ok(a.evaluate(bindings)? * b.evaluate(bindings)?),
            ParameterExpression::Div(a, b) => {
                let divisor = b.evaluate(bindings)?;
                if divisor == 0.0 {
                    return Err(IrError::InvalidExpression(format!(
                        "division by zero in '{self}'"
                    )));
                }
                Ok(a.evaluate(bindings)? / divisor)
            }
        }
    }

    /// Get all symbol names in this expression, in sorted order.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        self.collect_symbols(&mut set);
        set
    }

    pub(crate) fn collect_symbols(&self, set: &mut BTreeSet<String>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(name) => {
                set.insert(name.clone());
            }
            ParameterExpression::Neg(e) => e.collect_symbols(set),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Bind every symbol present in `bindings`, leaving the others symbolic.
    pub fn bind_all(&self, bindings: &Bindings) -> Self {
        let map = |e: &ParameterExpression| Box::new(e.bind_all(bindings));
        match self {
            ParameterExpression::Symbol(n) => match bindings.get(n) {
                Some(v) => ParameterExpression::Constant(*v),
                None => self.clone(),
            },
            ParameterExpression::Constant(_) | ParameterExpression::Pi => self.clone(),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(map(e)),
            ParameterExpression::Add(a, b) => ParameterExpression::Add(map(a), map(b)),
            ParameterExpression::Sub(a, b) => ParameterExpression::Sub(map(a), map(b)),
            ParameterExpression::Mul(a, b) => ParameterExpression::Mul(map(a), map(b)),
            ParameterExpression::Div(a, b) => ParameterExpression::Div(map(a), map(b)),
        }
    }

    /// Bind a single symbol to a value, returning a new expression.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        let mut bindings = Bindings::default();
        bindings.insert(name.to_string(), value);
        self.bind_all(&bindings)
    }

    /// Simplify the expression by folding constant subexpressions.
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return ParameterExpression::Constant(v);
        }
        let fold = |a: &ParameterExpression,
                    b: &ParameterExpression,
                    op: fn(f64, f64) -> Option<f64>,
                    build: fn(Box<Self>, Box<Self>) -> Self| {
            let a = a.simplify();
            let b = b.simplify();
            match (a.as_f64(), b.as_f64()) {
                (Some(av), Some(bv)) => match op(av, bv) {
                    Some(v) => ParameterExpression::Constant(v),
                    None => build(Box::new(a), Box::new(b)),
                },
                _ => build(Box::new(a), Box::new(b)),
            }
        };
        match self {
            ParameterExpression::Neg(e) => {
                let e = e.simplify();
                match e.as_f64() {
                    Some(v) => ParameterExpression::Constant(-v),
                    None => ParameterExpression::Neg(Box::new(e)),
                }
            }
            ParameterExpression::Add(a, b) => fold(a, b, |x, y| Some(x + y), Self::Add),
            ParameterExpression::Sub(a, b) => fold(a, b, |x, y| Some(x - y), Self::Sub),
            ParameterExpression::Mul(a, b) => fold(a, b, |x, y| Some(x * y), Self::Mul),
            ParameterExpression::Div(a, b) => {
                fold(a, b, |x, y| (y != 0.0).then(|| x / y), Self::Div)
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "pi"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

impl std::str::FromStr for ParameterExpression {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        ParameterExpression::Constant(f64::from(value))
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        ParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        ParameterExpression::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum ExprToken {
    #[token("pi", priority = 3)]
    Pi,

    #[regex(r"[0-9]*\.?[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
}

struct ExprParser {
    tokens: Vec<ExprToken>,
    pos: usize,
}

impl ExprParser {
    fn new(source: &str) -> IrResult<Self> {
        let mut lexer = ExprToken::lexer(source);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next() {
            match token {
                Ok(t) => tokens.push(t),
                Err(()) => {
                    return Err(IrError::InvalidExpression(format!(
                        "unexpected '{}' in '{source}'",
                        lexer.slice()
                    )));
                }
            }
        }
        if tokens.is_empty() {
            return Err(IrError::InvalidExpression("empty expression".into()));
        }
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<ExprToken> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> IrResult<ParameterExpression> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(ExprToken::Plus) => {
                    self.pos += 1;
                    lhs = lhs + self.term()?;
                }
                Some(ExprToken::Minus) => {
                    self.pos += 1;
                    lhs = lhs - self.term()?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> IrResult<ParameterExpression> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(ExprToken::Star) => {
                    self.pos += 1;
                    lhs = lhs * self.unary()?;
                }
                Some(ExprToken::Slash) => {
                    self.pos += 1;
                    lhs = lhs / self.unary()?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> IrResult<ParameterExpression> {
        match self.peek() {
            Some(ExprToken::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(ExprToken::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> IrResult<ParameterExpression> {
        match self.advance() {
            Some(ExprToken::Number(v)) => Ok(ParameterExpression::Constant(v)),
            Some(ExprToken::Pi) => Ok(ParameterExpression::Pi),
            Some(ExprToken::Ident(name)) => Ok(ParameterExpression::Symbol(name)),
            Some(ExprToken::LParen) => {
                let inner = self.expression()?;
                match self.advance() {
                    Some(ExprToken::RParen) => Ok(inner),
                    _ => Err(IrError::InvalidExpression("missing ')'".into())),
                }
            }
            Some(other) => Err(IrError::InvalidExpression(format!(
                "unexpected token {other:?}"
            ))),
            None => Err(IrError::InvalidExpression(
                "unexpected end of expression".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, f64)]) -> Bindings {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_constant() {
        let p = ParameterExpression::constant(1.5);
        assert!(!p.is_symbolic());
        assert_eq!(p.as_f64(), Some(1.5));
    }

    #[test]
    fn test_symbol() {
        let p = ParameterExpression::symbol("theta");
        assert!(p.is_symbolic());
        assert_eq!(p.as_f64(), None);
        assert!(p.symbols().contains("theta"));
    }

    #[test]
    fn test_bind() {
        let p = ParameterExpression::symbol("theta");
        let bound = p.bind("theta", PI / 2.0);
        assert!(!bound.is_symbolic());
        assert!((bound.as_f64().unwrap() - PI / 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_scaled_symbol() {
        let expr = ParameterExpression::parse("0.5 * phi").unwrap();
        let value = expr.evaluate(&bindings(&[("phi", 3.1415)])).unwrap();
        assert!((value - 1.57075).abs() < 1e-12);
    }

    #[test]
    fn test_parse_precedence_and_parens() {
        let expr = ParameterExpression::parse("-(t0 + pi / 2) * 2").unwrap();
        let value = expr.evaluate(&bindings(&[("t0", 1.0)])).unwrap();
        assert!((value - (-(1.0 + PI / 2.0) * 2.0)).abs() < 1e-12);
        assert_eq!(
            expr.symbols().into_iter().collect::<Vec<_>>(),
            vec!["t0".to_string()]
        );
    }

    #[test]
    fn test_parse_scientific_notation() {
        let expr = ParameterExpression::parse("1.5e-3").unwrap();
        assert_eq!(expr.as_f64(), Some(1.5e-3));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ParameterExpression::parse("").is_err());
        assert!(ParameterExpression::parse("theta +").is_err());
        assert!(ParameterExpression::parse("(theta").is_err());
        assert!(ParameterExpression::parse("theta $ 2").is_err());
        assert!(ParameterExpression::parse("theta theta").is_err());
    }

    #[test]
    fn test_evaluate_unbound_symbol() {
        let expr = ParameterExpression::parse("a * b").unwrap();
        let err = expr.evaluate(&bindings(&[("a", 1.0)])).unwrap_err();
        assert!(matches!(err, IrError::UnboundParameter(name) if name == "b"));
    }

    #[test]
    fn test_bind_all_partial() {
        let expr = ParameterExpression::parse("a + b").unwrap();
        let partial = expr.bind_all(&bindings(&[("a", 2.0)]));
        assert!(partial.is_symbolic());
        let full = partial.bind("b", 3.0).simplify();
        assert_eq!(full.as_f64(), Some(5.0));
    }

    #[test]
    fn test_display_parses_back() {
        let expr = ParameterExpression::parse("2 * x - pi").unwrap();
        let again = ParameterExpression::parse(&expr.to_string()).unwrap();
        let b = bindings(&[("x", 0.25)]);
        assert_eq!(expr.evaluate(&b).unwrap(), again.evaluate(&b).unwrap());
    }
}
