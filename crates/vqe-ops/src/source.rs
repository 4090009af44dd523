//! Text format for fermion Hamiltonians.
//!
//! ```text
//! __qpu__ h2() {
//!    0.7137758743754461
//!    -1.252477303982147 0 1 0 0
//!    (0.5,0.25) 1 1 2 0
//! }
//! ```
//!
//! Each term line is a coefficient followed by `site mode` pairs, where mode
//! `1` is a creation and `0` an annihilation operator. The coefficient is a
//! real number or a `(re,im)` pair; a line holding only a coefficient is a
//! constant term. The `__qpu__` header, braces, blank lines and `#` comments
//! are ignored.

use logos::Logos;
use num_complex::Complex64;
use std::str::FromStr;

use crate::error::{OpError, OpResult};
use crate::fermion::{FermionHamiltonian, FermionOperator, FermionTerm};

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r]+")]
enum Token<'src> {
    #[regex(r"[-+]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][-+]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,
}

/// Parse Hamiltonian source text.
pub fn parse_fermion_source(source: &str) -> OpResult<FermionHamiltonian> {
    let mut hamiltonian = FermionHamiltonian::default();
    for (idx, raw) in source.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() || line.starts_with("__qpu__") || line == "{" || line == "}" {
            continue;
        }
        hamiltonian.push(parse_term(line, idx + 1)?);
    }
    Ok(hamiltonian)
}

impl FromStr for FermionHamiltonian {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fermion_source(s)
    }
}

fn parse_term(line: &str, line_no: usize) -> OpResult<FermionTerm> {
    let err = |message: String| OpError::Parse {
        line: line_no,
        message,
    };

    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(line);
    while let Some(token) = lexer.next() {
        match token {
            Ok(t) => tokens.push(t),
            Err(()) => return Err(err(format!("unexpected '{}'", lexer.slice()))),
        }
    }

    let (coefficient, rest) = match tokens.as_slice() {
        [Token::Number(re), rest @ ..] => (Complex64::new(number(re, &err)?, 0.0), rest),
        [
            Token::LParen,
            Token::Number(re),
            Token::Comma,
            Token::Number(im),
            Token::RParen,
            rest @ ..,
        ] => (
            Complex64::new(number(re, &err)?, number(im, &err)?),
            rest,
        ),
        _ => return Err(err("expected a coefficient".into())),
    };

    if rest.len() % 2 != 0 {
        return Err(err("operators must come in 'site mode' pairs".into()));
    }

    let mut factors = Vec::with_capacity(rest.len() / 2);
    for pair in rest.chunks_exact(2) {
        let (Token::Number(site), Token::Number(mode)) = (pair[0], pair[1]) else {
            return Err(err("expected integer site and mode".into()));
        };
        let site = site
            .parse::<u32>()
            .map_err(|_| err(format!("invalid site '{site}'")))?;
        let op = match mode {
            "1" => FermionOperator::creation(site),
            "0" => FermionOperator::annihilation(site),
            other => return Err(err(format!("mode must be 0 or 1, got '{other}'"))),
        };
        factors.push(op);
    }

    Ok(FermionTerm::new(coefficient, factors))
}

fn number(text: &str, err: &impl Fn(String) -> OpError) -> OpResult<f64> {
    text.parse::<f64>()
        .map_err(|_| err(format!("invalid number '{text}'")))
}
