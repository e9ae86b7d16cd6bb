//! Restricted arithmetic for auto-roll success chances.
//!
//! Formulas such as `"luck*3+20"` or `"(智力 + 情商) / 2"` may reference any
//! attribute alias, numeric literals, `+ - * /`, parentheses and unary minus.
//! Nothing else is accepted; every failure resolves to a default chance.
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

use crate::attributes::{Attribute, Attributes};
use crate::constants::{DEFAULT_PROBABILITY_PCT, PROBABILITY_MAX_PCT, PROBABILITY_MIN_PCT};
use crate::numbers::{clamp_i64_to_u32, i64_to_f64, trunc_f64_to_i64};

const MAX_NESTING: usize = 64;

/// Reasons a formula could not be evaluated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),
    #[error("unexpected token `{0}`")]
    UnexpectedToken(Token),
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
    #[error("formula nests deeper than {MAX_NESTING} levels")]
    TooDeep,
}

/// Lexical token of the formula language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// Attribute reference, already resolved through the alias table.
    Attribute(Attribute),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Attribute(attribute) => write!(f, "{attribute}"),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Star => f.write_str("*"),
            Self::Slash => f.write_str("/"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
        }
    }
}

/// Split a formula into tokens, resolving identifiers to attributes.
///
/// # Errors
///
/// Returns an error for characters outside the grammar, malformed numbers or
/// identifiers that are not attribute aliases.
pub fn tokenize(formula: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = formula.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
            }
            c if c.is_ascii_digit() || c == '.' => {
                let text = take_while(&mut chars, |c| c.is_ascii_digit() || c == '.');
                let value = text
                    .parse::<f64>()
                    .map_err(|_| FormulaError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let word = take_while(&mut chars, |c| c.is_alphanumeric() || c == '_');
                let attribute = Attribute::from_alias(&word)
                    .ok_or(FormulaError::UnknownIdentifier(word))?;
                tokens.push(Token::Attribute(attribute));
            }
            other => return Err(FormulaError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

fn take_while(chars: &mut Peekable<Chars<'_>>, keep: impl Fn(char) -> bool) -> String {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if !keep(c) {
            break;
        }
        text.push(c);
        chars.next();
    }
    text
}

/// Evaluate `formula` against the current attributes.
///
/// # Errors
///
/// Returns an error for any token outside the grammar, syntax errors,
/// division by zero or a non-finite result.
pub fn evaluate(formula: &str, attributes: &Attributes) -> Result<f64, FormulaError> {
    let tokens = tokenize(formula)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        attributes,
    };
    let value = parser.expression(0)?;
    if let Some(token) = parser.peek() {
        return Err(FormulaError::UnexpectedToken(token.clone()));
    }
    if !value.is_finite() {
        return Err(FormulaError::NonFinite);
    }
    Ok(value)
}

/// Success chance in percent for `formula`, falling back to 50 on any error.
#[must_use]
pub fn resolve_probability(formula: &str, attributes: &Attributes) -> u32 {
    resolve_probability_or(formula, attributes, DEFAULT_PROBABILITY_PCT)
}

/// Success chance in percent for `formula`, falling back to `default` on any
/// error. The result is truncated toward zero and clamped to `1..=100`.
#[must_use]
pub fn resolve_probability_or(formula: &str, attributes: &Attributes, default: u32) -> u32 {
    let value = evaluate(formula, attributes)
        .ok()
        .and_then(trunc_f64_to_i64)
        .unwrap_or_else(|| {
            log::debug!("formula `{formula}` could not be evaluated, using {default}");
            i64::from(default)
        });
    clamp_i64_to_u32(value, PROBABILITY_MIN_PCT, PROBABILITY_MAX_PCT)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    attributes: &'a Attributes,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self, depth: usize) -> Result<f64, FormulaError> {
        if depth > MAX_NESTING {
            return Err(FormulaError::TooDeep);
        }
        let mut value = self.term(depth)?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    value += self.term(depth)?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.term(depth)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self, depth: usize) -> Result<f64, FormulaError> {
        let mut value = self.unary(depth)?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    value *= self.unary(depth)?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let divisor = self.unary(depth)?;
                    if divisor == 0.0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self, depth: usize) -> Result<f64, FormulaError> {
        if depth > MAX_NESTING {
            return Err(FormulaError::TooDeep);
        }
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            return Ok(-self.unary(depth + 1)?);
        }
        self.primary(depth)
    }

    fn primary(&mut self, depth: usize) -> Result<f64, FormulaError> {
        let attributes = self.attributes;
        match self.advance().cloned() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Attribute(attribute)) => {
                Ok(i64_to_f64(i64::from(attributes.get(attribute))))
            }
            Some(Token::LParen) => {
                let value = self.expression(depth + 1)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(FormulaError::UnexpectedToken(other.clone())),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(other) => Err(FormulaError::UnexpectedToken(other)),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}
