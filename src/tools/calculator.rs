//! Arithmetic for the `calculate` and `evaluate` tools.
//!
//! `calculate` applies one of four operations to two operands. `evaluate`
//! parses a restricted arithmetic expression with a small recursive-descent
//! parser. Both work in `f64` with native overflow semantics; the only
//! arithmetic fault reported is division by zero.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Deepest nesting of parentheses, unary signs and `**` exponents `evaluate`
/// accepts.
pub const MAX_DEPTH: usize = 64;

/// Errors raised by the calculator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// Division (true or floor) by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A character outside the permitted set.
    #[error("Invalid expression. Only basic math operations allowed (found '{ch}' at position {position})")]
    InvalidCharacter {
        /// The rejected character.
        ch: char,
        /// Byte offset in the expression.
        position: usize,
    },

    /// A numeric literal that does not parse.
    #[error("invalid number '{text}'")]
    InvalidNumber {
        /// The literal as written.
        text: String,
    },

    /// A token where an operand or operator was expected.
    #[error("unexpected '{token}' at position {position}")]
    UnexpectedToken {
        /// The offending token.
        token: String,
        /// Byte offset in the expression.
        position: usize,
    },

    /// The expression stopped before it was complete.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// Parentheses or unary operators nested too deeply.
    #[error("expression nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,

    /// An operation name that is not one of the four supported.
    #[error("unknown operation '{name}'")]
    UnknownOperation {
        /// The rejected name.
        name: String,
    },
}

/// The four binary operations of the `calculate` tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`
    Divide,
}

impl ArithmeticOp {
    /// Operation names, as accepted by [`FromStr`].
    pub const NAMES: [&'static str; 4] = ["add", "subtract", "multiply", "divide"];

    /// The infix symbol for this operation.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

impl FromStr for ArithmeticOp {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "subtract" => Ok(Self::Subtract),
            "multiply" => Ok(Self::Multiply),
            "divide" => Ok(Self::Divide),
            other => Err(CalcError::UnknownOperation {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Applies `op` to `a` and `b`.
///
/// # Errors
///
/// Returns [`CalcError::DivisionByZero`] when dividing by zero.
pub fn calculate(op: ArithmeticOp, a: f64, b: f64) -> Result<f64, CalcError> {
    match op {
        ArithmeticOp::Add => Ok(a + b),
        ArithmeticOp::Subtract => Ok(a - b),
        ArithmeticOp::Multiply => Ok(a * b),
        ArithmeticOp::Divide if b == 0.0 => Err(CalcError::DivisionByZero),
        ArithmeticOp::Divide => Ok(a / b),
    }
}

/// Evaluates an arithmetic expression.
///
/// Accepts decimal literals, `+ - * /`, floor division `//`, power `**`,
/// unary signs and parentheses. Power is right-associative and binds
/// tighter than a unary sign on its left, so `-2 ** 2` is `-4`.
///
/// # Errors
///
/// Returns a [`CalcError`] describing the first problem found.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    match parser.peek() {
        None => Ok(value),
        Some(&(ref token, position)) => Err(CalcError::UnexpectedToken {
            token: token.to_string(),
            position,
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    DoubleStar,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Star => f.write_str("*"),
            Self::Slash => f.write_str("/"),
            Self::DoubleSlash => f.write_str("//"),
            Self::DoubleStar => f.write_str("**"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(expression: &str) -> Result<Vec<(Token, usize)>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some((position, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '0'..='9' | '.' => {
                let mut end = position + ch.len_utf8();
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &expression[position..end];
                let value = text.parse::<f64>().map_err(|_| CalcError::InvalidNumber {
                    text: text.to_string(),
                })?;
                Token::Number(value)
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => {
                if chars.next_if(|&(_, c)| c == '*').is_some() {
                    Token::DoubleStar
                } else {
                    Token::Star
                }
            }
            '/' => {
                if chars.next_if(|&(_, c)| c == '/').is_some() {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(CalcError::InvalidCharacter {
                    ch: other,
                    position,
                })
            }
        };
        tokens.push((token, position));
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&(Token, usize)> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Option<&'a (Token, usize)> {
        let tokens = self.tokens;
        let token = tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            match self.peek().map(|(t, _)| t) {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := unary (('*' | '/' | '//') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            match self.peek().map(|(t, _)| t) {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    value = calculate(ArithmeticOp::Divide, value, divisor)?;
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    value = calculate(ArithmeticOp::Divide, value, divisor)?.floor();
                }
                _ => return Ok(value),
            }
        }
    }

    // unary := ('+' | '-') unary | power
    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek().map(|(t, _)| t) {
            Some(Token::Plus) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary();
                self.depth -= 1;
                value
            }
            Some(Token::Minus) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary().map(|v| -v);
                self.depth -= 1;
                value
            }
            _ => self.power(),
        }
    }

    // power := primary ('**' unary)?
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if matches!(self.peek(), Some((Token::DoubleStar, _))) {
            self.pos += 1;
            self.descend()?;
            let exponent = self.unary();
            self.depth -= 1;
            return Ok(base.powf(exponent?));
        }
        Ok(base)
    }

    // primary := number | '(' expression ')'
    fn primary(&mut self) -> Result<f64, CalcError> {
        let Some((token, position)) = self.next_token().cloned() else {
            return Err(CalcError::UnexpectedEnd);
        };

        match token {
            Token::Number(value) => Ok(value),
            Token::LParen => {
                self.descend()?;
                let value = self.expression()?;
                self.depth -= 1;
                match self.next_token() {
                    Some((Token::RParen, _)) => Ok(value),
                    Some((other, position)) => Err(CalcError::UnexpectedToken {
                        token: other.to_string(),
                        position: *position,
                    }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            other => Err(CalcError::UnexpectedToken {
                token: other.to_string(),
                position,
            }),
        }
    }
}
