// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The EVAL expression language.
//!
//! A small, closed expression grammar over scalars. Variables are referenced as
//! `{NAME}` placeholders or as bare identifiers; placeholders inside quoted
//! strings are interpolated with the variable's text.
//!
//! Precedence, lowest to highest:
//!
//! ```text
//! a if c else b
//! or
//! and
//! not
//! == != < <= > >= xor
//! + -
//! * / %
//! unary -
//! ( ... )
//! ```

use std::cmp::Ordering;

use crate::dsl::lexer::{tokenize, Token};
use crate::errors::{InterpreterError, InterpreterResult};
use crate::value::{Scalar, Value};

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Lit(Scalar),
    Var(String),
    /// String literal with `{NAME}` placeholders to interpolate.
    Template(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    IfElse {
        then: Box<Expr>,
        cond: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Chained comparison: `a < b <= c`.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    Arith(Box<Expr>, ArithOp, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Evaluate an EVAL expression, resolving variables through `lookup`.
///
/// `lookup` returns `None` for unbound names, which surfaces as
/// [`InterpreterError::UndefinedVariable`].
///
/// # Example
/// ```
/// use visprog::dsl::evaluate;
/// use visprog::value::{Scalar, Value};
///
/// let result = evaluate("'yes' if {ANSWER0} > 0 else 'no'", |name| {
///     (name == "ANSWER0").then(|| Value::from(2i64))
/// })
/// .unwrap();
/// assert_eq!(result, Scalar::Str("yes".to_string()));
/// ```
pub fn evaluate<F>(source: &str, lookup: F) -> InterpreterResult<Scalar>
where
    F: Fn(&str) -> Option<Value>,
{
    let expr = parse(source)?;
    let ctx = Context { source, lookup: &lookup };
    ctx.eval(&expr)
}

/// Parse without evaluating; used to reject malformed expressions early.
pub fn validate(source: &str) -> InterpreterResult<()> {
    parse(source).map(|_| ())
}

fn eval_error(source: &str, reason: impl Into<String>) -> InterpreterError {
    InterpreterError::Eval {
        expr: source.to_string(),
        reason: reason.into(),
    }
}

fn parse(source: &str) -> InterpreterResult<Expr> {
    let tokens: Vec<Token> = tokenize(source)
        .map_err(|offset| eval_error(source, format!("invalid character at offset {}", offset)))?
        .into_iter()
        .map(|s| s.token)
        .collect();
    if tokens.is_empty() {
        return Err(eval_error(source, "empty expression"));
    }
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.ternary()?;
    if parser.pos != parser.tokens.len() {
        return Err(eval_error(
            source,
            format!("unexpected token {:?}", parser.tokens[parser.pos]),
        ));
    }
    Ok(expr)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(name)) if name == keyword)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> InterpreterResult<()> {
        match self.advance() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(eval_error(self.source, format!("expected {:?}, found {:?}", expected, t))),
            None => Err(eval_error(self.source, format!("expected {:?}, found end of expression", expected))),
        }
    }

    fn ternary(&mut self) -> InterpreterResult<Expr> {
        let then = self.or()?;
        if !self.peek_keyword("if") {
            return Ok(then);
        }
        self.pos += 1;
        let cond = self.or()?;
        if !self.peek_keyword("else") {
            return Err(eval_error(self.source, "conditional expression is missing 'else'"));
        }
        self.pos += 1;
        let otherwise = self.ternary()?;
        Ok(Expr::IfElse {
            then: Box::new(then),
            cond: Box::new(cond),
            otherwise: Box::new(otherwise),
        })
    }

    fn or(&mut self) -> InterpreterResult<Expr> {
        let mut left = self.and()?;
        while self.peek_keyword("or") {
            self.pos += 1;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> InterpreterResult<Expr> {
        let mut left = self.not()?;
        while self.peek_keyword("and") {
            self.pos += 1;
            let right = self.not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not(&mut self) -> InterpreterResult<Expr> {
        if self.peek_keyword("not") {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> InterpreterResult<Expr> {
        let first = self.additive()?;
        let mut chain = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => CmpOp::Eq,
                Some(Token::NotEq) => CmpOp::Ne,
                Some(Token::Lt) => CmpOp::Lt,
                Some(Token::LtEq) => CmpOp::Le,
                Some(Token::Gt) => CmpOp::Gt,
                Some(Token::GtEq) => CmpOp::Ge,
                Some(Token::Ident(name)) if name == "xor" => CmpOp::Ne,
                _ => break,
            };
            self.pos += 1;
            chain.push((op, self.additive()?));
        }
        if chain.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), chain))
        }
    }

    fn additive(&mut self) -> InterpreterResult<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expr::Arith(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> InterpreterResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                Some(Token::Percent) => ArithOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Arith(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> InterpreterResult<Expr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> InterpreterResult<Expr> {
        match self.advance() {
            Some(Token::Int(i)) => Ok(Expr::Lit(Scalar::Int(i))),
            Some(Token::Float(f)) => Ok(Expr::Lit(Scalar::Float(f))),
            Some(Token::Str(s)) if s.contains('{') => Ok(Expr::Template(s)),
            Some(Token::Str(s)) => Ok(Expr::Lit(Scalar::Str(s))),
            Some(Token::LParen) => {
                let inner = self.ternary()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBrace) => match self.advance() {
                Some(Token::Ident(name)) => {
                    self.expect(Token::RBrace)?;
                    Ok(Expr::Var(name))
                }
                _ => Err(eval_error(self.source, "expected a variable name inside '{...}'")),
            },
            Some(Token::Ident(name)) => match name.to_ascii_lowercase().as_str() {
                "true" => Ok(Expr::Lit(Scalar::Bool(true))),
                "false" => Ok(Expr::Lit(Scalar::Bool(false))),
                "and" | "or" | "not" | "if" | "else" | "xor" => {
                    Err(eval_error(self.source, format!("unexpected keyword '{}'", name)))
                }
                _ => Ok(Expr::Var(name)),
            },
            Some(t) => Err(eval_error(self.source, format!("unexpected token {:?}", t))),
            None => Err(eval_error(self.source, "unexpected end of expression")),
        }
    }
}

struct Context<'a> {
    source: &'a str,
    lookup: &'a dyn Fn(&str) -> Option<Value>,
}

impl Context<'_> {
    fn eval(&self, expr: &Expr) -> InterpreterResult<Scalar> {
        match expr {
            Expr::Lit(s) => Ok(s.clone()),
            Expr::Var(name) => self.variable(name).map(coerce),
            Expr::Template(text) => self.interpolate(text).map(Scalar::Str),
            Expr::Not(inner) => Ok(Scalar::Bool(!truthy(&self.eval(inner)?))),
            Expr::Neg(inner) => match self.eval(inner)? {
                Scalar::Int(i) => i
                    .checked_neg()
                    .map(Scalar::Int)
                    .ok_or_else(|| eval_error(self.source, "integer overflow")),
                Scalar::Float(f) => Ok(Scalar::Float(-f)),
                Scalar::Bool(b) => Ok(Scalar::Int(-(b as i64))),
                Scalar::Str(s) => Err(eval_error(self.source, format!("cannot negate string '{}'", s))),
            },
            Expr::And(left, right) => {
                let l = self.eval(left)?;
                if truthy(&l) {
                    self.eval(right)
                } else {
                    Ok(l)
                }
            }
            Expr::Or(left, right) => {
                let l = self.eval(left)?;
                if truthy(&l) {
                    Ok(l)
                } else {
                    self.eval(right)
                }
            }
            Expr::IfElse { then, cond, otherwise } => {
                if truthy(&self.eval(cond)?) {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Compare(first, chain) => {
                let mut left = self.eval(first)?;
                for (op, right) in chain {
                    let right = self.eval(right)?;
                    if !self.compare(*op, &left, &right)? {
                        return Ok(Scalar::Bool(false));
                    }
                    left = right;
                }
                Ok(Scalar::Bool(true))
            }
            Expr::Arith(left, op, right) => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                self.arith(*op, l, r)
            }
        }
    }

    fn variable(&self, name: &str) -> InterpreterResult<Scalar> {
        match (self.lookup)(name) {
            None => Err(InterpreterError::UndefinedVariable(name.to_string())),
            Some(Value::Scalar(s)) => Ok(s),
            Some(other) => Err(InterpreterError::type_mismatch("EVAL", "a scalar value", other.kind())),
        }
    }

    fn interpolate(&self, text: &str) -> InterpreterResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            let name = &rest[open + 1..open + close];
            let is_name = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            out.push_str(&rest[..open]);
            if is_name {
                out.push_str(&self.variable(name)?.to_string());
            } else {
                out.push_str(&rest[open..=open + close]);
            }
            rest = &rest[open + close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn compare(&self, op: CmpOp, left: &Scalar, right: &Scalar) -> InterpreterResult<bool> {
        let holds: fn(Ordering) -> bool = match op {
            CmpOp::Eq => return Ok(scalars_equal(left, right)),
            CmpOp::Ne => return Ok(!scalars_equal(left, right)),
            CmpOp::Lt => Ordering::is_lt,
            CmpOp::Le => Ordering::is_le,
            CmpOp::Gt => Ordering::is_gt,
            CmpOp::Ge => Ordering::is_ge,
        };
        let ordering = match (left, right) {
            (Scalar::Str(a), Scalar::Str(b)) => Some(a.cmp(b)),
            _ => match (numeric(left), numeric(right)) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        };
        let ordering = ordering.ok_or_else(|| {
            eval_error(self.source, format!("cannot order {} and {}", describe(left), describe(right)))
        })?;
        Ok(holds(ordering))
    }

    fn arith(&self, op: ArithOp, left: Scalar, right: Scalar) -> InterpreterResult<Scalar> {
        if let (ArithOp::Add, Scalar::Str(a), Scalar::Str(b)) = (op, &left, &right) {
            return Ok(Scalar::Str(format!("{}{}", a, b)));
        }
        let overflow = || eval_error(self.source, "integer overflow");
        if let (Some(a), Some(b)) = (integer(&left), integer(&right)) {
            let value = match op {
                ArithOp::Add => a.checked_add(b).ok_or_else(overflow)?,
                ArithOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
                ArithOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
                ArithOp::Rem => {
                    if b == 0 {
                        return Err(eval_error(self.source, "modulo by zero"));
                    }
                    // sign follows the divisor
                    let r = a.checked_rem(b).ok_or_else(overflow)?;
                    if r != 0 && (r < 0) != (b < 0) {
                        r + b
                    } else {
                        r
                    }
                }
                // division is always floating point
                ArithOp::Div => return self.float_arith(op, a as f64, b as f64),
            };
            return Ok(Scalar::Int(value));
        }
        match (numeric(&left), numeric(&right)) {
            (Some(a), Some(b)) => self.float_arith(op, a, b),
            _ => Err(eval_error(
                self.source,
                format!("unsupported operands {} and {}", describe(&left), describe(&right)),
            )),
        }
    }

    fn float_arith(&self, op: ArithOp, a: f64, b: f64) -> InterpreterResult<Scalar> {
        if matches!(op, ArithOp::Div | ArithOp::Rem) && b == 0.0 {
            return Err(eval_error(self.source, "division by zero"));
        }
        Ok(Scalar::Float(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            ArithOp::Rem => a - b * (a / b).floor(),
        }))
    }
}

/// `"yes"`/`"no"` become booleans and decimal strings become integers.
fn coerce(scalar: Scalar) -> Scalar {
    match scalar {
        Scalar::Str(s) => {
            let trimmed = s.trim();
            match trimmed.to_ascii_lowercase().as_str() {
                "yes" => return Scalar::Bool(true),
                "no" => return Scalar::Bool(false),
                _ => {}
            }
            match trimmed.parse::<i64>() {
                Ok(i) if !trimmed.is_empty() => Scalar::Int(i),
                _ => Scalar::Str(s),
            }
        }
        other => other,
    }
}

/// Truthiness: false, 0, 0.0 and "" are false.
pub fn truthy(scalar: &Scalar) -> bool {
    match scalar {
        Scalar::Bool(b) => *b,
        Scalar::Int(i) => *i != 0,
        Scalar::Float(f) => *f != 0.0,
        Scalar::Str(s) => !s.is_empty(),
    }
}

fn integer(scalar: &Scalar) -> Option<i64> {
    match scalar {
        Scalar::Int(i) => Some(*i),
        Scalar::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

fn numeric(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Bool(b) => Some(*b as i64 as f64),
        other => other.as_number(),
    }
}

fn scalars_equal(left: &Scalar, right: &Scalar) -> bool {
    match (left, right) {
        (Scalar::Str(a), Scalar::Str(b)) => a == b,
        // A yes/no literal compares equal to the boolean it stands for.
        (Scalar::Bool(_), Scalar::Str(_)) => coerce(right.clone()) == *left,
        (Scalar::Str(_), Scalar::Bool(_)) => coerce(left.clone()) == *right,
        _ => match (numeric(left), numeric(right)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn describe(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Str(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}
