//! Calculate tool - sandboxed arithmetic expression evaluator
//!
//! Hand-rolled tokenizer + recursive-descent evaluator. Only arithmetic
//! operators, comparisons, and a fixed whitelist of math/random functions are
//! reachable; there is no access to the filesystem, processes, or the network,
//! regardless of what the caller sends.

use crate::{BoxFuture, Tool, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value as Json};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown name '{0}'")]
    UnknownIdent(String),
    #[error("{0}() expects {1} argument(s), got {2}")]
    WrongArity(&'static str, usize, usize),
    #[error("'{0}' expects numeric operands")]
    NonNumeric(String),
    #[error("result is not a finite number")]
    NotFinite,
}

/// Evaluation result: a number, or a boolean from a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Num(f64),
    Bool(bool),
}

impl Value {
    fn num(self, op: &str) -> Result<f64, EvalError> {
        match self {
            Value::Num(n) => Ok(n),
            Value::Bool(_) => Err(EvalError::NonNumeric(op.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    LParen,
    RParen,
    Comma,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Power);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '%' => { tokens.push(Token::Percent); i += 1; }
            '^' => { tokens.push(Token::Power); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            ',' => { tokens.push(Token::Comma); i += 1; }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Eq);
                    i += 2;
                } else {
                    return Err(EvalError::UnexpectedChar('=', i));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else {
                    return Err(EvalError::UnexpectedChar('!', i));
                }
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent suffix: 2e3, 1.5E-2
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| EvalError::UnexpectedToken(text.clone()))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(EvalError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token) -> Result<(), EvalError> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            Some(t) => Err(EvalError::UnexpectedToken(format!("{t:?}"))),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    // comparison := sum (('<'|'<='|'>'|'>='|'=='|'!=') sum)?
    fn comparison(&mut self) -> Result<Value, EvalError> {
        let left = self.sum()?;
        let op = match self.peek() {
            Some(Token::Lt) => "<",
            Some(Token::Le) => "<=",
            Some(Token::Gt) => ">",
            Some(Token::Ge) => ">=",
            Some(Token::Eq) => "==",
            Some(Token::Ne) => "!=",
            _ => return Ok(left),
        };
        self.pos += 1;
        let (a, b) = (left.num(op)?, self.sum()?.num(op)?);
        let result = match op {
            "<" => a < b,
            "<=" => a <= b,
            ">" => a > b,
            ">=" => a >= b,
            "==" => a == b,
            _ => a != b,
        };
        Ok(Value::Bool(result))
    }

    fn sum(&mut self) -> Result<Value, EvalError> {
        let mut acc = self.product()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    acc = Value::Num(acc.num("+")? + self.product()?.num("+")?);
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    acc = Value::Num(acc.num("-")? - self.product()?.num("-")?);
                }
                _ => return Ok(acc),
            }
        }
    }

    fn product(&mut self) -> Result<Value, EvalError> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    acc = Value::Num(acc.num("*")? * self.unary()?.num("*")?);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    acc = Value::Num(acc.num("/")? / self.unary()?.num("/")?);
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    acc = Value::Num(acc.num("%")? % self.unary()?.num("%")?);
                }
                _ => return Ok(acc),
            }
        }
    }

    // Unary minus binds looser than '**': -2**2 == -4
    fn unary(&mut self) -> Result<Value, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Value::Num(-self.unary()?.num("-")?))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                Ok(Value::Num(self.unary()?.num("+")?))
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' unary)?   (right-associative)
    fn power(&mut self) -> Result<Value, EvalError> {
        let base = self.atom()?;
        if matches!(self.peek(), Some(Token::Power)) {
            self.pos += 1;
            let exp = self.unary()?.num("**")?;
            return Ok(Value::Num(base.num("**")?.powf(exp)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Value, EvalError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(Value::Num(n)),
            Some(Token::LParen) => {
                let inner = self.comparison()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Some(Token::RParen)) {
                        loop {
                            args.push(self.comparison()?.num(&name)?);
                            if matches!(self.peek(), Some(Token::Comma)) {
                                self.pos += 1;
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    apply(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(t) => Err(EvalError::UnexpectedToken(format!("{t:?}"))),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

fn constant(name: &str) -> Result<Value, EvalError> {
    match name {
        "pi" => Ok(Value::Num(std::f64::consts::PI)),
        "e" => Ok(Value::Num(std::f64::consts::E)),
        "tau" => Ok(Value::Num(std::f64::consts::TAU)),
        other => Err(EvalError::UnknownIdent(other.to_string())),
    }
}

fn check_arity(name: &'static str, expected: usize, got: usize) -> Result<(), EvalError> {
    if expected == got {
        Ok(())
    } else {
        Err(EvalError::WrongArity(name, expected, got))
    }
}

/// Whitelisted function dispatch. Anything not matched here does not exist as
/// far as callers are concerned.
fn apply(name: &str, args: &[f64]) -> Result<Value, EvalError> {
    let unary = |name: &'static str, f: fn(f64) -> f64| -> Result<Value, EvalError> {
        check_arity(name, 1, args.len())?;
        Ok(Value::Num(f(args[0])))
    };
    let binary = |name: &'static str, f: fn(f64, f64) -> f64| -> Result<Value, EvalError> {
        check_arity(name, 2, args.len())?;
        Ok(Value::Num(f(args[0], args[1])))
    };

    match name {
        "abs" => unary("abs", f64::abs),
        "sqrt" => unary("sqrt", f64::sqrt),
        "cbrt" => unary("cbrt", f64::cbrt),
        "exp" => unary("exp", f64::exp),
        "ln" | "log" => unary("log", f64::ln),
        "log10" => unary("log10", f64::log10),
        "log2" => unary("log2", f64::log2),
        "sin" => unary("sin", f64::sin),
        "cos" => unary("cos", f64::cos),
        "tan" => unary("tan", f64::tan),
        "asin" => unary("asin", f64::asin),
        "acos" => unary("acos", f64::acos),
        "atan" => unary("atan", f64::atan),
        "sinh" => unary("sinh", f64::sinh),
        "cosh" => unary("cosh", f64::cosh),
        "tanh" => unary("tanh", f64::tanh),
        "floor" => unary("floor", f64::floor),
        "ceil" => unary("ceil", f64::ceil),
        "round" => unary("round", f64::round),
        "degrees" => unary("degrees", f64::to_degrees),
        "radians" => unary("radians", f64::to_radians),
        "atan2" => binary("atan2", f64::atan2),
        "pow" => binary("pow", f64::powf),
        "hypot" => binary("hypot", f64::hypot),
        "min" => binary("min", f64::min),
        "max" => binary("max", f64::max),
        "random" => {
            check_arity("random", 0, args.len())?;
            Ok(Value::Num(rand::random::<f64>()))
        }
        "uniform" => {
            check_arity("uniform", 2, args.len())?;
            let (a, b) = (args[0], args[1]);
            Ok(Value::Num(a + (b - a) * rand::random::<f64>()))
        }
        other => Err(EvalError::UnknownIdent(other.to_string())),
    }
}

/// Evaluate an expression against the whitelist.
pub fn evaluate(expression: &str) -> Result<Value, EvalError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(EvalError::UnexpectedEnd);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.comparison()?;
    if parser.peek().is_some() {
        return Err(EvalError::UnexpectedToken(format!("{:?}", parser.peek().unwrap())));
    }
    if let Value::Num(n) = value {
        if !n.is_finite() {
            return Err(EvalError::NotFinite);
        }
    }
    Ok(value)
}

fn value_to_json(value: Value) -> Json {
    match value {
        Value::Bool(b) => json!(b),
        Value::Num(n) => {
            // Integral results come back as JSON integers: 2+2 is 4, not 4.0
            if n.fract() == 0.0 && n.abs() < 9e15 {
                json!(n as i64)
            } else {
                json!(n)
            }
        }
    }
}

// ==================== calculate ====================

pub struct CalcTool;

impl Tool for CalcTool {
    fn name(&self) -> &'static str { "calculate" }
    fn description(&self) -> &'static str {
        "Evaluate a mathematical expression (arithmetic, comparisons, math functions, random)"
    }

    fn schema(&self) -> Json {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {"type": "string", "description": "Expression, e.g. 'sqrt(2) * 10'"}
            },
            "required": ["expression"]
        })
    }

    fn execute(&self, args: Json) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            #[derive(Deserialize)]
            struct Args {
                expression: String,
            }
            let args: Args = match serde_json::from_value(args) {
                Ok(a) => a,
                Err(e) => return ToolResult::err(format!("Invalid args: {e}")),
            };

            match evaluate(&args.expression) {
                Ok(value) => {
                    tracing::info!("calculate: {} = {}", args.expression, value);
                    ToolResult::ok(json!({"result": value_to_json(value)}))
                }
                Err(e) => ToolResult::err(e.to_string()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(expression: &str) -> f64 {
        match evaluate(expression).unwrap() {
            Value::Num(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic() {
        assert_eq!(num("2+2"), 4.0);
        assert_eq!(num("2 * (3 + 4)"), 14.0);
        assert_eq!(num("10 % 3"), 1.0);
        assert_eq!(num("7 / 2"), 3.5);
    }

    #[test]
    fn precedence_and_unary() {
        assert_eq!(num("2 + 3 * 4"), 14.0);
        assert_eq!(num("-2**2"), -4.0);
        assert_eq!(num("2**-1"), 0.5);
        assert_eq!(num("2^10"), 1024.0);
        assert_eq!(num("--3"), 3.0);
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(num("sqrt(16)"), 4.0);
        assert_eq!(num("min(3, 5) + max(1, 2)"), 5.0);
        assert!((num("sin(pi)")).abs() < 1e-12);
        assert!((num("log(e)") - 1.0).abs() < 1e-12);
        assert_eq!(num("pow(2, 8)"), 256.0);
        assert_eq!(num("2e3"), 2000.0);
    }

    #[test]
    fn comparisons() {
        assert_eq!(evaluate("2 < 3").unwrap(), Value::Bool(true));
        assert_eq!(evaluate("2 >= 3").unwrap(), Value::Bool(false));
        assert_eq!(evaluate("1 + 1 == 2").unwrap(), Value::Bool(true));
    }

    #[test]
    fn random_in_range() {
        for _ in 0..50 {
            let n = num("random()");
            assert!((0.0..1.0).contains(&n));
        }
        let n = num("uniform(5, 6)");
        assert!((5.0..6.0).contains(&n));
    }

    #[test]
    fn disallowed_names_fail() {
        assert!(evaluate("__import__('os')").is_err());
        assert!(evaluate("open('/etc/passwd')").is_err());
        assert!(evaluate("exec(1)").is_err());
        assert!(evaluate("foo").is_err());
    }

    #[test]
    fn malformed_input_fails() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1").is_err());
        assert!(evaluate("1 2").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("2 = 2").is_err());
    }

    #[test]
    fn non_finite_results_fail() {
        assert!(evaluate("1/0").is_err());
        assert!(evaluate("log(-1)").is_err());
    }

    #[test]
    fn arity_checked() {
        assert!(evaluate("sqrt(1, 2)").is_err());
        assert!(evaluate("pow(2)").is_err());
        assert!(evaluate("random(1)").is_err());
    }

    #[test]
    fn integral_results_serialize_as_integers() {
        assert_eq!(value_to_json(Value::Num(4.0)), serde_json::json!(4));
        assert_eq!(value_to_json(Value::Num(3.5)), serde_json::json!(3.5));
        assert_eq!(value_to_json(Value::Bool(true)), serde_json::json!(true));
    }
}
