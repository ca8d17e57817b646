//! A small sandboxed expression interpreter (spec §3.3, §9 "replace `eval`
//! of user expressions"). Parses once at construction time; interprets per
//! row. The evaluation environment exposes only the row's columns and pure
//! arithmetic/comparison operators — no process state, filesystem, or time.

use crate::row::{Row, Scalar};
use std::fmt;

/// A parsed, side-effect-free boolean expression over a declared set of
/// columns, e.g. `age > 30 AND status = 'active'`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub source: String,
    node: Node,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Column(String),
    Const(Scalar),
    BinOp(BinOp, Box<Node>, Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expression parse error: {}", self.0)
    }
}

impl Expr {
    /// Parses `source` once. Only identifiers (column references), numeric
    /// and string literals, `+ - * /`, comparisons, and `AND`/`OR`/`NOT` are
    /// recognized; anything else is a parse error so it can never reach
    /// `eval_bool` as a smuggled side effect.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let node = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(ParseError(format!("trailing input at token {}", parser.pos)));
        }
        Ok(Expr {
            source: source.to_string(),
            node,
        })
    }

    /// If this expression is a single comparison `column OP const`, returns
    /// its pieces — used by the condition optimizer's simplify-expressions
    /// pass (spec §4.9 pass 2) to rewrite it as a `Simple` condition.
    pub fn as_single_comparison(&self) -> Option<(&str, crate::condition::Operator, &Scalar)> {
        use crate::condition::Operator;
        if let Node::BinOp(op, lhs, rhs) = &self.node {
            if let (Node::Column(c), Node::Const(v)) = (lhs.as_ref(), rhs.as_ref()) {
                let op = match op {
                    BinOp::Eq => Operator::Eq,
                    BinOp::Ne => Operator::Ne,
                    BinOp::Lt => Operator::Lt,
                    BinOp::Le => Operator::Le,
                    BinOp::Gt => Operator::Gt,
                    BinOp::Ge => Operator::Ge,
                    _ => return None,
                };
                return Some((c.as_str(), op, v));
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Num(f64),
    Str(String),
    Op(String),
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
        } else if c == '\'' {
            let mut j = i + 1;
            let mut s = String::new();
            while j < chars.len() && chars[j] != '\'' {
                s.push(chars[j]);
                j += 1;
            }
            if j >= chars.len() {
                return Err(ParseError("unterminated string literal".into()));
            }
            tokens.push(Token::Str(s));
            i = j + 1;
        } else if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())) {
            let mut j = i + 1;
            while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '.') {
                j += 1;
            }
            let text: String = chars[i..j].iter().collect();
            let n: f64 = text
                .parse()
                .map_err(|_| ParseError(format!("bad number literal: {}", text)))?;
            tokens.push(Token::Num(n));
            i = j;
        } else if c.is_alphabetic() || c == '_' {
            let mut j = i + 1;
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let word: String = chars[i..j].iter().collect();
            match word.to_uppercase().as_str() {
                "AND" | "OR" | "NOT" => tokens.push(Token::Op(word.to_uppercase())),
                _ => tokens.push(Token::Ident(word)),
            }
            i = j;
        } else {
            // two-char operators first
            let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            if ["==", "!=", "<=", ">="].contains(&two.as_str()) {
                tokens.push(Token::Op(if two == "==" { "=".to_string() } else { two }));
                i += 2;
            } else if "+-*/=<>".contains(c) {
                tokens.push(Token::Op(c.to_string()));
                i += 1;
            } else {
                return Err(ParseError(format!("unexpected character {:?}", c)));
            }
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

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn parse_or(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Op(op)) if op == "OR") {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Node::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_not()?;
        while matches!(self.peek(), Some(Token::Op(op)) if op == "AND") {
            self.bump();
            let rhs = self.parse_not()?;
            lhs = Node::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Node, ParseError> {
        if matches!(self.peek(), Some(Token::Op(op)) if op == "NOT") {
            self.bump();
            let inner = self.parse_not()?;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::Op(op)) if ["=", "!=", "<", "<=", ">", ">="].contains(&op.as_str()) => {
                op.clone()
            }
            _ => return Ok(lhs),
        };
        self.bump();
        let rhs = self.parse_additive()?;
        let binop = match op.as_str() {
            "=" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            _ => unreachable!(),
        };
        Ok(Node::BinOp(binop, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_additive(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(op)) if op == "+" || op == "-" => op.clone(),
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            let binop = if op == "+" { BinOp::Add } else { BinOp::Sub };
            lhs = Node::BinOp(binop, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(op)) if op == "*" || op == "/" => op.clone(),
                _ => break,
            };
            self.bump();
            let rhs = self.parse_primary()?;
            let binop = if op == "*" { BinOp::Mul } else { BinOp::Div };
            lhs = Node::BinOp(binop, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        match self.bump() {
            Some(Token::Ident(name)) => Ok(Node::Column(name)),
            Some(Token::Num(n)) => Ok(Node::Const(Scalar::Float(n))),
            Some(Token::Str(s)) => Ok(Node::Const(Scalar::Str(s))),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ParseError("expected closing paren".into())),
                }
            }
            other => Err(ParseError(format!("unexpected token: {:?}", other))),
        }
    }
}

/// Evaluates `expr` against `row`, returning `None` on any evaluation gap
/// (missing column, type mismatch) — callers map `None` to `false` (spec
/// §3.3, §7 `EvaluationError`).
pub fn eval_bool(expr: &Expr, row: &Row) -> Option<bool> {
    eval_node(&expr.node, row).and_then(|v| match v {
        Value::Bool(b) => Some(b),
        _ => None,
    })
}

enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
}

fn eval_node(node: &Node, row: &Row) -> Option<Value> {
    match node {
        Node::Column(name) => match row.get(name)? {
            Scalar::Int(i) => Some(Value::Num(*i as f64)),
            Scalar::Float(f) => Some(Value::Num(*f)),
            Scalar::Bool(b) => Some(Value::Bool(*b)),
            Scalar::Str(s) => Some(Value::Str(s.clone())),
            Scalar::Null => None,
        },
        Node::Const(Scalar::Float(n)) => Some(Value::Num(*n)),
        Node::Const(Scalar::Str(s)) => Some(Value::Str(s.clone())),
        Node::Const(Scalar::Int(i)) => Some(Value::Num(*i as f64)),
        Node::Const(Scalar::Bool(b)) => Some(Value::Bool(*b)),
        Node::Const(Scalar::Null) => None,
        Node::And(a, b) => {
            let a = as_bool(eval_node(a, row)?)?;
            let b = as_bool(eval_node(b, row)?)?;
            Some(Value::Bool(a && b))
        }
        Node::Or(a, b) => {
            let a = as_bool(eval_node(a, row)?)?;
            let b = as_bool(eval_node(b, row)?)?;
            Some(Value::Bool(a || b))
        }
        Node::Not(a) => {
            let a = as_bool(eval_node(a, row)?)?;
            Some(Value::Bool(!a))
        }
        Node::BinOp(op, lhs, rhs) => {
            let lhs = eval_node(lhs, row)?;
            let rhs = eval_node(rhs, row)?;
            eval_binop(*op, lhs, rhs)
        }
    }
}

fn as_bool(v: Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(b),
        _ => None,
    }
}

fn eval_binop(op: BinOp, lhs: Value, rhs: Value) -> Option<Value> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
            let (a, b) = (as_num(lhs)?, as_num(rhs)?);
            let r = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div if b == 0.0 => return None,
                BinOp::Div => a / b,
                _ => unreachable!(),
            };
            Some(Value::Num(r))
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = match (lhs, rhs) {
                (Value::Num(a), Value::Num(b)) => a.partial_cmp(&b)?,
                (Value::Str(a), Value::Str(b)) => a.cmp(&b),
                (Value::Bool(a), Value::Bool(b)) => a.cmp(&b),
                _ => return None,
            };
            let r = match op {
                BinOp::Eq => ord.is_eq(),
                BinOp::Ne => ord.is_ne(),
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                BinOp::Ge => ord.is_ge(),
                _ => unreachable!(),
            };
            Some(Value::Bool(r))
        }
    }
}

fn as_num(v: Value) -> Option<f64> {
    match v {
        Value::Num(n) => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod expr_test;
