// ABOUTME: A compact XPath 1.0 subset compiled once and evaluated over a parsed Document.
// ABOUTME: Supports child/descendant steps, name tests and id/attribute/position predicates.

//! Structural path queries.
//!
//! Supported grammar (element-selecting paths only):
//!
//! ```text
//! path       := ('/' | '//') step (('/' | '//') step)*
//! step       := '.' | '..' | ('*' | NAME) predicate*
//! predicate  := '[' or_expr ']'
//! or_expr    := and_expr ('or' and_expr)*
//! and_expr   := unary ('and' unary)*
//! unary      := 'not' '(' or_expr ')' | '(' or_expr ')' | test
//! test       := ('contains' | 'starts-with') '(' value ',' value ')'
//!             | value (cmp value)?
//! value      := '@' NAME | LITERAL | NUMBER | '.' | 'text()' | 'position()'
//!             | 'last()' | 'normalize-space(' value? ')'
//! cmp        := '=' | '!=' | '<' | '<=' | '>' | '>='
//! ```
//!
//! A bare number or `last()` predicate is positional. Positions count the
//! candidates under one parent, so `//li[1]` is every list's first item.

use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use scraper::ElementRef;

use crate::dom::{normalize_whitespace, Document, Node};

/// Raised when a path expression cannot be compiled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct XPathError {
    pub message: String,
    pub offset: usize,
}

impl XPathError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// A compiled path expression.
#[derive(Debug, Clone)]
pub struct XPath {
    steps: Vec<Step>,
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    Descendant,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(Value, CmpOp, Value),
    Exists(Value),
    Contains(Value, Value),
    StartsWith(Value, Value),
}

#[derive(Debug, Clone)]
enum Value {
    Attr(String),
    Literal(String),
    Number(f64),
    StringValue,
    Text,
    Position,
    Last,
    NormalizeSpace(Box<Value>),
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

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    Star,
    Cmp(CmpOp),
    Name(String),
    Literal(String),
    Number(f64),
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, XPathError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let peek = chars.get(i + 1).map(|(_, c)| *c);
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '/' if peek == Some('/') => {
                i += 2;
                Token::DoubleSlash
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '[' => {
                i += 1;
                Token::LBracket
            }
            ']' => {
                i += 1;
                Token::RBracket
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '@' => {
                i += 1;
                Token::At
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            '*' => {
                i += 1;
                Token::Star
            }
            '=' => {
                i += 1;
                Token::Cmp(CmpOp::Eq)
            }
            '!' if peek == Some('=') => {
                i += 2;
                Token::Cmp(CmpOp::Ne)
            }
            '<' if peek == Some('=') => {
                i += 2;
                Token::Cmp(CmpOp::Le)
            }
            '<' => {
                i += 1;
                Token::Cmp(CmpOp::Lt)
            }
            '>' if peek == Some('=') => {
                i += 2;
                Token::Cmp(CmpOp::Ge)
            }
            '>' => {
                i += 1;
                Token::Cmp(CmpOp::Gt)
            }
            '.' if peek == Some('.') => {
                i += 2;
                Token::DotDot
            }
            '.' if !peek.is_some_and(|p| p.is_ascii_digit()) => {
                i += 1;
                Token::Dot
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end].1 != quote {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(XPathError::new("unterminated string literal", offset));
                }
                let literal: String = chars[start..end].iter().map(|(_, c)| *c).collect();
                i = end + 1;
                Token::Literal(literal)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                let n = raw
                    .parse::<f64>()
                    .map_err(|_| XPathError::new(format!("invalid number {raw:?}"), offset))?;
                Token::Number(n)
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() {
                    let ch = chars[i].1;
                    if ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == ':' {
                        i += 1;
                    } else if ch == '.' && chars.get(i + 1).is_some_and(|(_, n)| n.is_alphanumeric()) {
                        i += 1;
                    } else {
                        break;
                    }
                }
                Token::Name(chars[start..i].iter().map(|(_, c)| *c).collect())
            }
            other => {
                return Err(XPathError::new(
                    format!("unexpected character {other:?}"),
                    offset,
                ))
            }
        };
        tokens.push((offset, token));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.end)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), XPathError> {
        let offset = self.offset();
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(XPathError::new(
                format!("expected {expected:?}, found {t:?}"),
                offset,
            )),
            None => Err(XPathError::new(
                format!("expected {expected:?}, found end of expression"),
                offset,
            )),
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(n)) if n == word)
    }

    fn is_call(&self, name: &str) -> bool {
        self.is_keyword(name) && self.peek_at(1) == Some(&Token::LParen)
    }

    fn parse_path(&mut self) -> Result<Vec<Step>, XPathError> {
        let mut steps = Vec::new();
        loop {
            let offset = self.offset();
            let axis = match self.next() {
                Some(Token::Slash) => Axis::Child,
                Some(Token::DoubleSlash) => Axis::Descendant,
                None if !steps.is_empty() => break,
                None => return Err(XPathError::new("empty expression", offset)),
                Some(t) => {
                    let message = if steps.is_empty() {
                        format!("path must start with '/' or '//', found {t:?}")
                    } else {
                        format!("expected '/' or '//' between steps, found {t:?}")
                    };
                    return Err(XPathError::new(message, offset));
                }
            };
            steps.push(self.parse_step(axis)?);
        }
        Ok(steps)
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, XPathError> {
        let offset = self.offset();
        let (axis, test) = match self.next() {
            Some(Token::Dot) if axis == Axis::Child => (Axis::SelfNode, NameTest::Any),
            Some(Token::DotDot) if axis == Axis::Child => (Axis::Parent, NameTest::Any),
            Some(Token::Star) => (axis, NameTest::Any),
            Some(Token::Name(name)) if self.peek() != Some(&Token::LParen) => {
                (axis, NameTest::Name(name.to_lowercase()))
            }
            Some(Token::Name(name)) => {
                return Err(XPathError::new(
                    format!("{name}() steps are not supported; paths must select elements"),
                    offset,
                ))
            }
            Some(Token::At) => {
                return Err(XPathError::new(
                    "attribute steps are not supported; paths must select elements",
                    offset,
                ))
            }
            Some(t) => return Err(XPathError::new(format!("unexpected {t:?} in step"), offset)),
            None => return Err(XPathError::new("expression ends after '/'", offset)),
        };

        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            if matches!(axis, Axis::SelfNode | Axis::Parent) {
                return Err(XPathError::new(
                    "predicates on '.' or '..' are not supported",
                    self.offset(),
                ));
            }
            self.next();
            predicates.push(self.parse_or()?);
            self.expect(Token::RBracket)?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and()?;
        while self.is_keyword("or") {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_unary()?;
        while self.is_keyword("and") {
            self.next();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, XPathError> {
        if self.is_call("not") {
            self.next();
            self.next();
            let inner = self.parse_or()?;
            self.expect(Token::RParen)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        if self.peek() == Some(&Token::LParen) {
            self.next();
            let inner = self.parse_or()?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }
        self.parse_test()
    }

    fn parse_test(&mut self) -> Result<Expr, XPathError> {
        for (name, is_contains) in [("contains", true), ("starts-with", false)] {
            if self.is_call(name) {
                self.next();
                self.next();
                let haystack = self.parse_value()?;
                self.expect(Token::Comma)?;
                let needle = self.parse_value()?;
                self.expect(Token::RParen)?;
                return Ok(if is_contains {
                    Expr::Contains(haystack, needle)
                } else {
                    Expr::StartsWith(haystack, needle)
                });
            }
        }

        let left = self.parse_value()?;
        if let Some(Token::Cmp(op)) = self.peek() {
            let op = *op;
            self.next();
            let right = self.parse_value()?;
            return Ok(Expr::Compare(left, op, right));
        }

        Ok(match left {
            Value::Number(_) | Value::Last => Expr::Compare(Value::Position, CmpOp::Eq, left),
            other => Expr::Exists(other),
        })
    }

    fn parse_value(&mut self) -> Result<Value, XPathError> {
        let offset = self.offset();
        match self.next() {
            Some(Token::At) => match self.next() {
                Some(Token::Name(name)) => Ok(Value::Attr(name.to_lowercase())),
                _ => Err(XPathError::new("expected attribute name after '@'", offset)),
            },
            Some(Token::Literal(s)) => Ok(Value::Literal(s)),
            Some(Token::Number(n)) => Ok(Value::Number(n)),
            Some(Token::Dot) => Ok(Value::StringValue),
            Some(Token::Name(name)) if self.peek() == Some(&Token::LParen) => {
                self.next();
                let value = match name.as_str() {
                    "text" => Value::Text,
                    "position" => Value::Position,
                    "last" => Value::Last,
                    "normalize-space" => {
                        if self.peek() == Some(&Token::RParen) {
                            Value::NormalizeSpace(Box::new(Value::StringValue))
                        } else {
                            Value::NormalizeSpace(Box::new(self.parse_value()?))
                        }
                    }
                    other => {
                        return Err(XPathError::new(
                            format!("unsupported function {other}()"),
                            offset,
                        ))
                    }
                };
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Name(name)) => Err(XPathError::new(
                format!("relative paths ({name}) are not supported inside predicates"),
                offset,
            )),
            Some(t) => Err(XPathError::new(format!("unexpected {t:?}"), offset)),
            None => Err(XPathError::new("unexpected end of expression", offset)),
        }
    }
}

/// Evaluation context for one candidate inside a predicate.
struct Context<'a> {
    el: ElementRef<'a>,
    position: usize,
    size: usize,
}

enum Scalar {
    Str(String),
    Num(f64),
}

impl Scalar {
    fn as_number(&self) -> f64 {
        match self {
            Scalar::Num(n) => *n,
            Scalar::Str(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }

    fn into_string(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Num(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", n as i64),
            Scalar::Num(n) => n.to_string(),
        }
    }
}

fn direct_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|c| c.value().as_text().map(|t| t.to_string()))
        .collect()
}

impl Value {
    /// `None` when the value refers to an attribute the element lacks.
    fn eval(&self, ctx: &Context<'_>) -> Option<Scalar> {
        match self {
            Value::Attr(name) => ctx.el.value().attr(name).map(|v| Scalar::Str(v.to_string())),
            Value::Literal(s) => Some(Scalar::Str(s.clone())),
            Value::Number(n) => Some(Scalar::Num(*n)),
            Value::StringValue => Some(Scalar::Str(ctx.el.text().collect())),
            Value::Text => Some(Scalar::Str(direct_text(ctx.el))),
            Value::Position => Some(Scalar::Num(ctx.position as f64)),
            Value::Last => Some(Scalar::Num(ctx.size as f64)),
            Value::NormalizeSpace(inner) => {
                let raw = inner.eval(ctx).map(Scalar::into_string).unwrap_or_default();
                Some(Scalar::Str(normalize_whitespace(&raw)))
            }
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Value::Number(_) | Value::Position | Value::Last)
    }

    fn string(&self, ctx: &Context<'_>) -> String {
        self.eval(ctx).map(Scalar::into_string).unwrap_or_default()
    }
}

impl Expr {
    fn matches(&self, ctx: &Context<'_>) -> bool {
        match self {
            Expr::Or(a, b) => a.matches(ctx) || b.matches(ctx),
            Expr::And(a, b) => a.matches(ctx) && b.matches(ctx),
            Expr::Not(inner) => !inner.matches(ctx),
            Expr::Exists(value) => match value {
                Value::Attr(name) => ctx.el.value().attr(name).is_some(),
                Value::Number(n) => *n != 0.0,
                other => !other.string(ctx).is_empty(),
            },
            Expr::Contains(haystack, needle) => {
                haystack.string(ctx).contains(needle.string(ctx).as_str())
            }
            Expr::StartsWith(haystack, needle) => {
                haystack.string(ctx).starts_with(needle.string(ctx).as_str())
            }
            Expr::Compare(left, op, right) => {
                let (Some(l), Some(r)) = (left.eval(ctx), right.eval(ctx)) else {
                    return false;
                };
                let numeric = left.is_numeric()
                    || right.is_numeric()
                    || !matches!(op, CmpOp::Eq | CmpOp::Ne);
                if numeric {
                    let (l, r) = (l.as_number(), r.as_number());
                    match op {
                        CmpOp::Eq => l == r,
                        CmpOp::Ne => l != r,
                        CmpOp::Lt => l < r,
                        CmpOp::Le => l <= r,
                        CmpOp::Gt => l > r,
                        CmpOp::Ge => l >= r,
                    }
                } else {
                    let (l, r) = (l.into_string(), r.into_string());
                    match op {
                        CmpOp::Ne => l != r,
                        _ => l == r,
                    }
                }
            }
        }
    }
}

impl NameTest {
    fn accepts(&self, el: &ElementRef<'_>) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Name(name) => el.value().name() == name,
        }
    }
}

impl Step {
    /// Children of `parent` passing the name test and every predicate in turn.
    fn select_children<'a>(&self, parent: NodeRef<'a, scraper::Node>) -> Vec<ElementRef<'a>> {
        let mut candidates: Vec<ElementRef<'a>> = parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| self.test.accepts(el))
            .collect();

        for predicate in &self.predicates {
            let size = candidates.len();
            candidates = candidates
                .into_iter()
                .enumerate()
                .filter(|(i, el)| {
                    predicate.matches(&Context {
                        el: *el,
                        position: i + 1,
                        size,
                    })
                })
                .map(|(_, el)| el)
                .collect();
        }
        candidates
    }
}

impl XPath {
    /// Compiles a path expression.
    pub fn compile(source: &str) -> Result<Self, XPathError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            end: source.len(),
        };
        let steps = parser.parse_path()?;
        Ok(Self { steps })
    }

    /// Evaluates the path against the whole document, returning elements in document order.
    pub fn select<'a>(&self, doc: &'a Document) -> Vec<Node<'a>> {
        let mut context: Vec<NodeRef<'a, scraper::Node>> = vec![doc.root()];

        for step in &self.steps {
            let mut seen: HashSet<NodeId> = HashSet::new();
            let mut next: Vec<NodeRef<'a, scraper::Node>> = Vec::new();
            let mut push = |node: NodeRef<'a, scraper::Node>| {
                if seen.insert(node.id()) {
                    next.push(node);
                }
            };

            for node in &context {
                match step.axis {
                    Axis::Child => {
                        for el in step.select_children(*node) {
                            push(*el);
                        }
                    }
                    Axis::Descendant => {
                        for parent in node.descendants() {
                            for el in step.select_children(parent) {
                                push(*el);
                            }
                        }
                    }
                    Axis::SelfNode => push(*node),
                    Axis::Parent => {
                        if let Some(parent) = node.parent() {
                            push(parent);
                        }
                    }
                }
            }

            if next.is_empty() {
                return Vec::new();
            }
            context = next;
        }

        let matched: HashSet<NodeId> = context.iter().map(|n| n.id()).collect();
        doc.root()
            .descendants()
            .filter(|n| matched.contains(&n.id()))
            .filter_map(ElementRef::wrap)
            .map(Node::new)
            .collect()
    }
}
