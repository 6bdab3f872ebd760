/*
 * condition.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Boolean conditions for `if` attributes.
//!
//! ```text
//! EXPR  := OR
//! OR    := AND ('OR' AND)*
//! AND   := UNARY ('AND' UNARY)*
//! UNARY := 'NOT' UNARY | '(' EXPR ')' | TEST
//! TEST  := QUANT '(' PRED [OP VALUE] ')'
//! QUANT := any | every | none
//! OP    := == | != | starts | ends | contains | > | < | >= | <= | regex
//! VALUE := 'string' | "string" | number | PRED
//! ```
//!
//! A test looks at the statements of the current node for one predicate.
//! Tests are evaluated as soon as they are parsed, so every test in a
//! condition is evaluated once, and the resulting tree only combines
//! booleans.

use crate::context::EvalContext;
use crate::error::{ConditionError, TemplateError, TemplateResult};
use crate::path::Segment;
use crate::value::compare_values;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// At least one statement matches.
    Any,
    /// Every statement matches (true when there are none).
    Every,
    /// No statement matches.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Starts,
    Ends,
    Contains,
    Gt,
    Lt,
    Ge,
    Le,
    Regex,
}

impl Operator {
    fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Starts => "starts",
            Operator::Ends => "ends",
            Operator::Contains => "contains",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Regex => "regex",
        }
    }

    fn holds(self, value: &str, operand: &str) -> bool {
        match self {
            Operator::Eq => compare_values(value, operand) == Ordering::Equal,
            Operator::Ne => compare_values(value, operand) != Ordering::Equal,
            Operator::Starts => value.starts_with(operand),
            Operator::Ends => value.ends_with(operand),
            Operator::Contains => value.contains(operand),
            Operator::Gt => compare_values(value, operand) == Ordering::Greater,
            Operator::Lt => compare_values(value, operand) == Ordering::Less,
            Operator::Ge => compare_values(value, operand) != Ordering::Less,
            Operator::Le => compare_values(value, operand) != Ordering::Greater,
            // compiled separately
            Operator::Regex => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Quantifier(Quantifier),
    And,
    Or,
    Not,
    LParen,
    RParen,
    Op(Operator),
    Str(String),
    Number(String),
    Predicate(String),
}

impl Token {
    fn starts_operand(&self) -> bool {
        matches!(self, Token::Quantifier(_) | Token::Not | Token::LParen)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Quantifier(Quantifier::Any) => write!(f, "'any'"),
            Token::Quantifier(Quantifier::Every) => write!(f, "'every'"),
            Token::Quantifier(Quantifier::None) => write!(f, "'none'"),
            Token::And => write!(f, "'AND'"),
            Token::Or => write!(f, "'OR'"),
            Token::Not => write!(f, "'NOT'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Op(op) => write!(f, "'{}'", op.symbol()),
            Token::Str(s) => write!(f, "string '{}'", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Predicate(p) => write!(f, "predicate {}", p),
        }
    }
}

/// Characters that end a bare word.
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '"' | '=' | '!' | '<' | '>')
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ConditionError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some(c) = text[pos..].chars().next() {
        let rest = &text[pos..];
        let start = pos;
        let (token, len) = match c {
            c if c.is_whitespace() => {
                pos += c.len_utf8();
                continue;
            }
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '\'' | '"' => {
                let (value, len) = read_string(rest, c).ok_or(ConditionError::UnterminatedString {
                    offset: start,
                })?;
                (Token::Str(value), len)
            }
            '=' | '!' => {
                if !rest[1..].starts_with('=') {
                    return Err(ConditionError::UnexpectedCharacter {
                        found: c,
                        offset: start,
                    });
                }
                let op = if c == '=' { Operator::Eq } else { Operator::Ne };
                (Token::Op(op), 2)
            }
            '>' if rest[1..].starts_with('=') => (Token::Op(Operator::Ge), 2),
            '>' => (Token::Op(Operator::Gt), 1),
            '<' if rest[1..].starts_with('=') => (Token::Op(Operator::Le), 2),
            '<' => match iri_length(rest) {
                Some(len) => (Token::Predicate(rest[..len].to_string()), len),
                None => (Token::Op(Operator::Lt), 1),
            },
            _ => {
                let len = rest.find(is_delimiter).unwrap_or(rest.len());
                (classify(&rest[..len])?, len)
            }
        };
        tokens.push((token, start));
        pos += len;
    }
    Ok(tokens)
}

/// Read a quoted string starting at `text[0] == quote`. Backslash escapes
/// the next character. Returns the value and the consumed length.
fn read_string(text: &str, quote: char) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some((value, i + c.len_utf8()));
        } else {
            value.push(c);
        }
    }
    None
}

/// Length of a `<iri>` at the start of `text`, if it is one rather than a
/// less-than operator.
fn iri_length(text: &str) -> Option<usize> {
    let body = &text[1..];
    if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = body.find(|c: char| c == '>' || c.is_whitespace())?;
    let iri = &body[..end];
    (body[end..].starts_with('>') && iri.contains(':')).then_some(end + 2)
}

fn classify(word: &str) -> Result<Token, ConditionError> {
    let token = match word.to_ascii_lowercase().as_str() {
        "any" => Token::Quantifier(Quantifier::Any),
        "every" => Token::Quantifier(Quantifier::Every),
        "none" => Token::Quantifier(Quantifier::None),
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "starts" => Token::Op(Operator::Starts),
        "ends" => Token::Op(Operator::Ends),
        "contains" => Token::Op(Operator::Contains),
        "regex" => Token::Op(Operator::Regex),
        _ if word.parse::<f64>().is_ok() => Token::Number(word.to_string()),
        _ if word.contains(':') || word.starts_with(['/', '^']) => Token::Predicate(word.to_string()),
        _ => {
            return Err(ConditionError::UnknownWord {
                word: word.to_string(),
            });
        }
    };
    Ok(token)
}

/// A parsed condition. Tests carry the result they evaluated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Leaf { text: String, value: bool },
    Not(Box<Condition>),
    Group(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Parse `text`, evaluating each test against the current node.
    pub fn parse(text: &str, ctx: &mut EvalContext) -> TemplateResult<Self> {
        let wrap = |source: ConditionError| TemplateError::Condition {
            expression: text.to_string(),
            source,
        };
        let tokens = tokenize(text).map_err(wrap)?;
        let mut parser = Parser {
            text,
            tokens,
            pos: 0,
            ctx,
        };
        let condition = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            let err = if token.starts_operand() {
                ConditionError::TooManyOperands {
                    found: token.to_string(),
                }
            } else {
                ConditionError::Expected {
                    expected: "AND, OR or end of condition".to_string(),
                    found: token.to_string(),
                }
            };
            return Err(wrap(err));
        }
        Ok(condition)
    }

    pub fn value(&self) -> bool {
        match self {
            Condition::Leaf { value, .. } => *value,
            Condition::Not(inner) => !inner.value(),
            Condition::Group(inner) => inner.value(),
            Condition::And(a, b) => a.value() && b.value(),
            Condition::Or(a, b) => a.value() || b.value(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf { text, value } => write!(f, "{}={}", text, value),
            Condition::Not(inner) => write!(f, "NOT {}", inner),
            Condition::Group(inner) => write!(f, "({})", inner),
            Condition::And(a, b) => write!(f, "{} AND {}", a, b),
            Condition::Or(a, b) => write!(f, "{} OR {}", a, b),
        }
    }
}

/// Evaluate an `if` attribute. An empty condition is true.
pub fn evaluate_condition(text: &str, ctx: &mut EvalContext) -> TemplateResult<bool> {
    if text.trim().is_empty() {
        return Ok(true);
    }
    let condition = Condition::parse(text, ctx)?;
    let value = condition.value();
    trace!(condition = %condition, value, "evaluated condition");
    Ok(value)
}

/// Right-hand side of a comparison.
enum Operand {
    Text(String),
    /// Values of a predicate on the current node; any of them may match.
    Values(Vec<String>),
    Pattern(Regex),
}

struct Parser<'t, 'c, 'a> {
    text: &'t str,
    tokens: Vec<(Token, usize)>,
    pos: usize,
    ctx: &'c mut EvalContext<'a>,
}

impl Parser<'_, '_, '_> {
    fn error(&self, source: ConditionError) -> TemplateError {
        TemplateError::Condition {
            expression: self.text.to_string(),
            source,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn found(&self) -> String {
        self.peek()
            .map_or_else(|| "end of condition".to_string(), |t| t.to_string())
    }

    fn expect(&mut self, expected: &Token, what: &str) -> TemplateResult<usize> {
        match self.tokens.get(self.pos) {
            Some((token, offset)) if token == expected => {
                let offset = *offset;
                self.pos += 1;
                Ok(offset)
            }
            Some((token, _)) if token.starts_operand() => {
                Err(self.error(ConditionError::TooManyOperands {
                    found: token.to_string(),
                }))
            }
            _ => Err(self.error(ConditionError::Expected {
                expected: what.to_string(),
                found: self.found(),
            })),
        }
    }

    fn parse_or(&mut self) -> TemplateResult<Condition> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> TemplateResult<Condition> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_unary()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> TemplateResult<Condition> {
        match self.peek() {
            Some(Token::Not) => {
                self.advance();
                Ok(Condition::Not(Box::new(self.parse_unary()?)))
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_or()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(Condition::Group(Box::new(inner)))
            }
            Some(Token::Quantifier(_)) => self.parse_test(),
            _ => Err(self.error(ConditionError::Expected {
                expected: "a test, NOT or '('".to_string(),
                found: self.found(),
            })),
        }
    }

    fn parse_test(&mut self) -> TemplateResult<Condition> {
        let Some((Token::Quantifier(quantifier), start)) = self.advance() else {
            return Err(self.error(ConditionError::Expected {
                expected: "any, every or none".to_string(),
                found: self.found(),
            }));
        };
        self.expect(&Token::LParen, "'('")?;

        let segment = match self.advance() {
            Some((Token::Predicate(name), _)) => self.segment(&name)?,
            other => {
                return Err(self.error(ConditionError::Expected {
                    expected: "predicate".to_string(),
                    found: other.map_or_else(|| "end of condition".to_string(), |(t, _)| t.to_string()),
                }));
            }
        };

        let comparison = match self.peek() {
            Some(Token::Op(op)) => {
                let op = *op;
                self.advance();
                let operand = self.operand(op, &segment)?;
                Some((op, operand))
            }
            _ => None,
        };
        let end = self.expect(&Token::RParen, "')'")?;

        let values = self.values(&segment)?;
        let value = match quantifier {
            Quantifier::Any => values.iter().any(|v| satisfies(v, comparison.as_ref())),
            Quantifier::Every => values.iter().all(|v| satisfies(v, comparison.as_ref())),
            Quantifier::None => !values.iter().any(|v| satisfies(v, comparison.as_ref())),
        };
        Ok(Condition::Leaf {
            text: self.text[start..=end].to_string(),
            value,
        })
    }

    fn segment(&self, name: &str) -> TemplateResult<Segment> {
        let name = name.strip_prefix('/').unwrap_or(name);
        let segment = Segment::parse(name, &self.ctx.format.prefixes)
            .map_err(|e| self.error(ConditionError::Path(e)))?;
        if segment.recursive {
            return Err(self.error(ConditionError::Expected {
                expected: "a single predicate".to_string(),
                found: format!("recursive predicate {}", name),
            }));
        }
        Ok(segment)
    }

    fn operand(&mut self, op: Operator, segment: &Segment) -> TemplateResult<Operand> {
        let missing = || ConditionError::MissingValue {
            operator: op.symbol().to_string(),
        };
        let (token, _) = self.advance().ok_or_else(|| self.error(missing()))?;
        match (op, token) {
            (Operator::Regex, Token::Str(pattern) | Token::Number(pattern)) => Regex::new(&pattern)
                .map(Operand::Pattern)
                .map_err(|e| {
                    self.error(ConditionError::InvalidRegex {
                        pattern,
                        message: e.to_string(),
                    })
                }),
            (Operator::Regex, _) => Err(self.error(missing())),
            (_, Token::Str(text) | Token::Number(text)) => Ok(Operand::Text(text)),
            (_, Token::Predicate(name)) => {
                let rhs = self.segment(&name)?;
                let values = self.values(&rhs)?;
                trace!(lhs = %segment, rhs = %rhs, values = values.len(), "predicate operand");
                Ok(Operand::Values(values))
            }
            (_, _) => Err(self.error(missing())),
        }
    }

    /// Values of `segment` on the current node.
    fn values(&mut self, segment: &Segment) -> TemplateResult<Vec<String>> {
        let node = self.ctx.current_node().clone();
        self.ctx.graph.ensure_loaded(
            std::slice::from_ref(&node),
            &segment.predicate,
            segment.inverse,
            false,
        )?;
        Ok(self
            .ctx
            .graph
            .neighbours(&node, &segment.predicate, segment.inverse)
            .into_iter()
            .map(|term| term.as_str().to_string())
            .collect())
    }
}

fn satisfies(value: &str, comparison: Option<&(Operator, Operand)>) -> bool {
    let Some((op, operand)) = comparison else {
        return true;
    };
    match operand {
        Operand::Text(text) => op.holds(value, text),
        Operand::Values(values) => values.iter().any(|v| op.holds(value, v)),
        Operand::Pattern(re) => re.is_match(value),
    }
}
