/*
 * path.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Path expressions.
//!
//! ```text
//! PATH    := '=' LITERAL | SPECIAL | ['/'] SEGMENT ('/' SEGMENT)*
//! SEGMENT := ['^'] PREDICATE ['*']
//! PREDICATE := prefix ':' local | '<' iri '>'
//! ```
//!
//! `^` walks a relation backwards, `*` follows it transitively. Paths start at
//! the current node (the top of the node reference stack).

use crate::context::EvalContext;
use crate::error::{PathError, TemplateResult};
use crate::value::URL_COMPONENT;
use chrono::{SecondsFormat, Utc};
use oaipmh_graph::{GraphCache, GraphResult, Term};
use percent_encoding::utf8_percent_encode;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::trace;

/// Built-in values that do not come from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    /// Current UTC time.
    Now,
    /// URI of the record's resource.
    Url,
    /// URL of the record's metadata.
    MetaUrl,
    /// OAI-PMH identifier of the record.
    OaiId,
    /// `GetRecord` request URL for the record in the current format.
    OaiUrl,
    /// A random unsigned integer.
    Random,
    /// Per-render counter starting at 1.
    Seq,
    /// The current node.
    Node,
}

impl Special {
    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "NOW" => Special::Now,
            "URL" => Special::Url,
            "METAURL" => Special::MetaUrl,
            "OAIID" => Special::OaiId,
            "OAIURL" => Special::OaiUrl,
            "RANDOM" => Special::Random,
            "SEQ" => Special::Seq,
            "NODE" => Special::Node,
            _ => return None,
        })
    }

    fn token(self) -> &'static str {
        match self {
            Special::Now => "NOW",
            Special::Url => "URL",
            Special::MetaUrl => "METAURL",
            Special::OaiId => "OAIID",
            Special::OaiUrl => "OAIURL",
            Special::Random => "RANDOM",
            Special::Seq => "SEQ",
            Special::Node => "NODE",
        }
    }

    fn value(self, ctx: &mut EvalContext) -> Term {
        let record = ctx.record;
        match self {
            Special::Now => Term::literal(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            Special::Url => Term::iri(record.subject.as_str()),
            Special::MetaUrl => Term::literal(record.metadata_url.as_str()),
            Special::OaiId => Term::literal(record.oai_id.as_str()),
            Special::OaiUrl => {
                let prefix = if record.metadata_prefix.is_empty() {
                    ctx.format.metadata_prefix.as_str()
                } else {
                    record.metadata_prefix.as_str()
                };
                Term::literal(format!(
                    "{}?verb=GetRecord&metadataPrefix={}&identifier={}",
                    record.base_url,
                    utf8_percent_encode(prefix, URL_COMPONENT),
                    utf8_percent_encode(&record.oai_id, URL_COMPONENT)
                ))
            }
            Special::Random => Term::literal(rand::random::<u32>().to_string()),
            Special::Seq => Term::literal(ctx.next_sequence().to_string()),
            Special::Node => ctx.current_node().clone(),
        }
    }
}

/// One step of a relation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Full predicate IRI.
    pub predicate: String,
    /// Walk from objects to subjects.
    pub inverse: bool,
    /// Follow the relation transitively.
    pub recursive: bool,
}

impl Segment {
    /// Parse a single segment such as `^acdh:isPartOf*`.
    pub fn parse(text: &str, prefixes: &BTreeMap<String, String>) -> Result<Self, PathError> {
        let text = text.trim();
        let (segment, rest) = take_segment(text, text, prefixes)?;
        match rest.chars().next() {
            None => Ok(segment),
            Some(found) => Err(PathError::UnexpectedCharacter {
                path: text.to_string(),
                found,
            }),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverse {
            write!(f, "^")?;
        }
        write!(f, "<{}>", self.predicate)?;
        if self.recursive {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathExpr {
    /// `=text`: the text itself.
    Literal(String),
    /// A built-in value.
    Special(Special),
    /// A walk through the graph.
    Relations(Vec<Segment>),
}

impl PathExpr {
    /// Parse a path, expanding prefixed names through `prefixes`.
    pub fn parse(text: &str, prefixes: &BTreeMap<String, String>) -> Result<Self, PathError> {
        if let Some(literal) = text.strip_prefix('=') {
            return Ok(PathExpr::Literal(literal.to_string()));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(special) = Special::from_token(text) {
            return Ok(PathExpr::Special(special));
        }

        let mut rest = text.strip_prefix('/').unwrap_or(text);
        let mut segments = Vec::new();
        loop {
            let (segment, tail) = take_segment(rest, text, prefixes)?;
            segments.push(segment);
            if tail.is_empty() {
                break;
            }
            rest = tail.strip_prefix('/').ok_or_else(|| PathError::UnexpectedCharacter {
                path: text.to_string(),
                found: tail.chars().next().unwrap_or('/'),
            })?;
        }
        Ok(PathExpr::Relations(segments))
    }

    /// Evaluate the path against the current node.
    ///
    /// Graph walks return a de-duplicated list sorted by string value.
    pub fn resolve(&self, ctx: &mut EvalContext) -> TemplateResult<Vec<Term>> {
        let segments = match self {
            PathExpr::Literal(text) => return Ok(vec![Term::literal(text.as_str())]),
            PathExpr::Special(special) => return Ok(vec![special.value(ctx)]),
            PathExpr::Relations(segments) => segments,
        };

        let mut nodes = vec![ctx.current_node().clone()];
        for segment in segments {
            if nodes.is_empty() {
                break;
            }
            nodes = if segment.recursive {
                follow(ctx.graph, &nodes, segment)?
            } else {
                hop(ctx.graph, &nodes, segment)?
            };
        }

        nodes.sort_by(|a, b| a.as_str().cmp(b.as_str()).then_with(|| a.cmp(b)));
        nodes.dedup();
        trace!(path = %self, results = nodes.len(), "resolved path");
        Ok(nodes)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathExpr::Literal(text) => write!(f, "={}", text),
            PathExpr::Special(special) => write!(f, "{}", special.token()),
            PathExpr::Relations(segments) => {
                for segment in segments {
                    write!(f, "/{}", segment)?;
                }
                Ok(())
            }
        }
    }
}

/// Expand `prefix:local` or `<iri>` to a full IRI.
pub fn expand_predicate(name: &str, prefixes: &BTreeMap<String, String>) -> Result<String, PathError> {
    let invalid = || PathError::InvalidPredicate {
        name: name.to_string(),
    };
    if let Some(iri) = name.strip_prefix('<') {
        return match iri.strip_suffix('>') {
            Some(iri) if !iri.is_empty() && !iri.contains(char::is_whitespace) => Ok(iri.to_string()),
            _ => Err(invalid()),
        };
    }

    let (prefix, local) = name.split_once(':').ok_or_else(invalid)?;
    if prefix.is_empty() || name.contains(char::is_whitespace) {
        return Err(invalid());
    }
    let namespace = prefixes.get(prefix).ok_or_else(|| PathError::UnknownPrefix {
        prefix: prefix.to_string(),
        name: name.to_string(),
    })?;
    Ok(format!("{}{}", namespace, local))
}

/// Split one segment off the front of `input`, returning the remainder.
fn take_segment<'t>(
    input: &'t str,
    path: &str,
    prefixes: &BTreeMap<String, String>,
) -> Result<(Segment, &'t str), PathError> {
    let (inverse, input) = match input.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let end = if input.starts_with('<') {
        input.find('>').map(|i| i + 1).ok_or_else(|| PathError::UnterminatedIri {
            path: path.to_string(),
        })?
    } else {
        input.find(['/', '*']).unwrap_or(input.len())
    };
    let (name, rest) = input.split_at(end);
    if name.is_empty() {
        return Err(PathError::EmptySegment {
            path: path.to_string(),
        });
    }
    let predicate = expand_predicate(name, prefixes)?;

    let (recursive, rest) = match rest.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    Ok((
        Segment {
            predicate,
            inverse,
            recursive,
        },
        rest,
    ))
}

/// One step along `segment` from every node in `nodes`.
fn hop(graph: &GraphCache, nodes: &[Term], segment: &Segment) -> GraphResult<Vec<Term>> {
    graph.ensure_loaded(nodes, &segment.predicate, segment.inverse, false)?;
    let mut seen = HashSet::new();
    Ok(nodes
        .iter()
        .flat_map(|node| graph.neighbours(node, &segment.predicate, segment.inverse))
        .filter(|term| seen.insert(term.clone()))
        .collect())
}

/// Follow `segment` transitively and return the last non-empty frontier.
///
/// Each round keeps only nodes not seen before in this traversal, so cycles
/// end the walk. If the very first step finds nothing, the start set is
/// returned.
fn follow(graph: &GraphCache, start: &[Term], segment: &Segment) -> GraphResult<Vec<Term>> {
    let mut visited: HashSet<Term> = start.iter().cloned().collect();
    let mut frontier = start.to_vec();
    loop {
        graph.ensure_loaded(&frontier, &segment.predicate, segment.inverse, true)?;
        let next: Vec<Term> = frontier
            .iter()
            .flat_map(|node| graph.neighbours(node, &segment.predicate, segment.inverse))
            .filter(|term| visited.insert(term.clone()))
            .collect();
        if next.is_empty() {
            return Ok(frontier);
        }
        frontier = next;
    }
}
