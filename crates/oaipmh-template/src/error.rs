/*
 * error.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Error types for template compilation and rendering.

use oaipmh_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Grammar errors in path expressions (`val`, `foreach`, `map="/..."`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Empty path expression")]
    Empty,

    #[error("Empty segment in path '{path}'")]
    EmptySegment { path: String },

    #[error("Unknown namespace prefix '{prefix}' in '{name}'")]
    UnknownPrefix { prefix: String, name: String },

    #[error("Invalid predicate '{name}': expected prefix:local or <iri>")]
    InvalidPredicate { name: String },

    #[error("Unterminated IRI in path '{path}'")]
    UnterminatedIri { path: String },

    #[error("Unexpected '{found}' after segment in path '{path}'")]
    UnexpectedCharacter { path: String, found: char },
}

/// Errors in `if` condition expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("Unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { found: char, offset: usize },

    #[error("Unknown operator or quantifier '{word}'")]
    UnknownWord { word: String },

    #[error("Expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("Too many operands: missing AND/OR before {found}")]
    TooManyOperands { found: String },

    #[error("Operator '{operator}' needs a value")]
    MissingValue { operator: String },

    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Errors in value descriptor attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("Invalid value '{value}' for attribute '{attribute}', expected {expected}")]
    InvalidAttribute {
        attribute: String,
        value: String,
        expected: String,
    },

    #[error("Invalid regular expression in '{attribute}': {message}")]
    InvalidRegex { attribute: String, message: String },

    #[error("Attribute '{attribute}' requires '{requires}'")]
    MissingDependency { attribute: String, requires: String },

    #[error("Invalid format '{format}': {message}")]
    InvalidFormat { format: String, message: String },

    #[error("Unknown value map '{name}'")]
    UnknownValueMap { name: String },

    #[error(
        "Ambiguous values on <{element}>: slots {slots} each resolve to several values, use foreach instead"
    )]
    AmbiguousFanOut { element: String, slots: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Bad path expression.
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Bad condition in an `if` attribute.
    #[error("Condition error in '{expression}': {source}")]
    Condition {
        expression: String,
        #[source]
        source: ConditionError,
    },

    /// Bad value descriptor.
    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    /// Invalid value of a control attribute other than the value modifiers.
    #[error("Invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: String, value: String },

    /// Error loading a component template.
    #[error("Component not found: {name}")]
    ComponentNotFound { name: String },

    /// Recursive component inclusion detected.
    #[error("Recursive component inclusion detected (depth > {max_depth}): {name}")]
    RecursiveComponent { name: String, max_depth: usize },

    /// The template file could not be read.
    #[error("Cannot read template {}: {source}", path.display())]
    TemplateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Processing removed the root element or left several roots.
    #[error("Template produced {count} root elements, expected exactly one")]
    RootCount { count: usize },

    /// The template or an inserted fragment is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] oaipmh_xml::Error),

    /// The graph store failed to load statements.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A render failure with the template location it happened at.
    #[error("{source} (at {location})")]
    Render {
        location: String,
        #[source]
        source: Box<TemplateError>,
    },
}

impl TemplateError {
    /// Template location (tag path) of a render failure, if known.
    pub fn location(&self) -> Option<&str> {
        match self {
            TemplateError::Render { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The underlying error, without the render location wrapper.
    pub fn root(&self) -> &TemplateError {
        match self {
            TemplateError::Render { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
