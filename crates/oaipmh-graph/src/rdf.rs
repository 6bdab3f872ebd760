//! Reading statements from RDF serializations.
//!
//! Used to fill a [`MemorySource`](crate::MemorySource) from a data dump and
//! to parse vocabulary documents fetched over HTTP. Named graphs are ignored:
//! every quad is read as a statement of the default graph.

use crate::dataset::Dataset;
use crate::error::{GraphError, GraphResult};
use crate::term::{Statement, Term};
use oxrdfio::{RdfFormat, RdfParser};
use std::io::Read;
use std::path::Path;

/// Guess the RDF format from a media type such as `text/turtle;charset=utf-8`.
pub fn format_from_media_type(media_type: &str) -> Option<RdfFormat> {
    let essence = media_type.split(';').next().unwrap_or(media_type).trim();
    RdfFormat::from_media_type(essence)
}

/// Guess the RDF format from a file extension (`ttl`, `nt`, `rdf`, ...).
pub fn format_from_path(path: &Path) -> Option<RdfFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(RdfFormat::from_extension)
}

/// Parse RDF from a reader.
pub fn read_statements(
    reader: impl Read,
    format: RdfFormat,
    base_iri: Option<&str>,
) -> GraphResult<Vec<Statement>> {
    let mut parser = RdfParser::from_format(format);
    if let Some(base) = base_iri {
        parser = parser
            .with_base_iri(base)
            .map_err(|e| GraphError::Parse {
                message: format!("invalid base IRI '{}': {}", base, e),
            })?;
    }

    let mut statements = Vec::new();
    for quad in parser.for_reader(reader) {
        let quad = quad.map_err(|e| GraphError::Parse {
            message: e.to_string(),
        })?;
        statements.push(Statement::new(
            subject_term(&quad.subject),
            quad.predicate.as_str(),
            object_term(&quad.object),
        ));
    }
    Ok(statements)
}

/// Load an RDF file into a dataset, guessing the format from its extension.
pub fn load_file(path: &Path) -> GraphResult<Dataset> {
    let format = format_from_path(path).ok_or_else(|| GraphError::UnsupportedFormat {
        format: path.display().to_string(),
    })?;
    let file = std::fs::File::open(path)?;
    let statements = read_statements(std::io::BufReader::new(file), format, None)?;
    tracing::info!(
        path = %path.display(),
        statements = statements.len(),
        "loaded RDF data"
    );
    Ok(statements.into_iter().collect())
}

fn subject_term(subject: &oxrdf::Subject) -> Term {
    match subject {
        oxrdf::Subject::NamedNode(node) => Term::iri(node.as_str()),
        oxrdf::Subject::BlankNode(node) => Term::blank(node.as_str()),
        #[allow(unreachable_patterns)]
        other => Term::iri(other.to_string()),
    }
}

fn object_term(object: &oxrdf::Term) -> Term {
    match object {
        oxrdf::Term::NamedNode(node) => Term::iri(node.as_str()),
        oxrdf::Term::BlankNode(node) => Term::blank(node.as_str()),
        oxrdf::Term::Literal(literal) => match literal.language() {
            Some(lang) => Term::lang_literal(literal.value(), lang),
            None => Term::literal(literal.value()),
        },
        #[allow(unreachable_patterns)]
        other => Term::literal(other.to_string()),
    }
}
