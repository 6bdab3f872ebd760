/*
 * testing.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Shared fixtures for unit tests.

use crate::context::{EvalContext, RecordContext};
use crate::format::FormatDescriptor;
use crate::path::PathExpr;
use crate::vocabulary::{NullFetcher, VocabularyMapper};
use oaipmh_graph::{CachePolicy, Dataset, GraphCache, MemorySource, Statement, Term};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const EX: &str = "https://example.org/";

/// A graph, a format with the `ex:` prefix and a record about `ex:r`.
pub struct Fixture {
    pub graph: GraphCache,
    pub vocabulary: VocabularyMapper,
    pub format: FormatDescriptor,
    pub record: RecordContext,
}

impl Fixture {
    /// `statements` are `(subject, predicate, object)` with subject and
    /// predicate given as local names in the `ex:` namespace.
    pub fn new(statements: &[(&str, &str, Term)]) -> Self {
        let data: Dataset = statements
            .iter()
            .map(|(s, p, o)| {
                Statement::new(
                    Term::iri(format!("{}{}", EX, s)),
                    format!("{}{}", EX, p),
                    o.clone(),
                )
            })
            .collect();
        let mut format = FormatDescriptor::new("test").with_prefix("ex", EX);
        format.value_maps.insert(
            "languages".to_string(),
            BTreeMap::from([
                ("de".to_string(), "deu".to_string()),
                ("en".to_string(), "eng".to_string()),
            ]),
        );
        Self {
            graph: GraphCache::new(Arc::new(MemorySource::new(data)), CachePolicy::default()),
            vocabulary: VocabularyMapper::new(Arc::new(NullFetcher)),
            format,
            record: RecordContext::new(format!("{}r", EX))
                .with_oai_id("oai:example:r")
                .with_base_url("https://oai.example.org/"),
        }
    }

    pub fn ctx(&self) -> EvalContext<'_> {
        EvalContext::new(&self.graph, &self.vocabulary, &self.format, &self.record)
    }

    pub fn resolve(&self, ctx: &mut EvalContext, path: &str) -> Vec<Term> {
        let parsed = PathExpr::parse(path, &self.format.prefixes)
            .unwrap_or_else(|e| panic!("{}: {}", path, e));
        parsed
            .resolve(ctx)
            .unwrap_or_else(|e| panic!("{}: {}", path, e))
    }
}
