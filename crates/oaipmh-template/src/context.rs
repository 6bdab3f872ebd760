/*
 * context.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Record and evaluation contexts.
//!
//! [`RecordContext`] carries what the harvesting layer knows about the record
//! being rendered. [`EvalContext`] is threaded through every evaluation
//! function: it gives access to the shared collaborators and tracks the node
//! reference stack and the template location reached so far.

use crate::format::FormatDescriptor;
use crate::vocabulary::VocabularyMapper;
use oaipmh_graph::{GraphCache, Term};

/// The record being harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    /// URI of the described resource.
    pub subject: String,
    /// OAI-PMH identifier of the record.
    pub oai_id: String,
    /// URL at which the record's metadata can be retrieved.
    pub metadata_url: String,
    /// Base URL of the OAI-PMH endpoint.
    pub base_url: String,
    /// Requested `metadataPrefix`.
    pub metadata_prefix: String,
}

impl RecordContext {
    /// A record whose OAI identifier and metadata URL are derived from the
    /// resource URI.
    pub fn new(subject: impl Into<String>) -> Self {
        let subject = subject.into();
        Self {
            oai_id: subject.clone(),
            metadata_url: format!("{}/metadata", subject.trim_end_matches('/')),
            subject,
            base_url: String::new(),
            metadata_prefix: String::new(),
        }
    }

    pub fn with_oai_id(mut self, oai_id: impl Into<String>) -> Self {
        self.oai_id = oai_id.into();
        self
    }

    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_metadata_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metadata_prefix = prefix.into();
        self
    }
}

/// State threaded through the evaluation of one record.
pub struct EvalContext<'a> {
    /// Shared semantic graph.
    pub graph: &'a GraphCache,

    /// Shared vocabulary lookups.
    pub vocabulary: &'a VocabularyMapper,

    /// The format being rendered.
    pub format: &'a FormatDescriptor,

    /// The record being rendered.
    pub record: &'a RecordContext,

    /// Last value handed out by `SEQ`.
    pub sequence: u64,

    /// Node reference stack. The bottom entry is the record subject; every
    /// open `foreach` scope pushes one node.
    stack: Vec<Term>,

    /// Tag names of the elements entered and not yet left.
    location: Vec<String>,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        graph: &'a GraphCache,
        vocabulary: &'a VocabularyMapper,
        format: &'a FormatDescriptor,
        record: &'a RecordContext,
    ) -> Self {
        Self {
            graph,
            vocabulary,
            format,
            record,
            sequence: 0,
            stack: vec![Term::iri(record.subject.as_str())],
            location: Vec::new(),
        }
    }

    /// The node paths and conditions are evaluated against.
    pub fn current_node(&self) -> &Term {
        // The record subject is never popped.
        &self.stack[self.stack.len() - 1]
    }

    pub fn push_node(&mut self, node: Term) {
        self.stack.push(node);
    }

    pub fn pop_node(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Number of open `foreach` scopes.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Next `SEQ` value.
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn enter(&mut self, tag: &str) {
        self.location.push(tag.to_string());
    }

    pub fn leave(&mut self) {
        self.location.pop();
    }

    /// Tag path of the innermost element being processed, e.g.
    /// `/cmd:CMD/cmd:Components`.
    pub fn location(&self) -> String {
        if self.location.is_empty() {
            return "/".to_string();
        }
        self.location.iter().fold(String::new(), |mut path, tag| {
            path.push('/');
            path.push_str(tag);
            path
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::NullFetcher;
    use oaipmh_graph::{CachePolicy, MemorySource};
    use std::sync::Arc;

    #[test]
    fn test_record_defaults() {
        let record = RecordContext::new("https://id.example.org/1/");
        assert_eq!(record.oai_id, "https://id.example.org/1/");
        assert_eq!(record.metadata_url, "https://id.example.org/1/metadata");
    }

    #[test]
    fn test_stack_and_location() {
        let graph = GraphCache::new(Arc::new(MemorySource::default()), CachePolicy::default());
        let vocabulary = VocabularyMapper::new(Arc::new(NullFetcher));
        let format = FormatDescriptor::new("test");
        let record = RecordContext::new("https://id.example.org/1");
        let mut ctx = EvalContext::new(&graph, &vocabulary, &format, &record);

        assert_eq!(ctx.current_node(), &Term::iri("https://id.example.org/1"));
        ctx.push_node(Term::iri("https://id.example.org/2"));
        assert_eq!(ctx.depth(), 1);
        ctx.pop_node();
        ctx.pop_node();
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.current_node(), &Term::iri("https://id.example.org/1"));

        assert_eq!(ctx.location(), "/");
        ctx.enter("cmd:CMD");
        ctx.enter("cmd:Components");
        assert_eq!(ctx.location(), "/cmd:CMD/cmd:Components");
        ctx.leave();
        assert_eq!(ctx.location(), "/cmd:CMD");

        assert_eq!(ctx.next_sequence(), 1);
        assert_eq!(ctx.next_sequence(), 2);
    }
}
