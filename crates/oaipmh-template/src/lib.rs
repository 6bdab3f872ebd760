/*
 * lib.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Template-driven OAI-PMH metadata generation engine.
//!
//! A metadata format is an XML template whose elements carry control
//! attributes. Rendering a record walks the template top-down against the
//! semantic graph describing the record's resource and rewrites it into the
//! concrete metadata document:
//!
//! - Conditions: `if="any(acdh:hasTitle) AND NOT(any(acdh:hasCategory == 'x'))"`
//! - Iteration: `foreach="/acdh:hasContributor"` clones the element per node
//! - Values: `val="/acdh:hasTitle"` with `match`, `replace`, `format`, `map`,
//!   `aggregate`, `required`, `action`, `as` and `lang` modifiers, numbered
//!   `val0`, `val1`, ... when one element takes several values
//! - Paths: `/^acdh:isPartOf*/acdh:hasTitle` walks inverse and recursive
//!   relations, crossing into neighbouring resources
//! - Components: `ComponentId="name"` splices in a sub-template
//!
//! # Architecture
//!
//! ```text
//! TemplateProcessor ──► condition ──┐
//!        │                          ├──► path ──► GraphCache (oaipmh-graph)
//!        └──────────► value ────────┘
//!                        └──► vocabulary ──► VocabularyFetcher (HTTP)
//! ```
//!
//! A [`Template`] is parsed once and never mutated; every render deep-clones
//! its tree. The graph cache and the vocabulary mapper are shared between
//! renders (and threads) and only ever grow while a record is processed.
//!
//! # Example
//!
//! ```rust
//! use oaipmh_graph::{CachePolicy, Dataset, GraphCache, MemorySource, Statement, Term};
//! use oaipmh_template::{
//!     FormatDescriptor, NullFetcher, RecordContext, Template, TemplateProcessor,
//!     VocabularyMapper,
//! };
//! use std::sync::Arc;
//!
//! let mut data = Dataset::new();
//! data.insert(Statement::new(
//!     Term::iri("https://id.example.org/1"),
//!     "http://purl.org/dc/terms/title",
//!     Term::lang_literal("A title", "en"),
//! ));
//! let graph = GraphCache::new(Arc::new(MemorySource::new(data)), CachePolicy::default());
//! let vocabulary = VocabularyMapper::new(Arc::new(NullFetcher));
//!
//! let mut format = FormatDescriptor::new("dc");
//! format.prefixes.insert("dcterms".into(), "http://purl.org/dc/terms/".into());
//!
//! let template = Template::compile(r#"<record><title val="/dcterms:title"/></record>"#)?;
//! let mut processor = TemplateProcessor::new(&template, &format, &graph, &vocabulary);
//! let xml = processor.process(&RecordContext::new("https://id.example.org/1"))?;
//!
//! let title = &xml.get_children("title")[0];
//! assert_eq!(title.text(), "A title");
//! assert_eq!(title.get_attribute("xml:lang"), Some("en"));
//! # Ok::<(), oaipmh_template::TemplateError>(())
//! ```

pub mod component;
pub mod condition;
pub mod context;
pub mod error;
pub mod format;
pub mod path;
pub mod printf;
pub mod processor;
pub mod template;
pub mod value;
pub mod vocabulary;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use component::{ComponentResolver, FileSystemResolver, MemoryResolver, NullResolver};
pub use condition::{Condition, evaluate_condition};
pub use context::{EvalContext, RecordContext};
pub use error::{TemplateError, TemplateResult};
pub use format::{FormatDescriptor, FormatKind, MetadataFormat};
pub use path::{PathExpr, Segment, Special};
pub use processor::TemplateProcessor;
pub use template::Template;
pub use value::{LangValue, ValueDescriptor};
pub use vocabulary::{HttpFetcher, NullFetcher, VocabularyFetcher, VocabularyMapper};
