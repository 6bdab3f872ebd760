//! Append-only semantic graph cache for OAI-PMH metadata generation.
//!
//! Metadata templates walk the graph describing a repository resource:
//! `subject / predicate / object` statements where objects are either other
//! nodes or (possibly language-tagged) literals. This crate provides:
//!
//! - [`Term`] and [`Statement`]: the statement model
//! - [`Dataset`]: an indexed, de-duplicating statement set
//! - [`StatementSource`]: the storage collaborator that answers bulk loads
//! - [`GraphCache`]: the shared, thread-safe cache that loads lazily from a
//!   source, never loads the same node twice for the same relation, and is
//!   pruned only between records according to its [`CachePolicy`]
//! - [`MemorySource`] and [`rdf`]: an in-memory source fed from RDF files
//!
//! # Example
//!
//! ```rust
//! use oaipmh_graph::{CachePolicy, Dataset, GraphCache, MemorySource, Statement, Term};
//! use std::sync::Arc;
//!
//! let mut data = Dataset::new();
//! data.insert(Statement::new(
//!     Term::iri("https://id.example.org/1"),
//!     "https://vocab.example.org/isPartOf",
//!     Term::iri("https://id.example.org/0"),
//! ));
//!
//! let cache = GraphCache::new(Arc::new(MemorySource::new(data)), CachePolicy::default());
//! let start = [Term::iri("https://id.example.org/1")];
//! cache.ensure_loaded(&start, "https://vocab.example.org/isPartOf", false, false).unwrap();
//! let parents = cache.objects(&start[0], "https://vocab.example.org/isPartOf");
//! assert_eq!(parents, vec![Term::iri("https://id.example.org/0")]);
//! ```

pub mod cache;
pub mod dataset;
pub mod error;
pub mod rdf;
pub mod source;
pub mod term;

pub use cache::{CachePolicy, GraphCache};
pub use dataset::Dataset;
pub use error::{GraphError, GraphResult};
pub use source::{LoadRequest, MemorySource, StatementSource};
pub use term::{Statement, Term};
