//! Storage collaborators answering bulk statement loads.

use crate::dataset::Dataset;
use crate::error::GraphResult;
use crate::term::{Statement, Term};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A bulk load request.
///
/// - `predicate: None` asks for every statement about each subject.
/// - `predicate: Some(p)` asks for a single hop along `p`, forward
///   (`subjects` are statement subjects) or `inverse` (`subjects` are
///   statement objects).
/// - `recursive` asks for the transitive closure of that hop, computed by the
///   storage in one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub subjects: Vec<Term>,
    pub predicate: Option<String>,
    pub inverse: bool,
    pub recursive: bool,
}

impl LoadRequest {
    /// Full statement sets for the given nodes.
    pub fn nodes(subjects: Vec<Term>) -> Self {
        Self {
            subjects,
            predicate: None,
            inverse: false,
            recursive: false,
        }
    }

    /// A single (possibly inverse, possibly recursive) relation.
    pub fn relation(
        subjects: Vec<Term>,
        predicate: impl Into<String>,
        inverse: bool,
        recursive: bool,
    ) -> Self {
        Self {
            subjects,
            predicate: Some(predicate.into()),
            inverse,
            recursive,
        }
    }
}

/// The storage behind the graph cache.
///
/// Implementations may block (database round trips, remote calls); the cache
/// calls them synchronously and merges whatever they return.
pub trait StatementSource: Send + Sync {
    /// Answer a bulk load request.
    fn load(&self, request: &LoadRequest) -> GraphResult<Vec<Statement>>;
}

/// A statement source backed by a complete in-memory dataset.
///
/// Used for tests and for rendering records from RDF dumps. Counts the load
/// requests it answers so callers can check caching behaviour.
#[derive(Debug, Default)]
pub struct MemorySource {
    data: Dataset,
    loads: AtomicUsize,
}

impl MemorySource {
    pub fn new(data: Dataset) -> Self {
        Self {
            data,
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of load requests answered so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// The complete backing dataset.
    pub fn data(&self) -> &Dataset {
        &self.data
    }

    fn hop(&self, node: &Term, predicate: &str, inverse: bool) -> Vec<&Statement> {
        if inverse {
            self.data.with_object(node, predicate).collect()
        } else {
            self.data.with_subject(node, predicate).collect()
        }
    }
}

impl StatementSource for MemorySource {
    fn load(&self, request: &LoadRequest) -> GraphResult<Vec<Statement>> {
        self.loads.fetch_add(1, Ordering::Relaxed);

        let Some(predicate) = request.predicate.as_deref() else {
            return Ok(request
                .subjects
                .iter()
                .flat_map(|s| self.data.about(s))
                .cloned()
                .collect());
        };

        let mut result = Vec::new();
        let mut seen: HashSet<&Term> = request.subjects.iter().collect();
        let mut frontier: Vec<&Term> = request.subjects.iter().collect();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for node in frontier {
                for st in self.hop(node, predicate, request.inverse) {
                    result.push(st.clone());
                    let reached = if request.inverse { &st.subject } else { &st.object };
                    if request.recursive && reached.is_node() && seen.insert(reached) {
                        next.push(reached);
                    }
                }
            }
            frontier = next;
        }
        Ok(result)
    }
}
