//! The shared graph cache.

use crate::dataset::Dataset;
use crate::error::GraphResult;
use crate::source::{LoadRequest, StatementSource};
use crate::term::{Statement, Term};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

/// When the cache may be emptied.
///
/// Pruning only ever happens between records (see [`GraphCache::end_record`]),
/// never while a template is being processed, so a record always sees a
/// monotonically growing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    /// Clear the cache at the end of a record once it holds more than this
    /// many statements. `None` keeps everything for the cache's lifetime.
    pub max_statements: Option<usize>,
}

impl CachePolicy {
    /// Never prune.
    pub fn unbounded() -> Self {
        Self {
            max_statements: None,
        }
    }

    /// Prune once the cache grows past `max_statements`.
    pub fn bounded(max_statements: usize) -> Self {
        Self {
            max_statements: Some(max_statements),
        }
    }
}

/// What has already been asked of the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Loaded {
    /// Every statement with this node as subject.
    Node(Term),
    /// One relation of this node in one direction.
    Relation {
        node: Term,
        predicate: String,
        inverse: bool,
    },
}

#[derive(Debug, Default)]
struct CacheState {
    dataset: Dataset,
    loaded: HashSet<Loaded>,
}

impl CacheState {
    fn is_materialized(&self, node: &Term, predicate: &str, inverse: bool) -> bool {
        let relation = Loaded::Relation {
            node: node.clone(),
            predicate: predicate.to_string(),
            inverse,
        };
        self.loaded.contains(&relation) || (!inverse && self.loaded.contains(&Loaded::Node(node.clone())))
    }
}

/// Append-only statement cache shared by every engine in a process.
///
/// Nodes are loaded lazily from a [`StatementSource`]. Each node is requested
/// at most once per predicate and direction (a full node load covers every
/// forward relation), which bounds the work done on cyclic graphs. Reads and
/// writes go through an `RwLock`; inserts are idempotent so concurrent loads
/// of the same node are harmless.
pub struct GraphCache {
    source: Arc<dyn StatementSource>,
    policy: CachePolicy,
    state: RwLock<CacheState>,
}

impl std::fmt::Debug for GraphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphCache")
            .field("policy", &self.policy)
            .field("statements", &self.len())
            .finish()
    }
}

impl GraphCache {
    /// Create an empty cache over a source.
    pub fn new(source: Arc<dyn StatementSource>, policy: CachePolicy) -> Self {
        Self {
            source,
            policy,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// The eviction policy.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Make sure the cache holds the `predicate` relation of every node in
    /// `nodes`, in the given direction.
    ///
    /// Nodes that were already materialized for this relation are skipped.
    /// A forward, non-recursive load fetches the complete statement set of the
    /// pending nodes. A recursive load asks the source for the transitive
    /// closure in one round trip and marks every node it reached.
    pub fn ensure_loaded(
        &self,
        nodes: &[Term],
        predicate: &str,
        inverse: bool,
        recursive: bool,
    ) -> GraphResult<()> {
        let pending: Vec<Term> = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            let mut seen = HashSet::new();
            nodes
                .iter()
                .filter(|n| n.is_node() && !state.is_materialized(n, predicate, inverse))
                .filter(|n| seen.insert(*n))
                .cloned()
                .collect()
        };
        if pending.is_empty() {
            trace!(predicate, inverse, "all nodes already materialized");
            return Ok(());
        }

        let request = if recursive || inverse {
            LoadRequest::relation(pending.clone(), predicate, inverse, recursive)
        } else {
            LoadRequest::nodes(pending.clone())
        };
        debug!(
            nodes = pending.len(),
            predicate,
            inverse,
            recursive,
            "loading statements"
        );
        let statements = self.source.load(&request)?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut marks: Vec<Loaded> = Vec::new();
        if recursive {
            let mut reached: HashSet<Term> = pending.into_iter().collect();
            for st in &statements {
                if st.predicate == predicate {
                    let node = if inverse { &st.subject } else { &st.object };
                    if node.is_node() {
                        reached.insert(node.clone());
                    }
                }
            }
            marks.extend(reached.into_iter().map(|node| Loaded::Relation {
                node,
                predicate: predicate.to_string(),
                inverse,
            }));
        } else if inverse {
            marks.extend(pending.into_iter().map(|node| Loaded::Relation {
                node,
                predicate: predicate.to_string(),
                inverse,
            }));
        } else {
            marks.extend(pending.into_iter().map(Loaded::Node));
        }

        let added = state.dataset.extend(statements);
        state.loaded.extend(marks);
        debug!(added, total = state.dataset.len(), "statements cached");
        Ok(())
    }

    /// Make sure the complete statement sets of `nodes` are cached.
    pub fn ensure_nodes(&self, nodes: &[Term]) -> GraphResult<()> {
        let pending: Vec<Term> = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            nodes
                .iter()
                .filter(|n| n.is_node() && !state.loaded.contains(&Loaded::Node((*n).clone())))
                .cloned()
                .collect()
        };
        if pending.is_empty() {
            return Ok(());
        }

        debug!(nodes = pending.len(), "loading node statements");
        let statements = self.source.load(&LoadRequest::nodes(pending.clone()))?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.dataset.extend(statements);
        state.loaded.extend(pending.into_iter().map(Loaded::Node));
        Ok(())
    }

    /// Seed the cache with the complete statement set of a node, e.g. the
    /// metadata of the record being harvested, which the caller already has.
    pub fn insert_node(&self, node: Term, statements: impl IntoIterator<Item = Statement>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.dataset.extend(statements);
        state.loaded.insert(Loaded::Node(node));
    }

    /// Cached objects of `(subject, predicate, ?)`.
    pub fn objects(&self, subject: &Term, predicate: &str) -> Vec<Term> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.dataset.objects(subject, predicate)
    }

    /// Cached subjects of `(?, predicate, object)`.
    pub fn subjects(&self, object: &Term, predicate: &str) -> Vec<Term> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.dataset.subjects(object, predicate)
    }

    /// Every cached statement with `subject` as subject.
    pub fn statements_about(&self, subject: &Term) -> Vec<Statement> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.dataset.about(subject).cloned().collect()
    }

    /// One hop from `node` along `predicate`, forward or inverse.
    pub fn neighbours(&self, node: &Term, predicate: &str, inverse: bool) -> Vec<Term> {
        if inverse {
            self.subjects(node, predicate)
        } else {
            self.objects(node, predicate)
        }
    }

    /// Number of cached statements.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .dataset
            .len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signal that a record has been generated and apply the cache policy.
    ///
    /// Returns `true` if the cache was pruned.
    pub fn end_record(&self) -> bool {
        let Some(max) = self.policy.max_statements else {
            return false;
        };
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.dataset.len() <= max {
            return false;
        }
        debug!(statements = state.dataset.len(), max, "pruning graph cache");
        state.dataset.clear();
        state.loaded.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    const PART_OF: &str = "https://example.org/isPartOf";
    const TITLE: &str = "https://example.org/title";

    fn source() -> Arc<MemorySource> {
        let data: Dataset = vec![
            Statement::new(Term::iri("a"), PART_OF, Term::iri("b")),
            Statement::new(Term::iri("b"), PART_OF, Term::iri("a")),
            Statement::new(Term::iri("a"), TITLE, Term::literal("A")),
        ]
        .into_iter()
        .collect();
        Arc::new(MemorySource::new(data))
    }

    #[test]
    fn test_forward_load_happens_once() {
        let src = source();
        let cache = GraphCache::new(src.clone(), CachePolicy::default());
        let a = [Term::iri("a")];

        cache.ensure_loaded(&a, PART_OF, false, false).unwrap();
        cache.ensure_loaded(&a, TITLE, false, false).unwrap();
        assert_eq!(src.load_count(), 1);
        assert_eq!(cache.objects(&a[0], TITLE), vec![Term::literal("A")]);
    }

    #[test]
    fn test_inverse_load_is_per_predicate() {
        let src = source();
        let cache = GraphCache::new(src.clone(), CachePolicy::default());
        let b = [Term::iri("b")];

        cache.ensure_loaded(&b, PART_OF, true, false).unwrap();
        cache.ensure_loaded(&b, PART_OF, true, false).unwrap();
        assert_eq!(src.load_count(), 1);
        assert_eq!(cache.subjects(&b[0], PART_OF), vec![Term::iri("a")]);

        cache.ensure_loaded(&b, TITLE, true, false).unwrap();
        assert_eq!(src.load_count(), 2);
    }

    #[test]
    fn test_recursive_load_marks_closure() {
        let src = source();
        let cache = GraphCache::new(src.clone(), CachePolicy::default());

        cache
            .ensure_loaded(&[Term::iri("a")], PART_OF, false, true)
            .unwrap();
        cache
            .ensure_loaded(&[Term::iri("b")], PART_OF, false, true)
            .unwrap();
        assert_eq!(src.load_count(), 1);
    }

    #[test]
    fn test_literals_are_never_loaded() {
        let src = source();
        let cache = GraphCache::new(src.clone(), CachePolicy::default());
        cache
            .ensure_loaded(&[Term::literal("x")], PART_OF, false, false)
            .unwrap();
        assert_eq!(src.load_count(), 0);
    }

    #[test]
    fn test_end_record_prunes_over_limit() {
        let src = source();
        let cache = GraphCache::new(src.clone(), CachePolicy::bounded(1));
        cache.ensure_nodes(&[Term::iri("a")]).unwrap();
        assert_eq!(cache.len(), 2);

        assert!(cache.end_record());
        assert!(cache.is_empty());

        // pruned nodes are loaded again on demand
        cache.ensure_nodes(&[Term::iri("a")]).unwrap();
        assert_eq!(src.load_count(), 2);
    }

    #[test]
    fn test_unbounded_policy_never_prunes() {
        let cache = GraphCache::new(source(), CachePolicy::unbounded());
        cache.ensure_nodes(&[Term::iri("a")]).unwrap();
        assert!(!cache.end_record());
        assert_eq!(cache.len(), 2);
    }
}
