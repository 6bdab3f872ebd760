//! Indexed statement set.

use crate::term::{Statement, Term};
use indexmap::IndexSet;
use std::collections::HashMap;

type PredicateIndex = HashMap<Term, HashMap<String, Vec<usize>>>;

/// A de-duplicating set of statements indexed by subject and by object.
///
/// Statements are kept in insertion order. Re-inserting a statement that is
/// already present is a no-op, so merging overlapping bulk loads is safe.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    statements: IndexSet<Statement>,
    /// subject -> predicate -> statement positions
    forward: PredicateIndex,
    /// object -> predicate -> statement positions
    inverse: PredicateIndex,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a statement. Returns `false` if it was already present.
    pub fn insert(&mut self, statement: Statement) -> bool {
        let (idx, inserted) = self.statements.insert_full(statement);
        if !inserted {
            return false;
        }

        let Some(st) = self.statements.get_index(idx) else {
            return false;
        };
        self.forward
            .entry(st.subject.clone())
            .or_default()
            .entry(st.predicate.clone())
            .or_default()
            .push(idx);
        self.inverse
            .entry(st.object.clone())
            .or_default()
            .entry(st.predicate.clone())
            .or_default()
            .push(idx);
        true
    }

    /// Add many statements, returning how many were new.
    pub fn extend(&mut self, statements: impl IntoIterator<Item = Statement>) -> usize {
        let mut added = 0;
        for statement in statements {
            if self.insert(statement) {
                added += 1;
            }
        }
        added
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Iterate over all statements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Remove every statement.
    pub fn clear(&mut self) {
        self.statements.clear();
        self.forward.clear();
        self.inverse.clear();
    }

    /// Statements with the given subject and predicate.
    pub fn with_subject<'a>(
        &'a self,
        subject: &Term,
        predicate: &str,
    ) -> impl Iterator<Item = &'a Statement> + 'a {
        self.lookup(&self.forward, subject, predicate)
    }

    /// Statements with the given object and predicate.
    pub fn with_object<'a>(
        &'a self,
        object: &Term,
        predicate: &str,
    ) -> impl Iterator<Item = &'a Statement> + 'a {
        self.lookup(&self.inverse, object, predicate)
    }

    /// All statements about a subject, whatever the predicate.
    pub fn about<'a>(&'a self, subject: &Term) -> impl Iterator<Item = &'a Statement> + 'a {
        self.forward
            .get(subject)
            .into_iter()
            .flat_map(|by_pred| by_pred.values())
            .flatten()
            .filter_map(|idx| self.statements.get_index(*idx))
    }

    /// True if the subject has at least one statement.
    pub fn has_subject(&self, subject: &Term) -> bool {
        self.forward.contains_key(subject)
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects(&self, subject: &Term, predicate: &str) -> Vec<Term> {
        self.with_subject(subject, predicate)
            .map(|st| st.object.clone())
            .collect()
    }

    /// Subjects of `(?, predicate, object)`.
    pub fn subjects(&self, object: &Term, predicate: &str) -> Vec<Term> {
        self.with_object(object, predicate)
            .map(|st| st.subject.clone())
            .collect()
    }

    fn lookup<'a>(
        &'a self,
        index: &'a PredicateIndex,
        node: &Term,
        predicate: &str,
    ) -> impl Iterator<Item = &'a Statement> + 'a {
        index
            .get(node)
            .and_then(|by_pred| by_pred.get(predicate))
            .into_iter()
            .flatten()
            .filter_map(|idx| self.statements.get_index(*idx))
    }
}

impl FromIterator<Statement> for Dataset {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        dataset.extend(iter);
        dataset
    }
}
