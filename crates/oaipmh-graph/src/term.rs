//! Terms and statements.

use std::fmt;

/// A node or value in the graph.
///
/// Subjects are always [`Term::Iri`] or [`Term::Blank`]; objects may also be
/// literals. Literal language tags are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// A named node.
    Iri(String),

    /// A blank node, identified by its local label (without `_:`).
    Blank(String),

    /// A literal value with an optional language tag.
    Literal { value: String, lang: Option<String> },
}

impl Term {
    /// Create a named node.
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Create a blank node.
    pub fn blank(label: impl Into<String>) -> Self {
        Term::Blank(label.into())
    }

    /// Create a plain literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            lang: None,
        }
    }

    /// Create a language-tagged literal.
    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            lang: Some(lang.into().to_lowercase()),
        }
    }

    /// The string value of this term: the IRI, the blank node label or the
    /// literal's lexical form.
    pub fn as_str(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::Blank(label) => label,
            Term::Literal { value, .. } => value,
        }
    }

    /// Language tag of a literal, if any.
    pub fn lang(&self) -> Option<&str> {
        match self {
            Term::Literal { lang, .. } => lang.as_deref(),
            _ => None,
        }
    }

    /// True for IRIs and blank nodes, i.e. terms that can have statements.
    pub fn is_node(&self) -> bool {
        !matches!(self, Term::Literal { .. })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Blank(label) => write!(f, "_:{}", label),
            Term::Literal {
                value,
                lang: Some(lang),
            } => write!(f, "{:?}@{}", value, lang),
            Term::Literal { value, lang: None } => write!(f, "{:?}", value),
        }
    }
}

/// A single `subject predicate object` statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Statement {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_values() {
        assert_eq!(Term::iri("https://example.org/a").as_str(), "https://example.org/a");
        assert_eq!(Term::lang_literal("Titel", "DE").lang(), Some("de"));
        assert_eq!(Term::literal("x").lang(), None);
        assert!(Term::blank("b0").is_node());
        assert!(!Term::literal("x").is_node());
    }

    #[test]
    fn test_statement_display() {
        let st = Statement::new(
            Term::iri("https://example.org/a"),
            "https://example.org/title",
            Term::lang_literal("A", "en"),
        );
        assert_eq!(
            st.to_string(),
            r#"<https://example.org/a> <https://example.org/title> "A"@en ."#
        );
    }
}
