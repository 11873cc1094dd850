//! Node predicates used to query a [`Document`].

use regex::Regex;

use super::{Document, NodeId};

/// A closed set of element matchers.
///
/// Only element nodes ever match. Tag names compare case-insensitively.
#[derive(Debug, Clone)]
pub enum Predicate {
    Tag(String),
    AnyTag(Vec<String>),
    /// Attribute value equality, ignoring ASCII case.
    AttrEquals {
        name: String,
        value: String,
    },
    AttrPrefix {
        name: String,
        prefix: String,
    },
    AttrMatches {
        name: String,
        pattern: Regex,
    },
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn tag(name: &str) -> Self {
        Predicate::Tag(name.to_string())
    }

    pub fn any_tag(names: &[&str]) -> Self {
        Predicate::AnyTag(names.iter().map(|n| n.to_string()).collect())
    }

    /// Attribute equals `value`, ignoring case.
    pub fn attr_eq(name: &str, value: &str) -> Self {
        Predicate::AttrEquals {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn attr_prefix(name: &str, prefix: &str) -> Self {
        Predicate::AttrPrefix {
            name: name.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub fn attr_matches(name: &str, pattern: Regex) -> Self {
        Predicate::AttrMatches {
            name: name.to_string(),
            pattern,
        }
    }

    /// Combines two predicates; nested `And`s are flattened.
    pub fn and(self, other: Predicate) -> Self {
        let mut parts = match self {
            Predicate::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Predicate::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Predicate::And(parts)
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(element) = doc.element(id) else {
            return false;
        };
        match self {
            Predicate::Tag(name) => element.name.eq_ignore_ascii_case(name),
            Predicate::AnyTag(names) => names.iter().any(|n| element.name.eq_ignore_ascii_case(n)),
            Predicate::AttrEquals { name, value } => {
                element.attr(name).is_some_and(|v| v.eq_ignore_ascii_case(value))
            }
            Predicate::AttrPrefix { name, prefix } => {
                element.attr(name).is_some_and(|v| v.starts_with(prefix.as_str()))
            }
            Predicate::AttrMatches { name, pattern } => {
                element.attr(name).is_some_and(|v| pattern.is_match(v))
            }
            Predicate::And(parts) => parts.iter().all(|p| p.matches(doc, id)),
        }
    }
}
