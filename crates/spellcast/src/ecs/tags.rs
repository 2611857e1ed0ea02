//! Tag sets.

use std::collections::BTreeSet;

/// The labels attached to one actor. Ordered so listings are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.0.insert(tag.into())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// `true` if at least one of `query` is present.
    pub fn matches_any<S: AsRef<str>>(&self, query: &[S]) -> bool {
        query.iter().any(|t| self.contains(t.as_ref()))
    }

    /// `true` if every one of `query` is present. An empty query matches.
    pub fn matches_all<S: AsRef<str>>(&self, query: &[S]) -> bool {
        query.iter().all(|t| self.contains(t.as_ref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
