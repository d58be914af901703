//! Selection sets.

use std::collections::BTreeSet;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A set of selected entry names within one directory.
///
/// Membership is what matters; iteration is sorted so that requests built
/// from the same selection are identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<CompactString>);

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns false if it was already selected.
    pub fn insert(&mut self, name: impl Into<CompactString>) -> bool {
        self.0.insert(name.into())
    }

    /// Remove a name. Returns false if it was not selected.
    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name)
    }

    /// Flip membership of a name. Returns true if the name is now selected.
    pub fn toggle(&mut self, name: impl Into<CompactString>) -> bool {
        let name = name.into();
        if self.0.remove(&name) {
            false
        } else {
            self.0.insert(name);
            true
        }
    }

    /// Check whether a name is selected.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Iterate names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(CompactString::as_str)
    }

    /// Names as owned strings, in sorted order.
    pub fn to_names(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }
}

impl<S: Into<CompactString>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a CompactString;
    type IntoIter = std::collections::btree_set::Iter<'a, CompactString>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_membership() {
        let mut set = SelectionSet::new();
        assert!(set.toggle("a.txt"));
        assert!(set.contains("a.txt"));
        assert!(!set.toggle("a.txt"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_names_are_unique_and_sorted() {
        let set: SelectionSet = ["b", "a", "b"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_names(), vec!["a".to_string(), "b".to_string()]);
    }
}
