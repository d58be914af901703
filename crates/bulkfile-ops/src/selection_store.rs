//! Live selection state for one directory view.

use std::sync::Arc;

use bulkfile_core::SelectionSet;
use compact_str::CompactString;
use tokio::sync::watch;

/// Holds the names selected in the current directory.
///
/// Cloning the store yields another handle to the same selection. Every
/// membership change is published to subscribers; [`SelectionStore::snapshot`]
/// returns a copy that later edits cannot reach.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    selected: watch::Sender<SelectionSet>,
    directory: watch::Sender<CompactString>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new("/")
    }
}

impl SelectionStore {
    /// Create an empty selection for a directory.
    pub fn new(directory: impl Into<CompactString>) -> Self {
        let (selected, _) = watch::channel(SelectionSet::new());
        let (directory, _) = watch::channel(directory.into());
        Self {
            inner: Arc::new(Inner {
                selected,
                directory,
            }),
        }
    }

    /// Flip a name's membership. Returns true if it is now selected.
    pub fn toggle(&self, name: impl Into<CompactString>) -> bool {
        let mut now_selected = false;
        self.inner.selected.send_modify(|set| {
            now_selected = set.toggle(name);
        });
        now_selected
    }

    /// Deselect everything. Subscribers are only notified if something was selected.
    pub fn clear(&self) {
        self.inner.selected.send_if_modified(|set| {
            if set.is_empty() {
                return false;
            }
            set.clear();
            true
        });
    }

    /// Replace the whole selection at once.
    pub fn set(&self, selection: SelectionSet) {
        self.inner.selected.send_if_modified(|set| {
            if *set == selection {
                return false;
            }
            *set = selection;
            true
        });
    }

    /// Select every given name, replacing the current selection.
    pub fn select_all<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.set(names.into_iter().collect());
    }

    /// Take an independent copy of the current selection.
    pub fn snapshot(&self) -> SelectionSet {
        self.inner.selected.borrow().clone()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.inner.selected.borrow().contains(name)
    }

    pub fn len(&self) -> usize {
        self.inner.selected.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.selected.borrow().is_empty()
    }

    /// Whether bulk actions should be offered at all.
    pub fn is_active(&self) -> bool {
        !self.is_empty()
    }

    /// Navigate to another directory. The selection does not carry over.
    pub fn enter(&self, directory: impl Into<CompactString>) {
        let directory = directory.into();
        self.inner.directory.send_if_modified(|current| {
            if *current == directory {
                return false;
            }
            *current = directory;
            true
        });
        self.clear();
    }

    /// The directory this selection belongs to.
    pub fn directory(&self) -> CompactString {
        self.inner.directory.borrow().clone()
    }

    /// Observe membership changes.
    pub fn subscribe(&self) -> watch::Receiver<SelectionSet> {
        self.inner.selected.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_snapshot() {
        let store = SelectionStore::new("/");
        assert!(store.toggle("a.txt"));
        assert!(store.toggle("b.txt"));
        assert!(!store.toggle("a.txt"));

        let snapshot = store.snapshot();
        store.toggle("c.txt");

        assert_eq!(snapshot.to_names(), vec!["b.txt".to_string()]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_handles_share_state() {
        let store = SelectionStore::default();
        let other = store.clone();
        other.toggle("x");
        assert!(store.is_selected("x"));
        assert!(store.is_active());
    }

    #[test]
    fn test_enter_clears_selection() {
        let store = SelectionStore::new("/");
        store.select_all(["a", "b"]);
        store.enter("/logs");

        assert!(store.is_empty());
        assert_eq!(store.directory(), "/logs");
    }

    #[test]
    fn test_subscribers_see_changes() {
        let store = SelectionStore::new("/");
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.clear();
        assert!(!rx.has_changed().unwrap());

        store.toggle("a");
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().contains("a"));

        store.set(["a"].into_iter().collect());
        assert!(!rx.has_changed().unwrap());
    }
}
