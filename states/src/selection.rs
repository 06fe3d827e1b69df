use std::collections::BTreeSet;
use std::sync::Arc;

use log::trace;

use crate::{RowKey, TableRow, ViewState};

/// Caller-supplied rule deciding which rows may be selected.
pub type SelectablePredicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Selection rules for one view.
///
/// A key may enter the selection only if its row is on the currently loaded
/// page and passes the predicate. Everything else is dropped without an
/// error.
pub struct SelectionPolicy<'a, R> {
    predicate: Option<&'a SelectablePredicate<R>>,
}

impl<'a, R: TableRow> SelectionPolicy<'a, R> {
    pub fn new(predicate: Option<&'a SelectablePredicate<R>>) -> Self {
        Self { predicate }
    }

    pub fn is_selectable(&self, row: &R) -> bool {
        self.predicate.is_none_or(|predicate| predicate(row))
    }

    fn selectable_on_page(&self, state: &ViewState<R>, key: RowKey) -> bool {
        state
            .rows
            .iter()
            .find(|row| row.row_key() == key)
            .is_some_and(|row| self.is_selectable(row))
    }

    /// Keeps only the keys of `candidates` that may be selected.
    pub fn sanitize(&self, state: &ViewState<R>, candidates: BTreeSet<RowKey>) -> BTreeSet<RowKey> {
        candidates
            .into_iter()
            .filter(|key| {
                let keep = self.selectable_on_page(state, *key);
                if !keep {
                    trace!("Rejected selection of {key}");
                }
                keep
            })
            .collect()
    }

    /// Flips one key. Returns whether the selection changed.
    pub fn toggle(&self, state: &mut ViewState<R>, key: RowKey) -> bool {
        if state.selection.remove(&key) {
            return true;
        }
        if self.selectable_on_page(state, key) {
            state.selection.insert(key);
            true
        } else {
            trace!("Rejected selection of {key}");
            false
        }
    }

    /// Adds every selectable key among `keys`. Returns how many were added.
    pub fn select_all(&self, state: &mut ViewState<R>, keys: &[RowKey]) -> usize {
        let accepted = self.sanitize(state, keys.iter().copied().collect());
        let before = state.selection.len();
        state.selection.extend(accepted);
        state.selection.len() - before
    }

    /// Adds every selectable row of the loaded page.
    pub fn select_page(&self, state: &mut ViewState<R>) -> usize {
        let keys = state.row_keys();
        self.select_all(state, &keys)
    }
}

pub fn clear_selection<R>(state: &mut ViewState<R>) -> bool {
    let changed = !state.selection.is_empty();
    state.selection.clear();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VisibleColumns;
    use crate::test_utils::TestRow;

    fn loaded_state() -> ViewState<TestRow> {
        let mut state = ViewState::new(10, None, VisibleColumns::All);
        state.rows = vec![
            TestRow::new(1, "alice"),
            TestRow::new(2, "bob").locked(),
            TestRow::new(3, "carol"),
        ];
        state
    }

    fn unlocked() -> SelectablePredicate<TestRow> {
        Arc::new(|row: &TestRow| !row.locked)
    }

    #[test]
    fn toggle_adds_then_removes() {
        let predicate = unlocked();
        let policy = SelectionPolicy::new(Some(&predicate));
        let mut state = loaded_state();

        assert!(policy.toggle(&mut state, RowKey::new("1")));
        assert!(state.selection.contains(&RowKey::new("1")));
        assert!(policy.toggle(&mut state, RowKey::new("1")));
        assert!(state.selection.is_empty());
    }

    #[test]
    fn toggle_rejects_excluded_row() {
        let predicate = unlocked();
        let policy = SelectionPolicy::new(Some(&predicate));
        let mut state = loaded_state();

        assert!(!policy.toggle(&mut state, RowKey::new("2")));
        assert!(state.selection.is_empty());
    }

    #[test]
    fn toggle_rejects_key_not_on_page() {
        let policy = SelectionPolicy::<TestRow>::new(None);
        let mut state = loaded_state();

        assert!(!policy.toggle(&mut state, RowKey::new("99")));
        assert!(state.selection.is_empty());
    }

    #[test]
    fn select_all_never_inserts_excluded_keys() {
        let predicate = unlocked();
        let policy = SelectionPolicy::new(Some(&predicate));
        let mut state = loaded_state();
        let keys = vec![RowKey::new("1"), RowKey::new("2"), RowKey::new("3"), RowKey::new("42")];

        let added = policy.select_all(&mut state, &keys);

        assert_eq!(added, 2);
        assert_eq!(
            state.selection,
            BTreeSet::from([RowKey::new("1"), RowKey::new("3")])
        );
    }

    #[test]
    fn select_page_without_predicate_takes_every_row() {
        let policy = SelectionPolicy::<TestRow>::new(None);
        let mut state = loaded_state();

        assert_eq!(policy.select_page(&mut state), 3);
    }

    #[test]
    fn clear_reports_change() {
        let mut state = loaded_state();
        assert!(!clear_selection(&mut state));
        state.selection.insert(RowKey::new("1"));
        assert!(clear_selection(&mut state));
        assert!(state.selection.is_empty());
    }
}
