use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use log::debug;

use crate::{
    SelectablePredicate, SelectionPolicy, SortDescriptor, TableRow, ViewChanges, ViewKey, ViewPatch,
    ViewState, VisibleColumns,
};

/// Registration-time defaults for a view, restored by `reset`.
pub struct ViewProfile<R> {
    pub page_size: u32,
    pub sort: Option<SortDescriptor>,
    pub visible_columns: VisibleColumns,
    pub selectable: Option<SelectablePredicate<R>>,
}

impl<R> ViewProfile<R> {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            sort: None,
            visible_columns: VisibleColumns::All,
            selectable: None,
        }
    }

    fn fresh_state(&self) -> ViewState<R> {
        ViewState::new(self.page_size, self.sort, self.visible_columns.clone())
    }
}

impl<R> Clone for ViewProfile<R> {
    fn clone(&self) -> Self {
        Self {
            page_size: self.page_size,
            sort: self.sort,
            visible_columns: self.visible_columns.clone(),
            selectable: self.selectable.clone(),
        }
    }
}

impl<R> Debug for ViewProfile<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewProfile")
            .field("page_size", &self.page_size)
            .field("sort", &self.sort)
            .field("visible_columns", &self.visible_columns)
            .field("selectable", &self.selectable.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

struct Slot<R> {
    state: ViewState<R>,
    profile: ViewProfile<R>,
}

/// Keyed storage of view states.
///
/// Store operations only edit state; deciding whether an edit needs a fetch
/// is left to the caller through the returned `ViewChanges`.
pub struct ViewStore<R> {
    slots: HashMap<ViewKey, Slot<R>>,
    default_page_size: u32,
}

impl<R: TableRow> ViewStore<R> {
    pub fn new(default_page_size: u32) -> Self {
        Self {
            slots: HashMap::new(),
            default_page_size: default_page_size.max(1),
        }
    }

    /// Creates or replaces the view for `key` with a fresh state.
    pub fn install(&mut self, key: ViewKey, profile: ViewProfile<R>) {
        let state = profile.fresh_state();
        self.slots.insert(key, Slot { state, profile });
    }

    pub fn contains(&self, key: ViewKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = ViewKey> + '_ {
        self.slots.keys().copied()
    }

    pub fn get(&self, key: ViewKey) -> Option<&ViewState<R>> {
        self.slots.get(&key).map(|slot| &slot.state)
    }

    fn slot_mut(&mut self, key: ViewKey) -> &mut Slot<R> {
        let default_page_size = self.default_page_size;
        self.slots.entry(key).or_insert_with(|| {
            debug!("Creating view {key} on first access");
            let profile = ViewProfile::new(default_page_size);
            Slot {
                state: profile.fresh_state(),
                profile,
            }
        })
    }

    /// State for `key`, created with default values if the key is unknown.
    pub fn get_or_create(&mut self, key: ViewKey) -> &mut ViewState<R> {
        &mut self.slot_mut(key).state
    }

    pub fn profile(&self, key: ViewKey) -> Option<&ViewProfile<R>> {
        self.slots.get(&key).map(|slot| &slot.profile)
    }

    /// State and selection rules for `key`, creating the view if needed.
    pub fn state_and_policy(&mut self, key: ViewKey) -> (&mut ViewState<R>, SelectionPolicy<'_, R>) {
        let slot = self.slot_mut(key);
        (&mut slot.state, SelectionPolicy::new(slot.profile.selectable.as_ref()))
    }

    /// Applies `patch` to the view for `key`.
    ///
    /// A selection in the patch is filtered through the view's selection
    /// rules first, so rejected keys never land in the state.
    pub fn update(&mut self, key: ViewKey, mut patch: ViewPatch) -> ViewChanges {
        let (state, policy) = self.state_and_policy(key);
        if let Some(selection) = patch.selection.take() {
            patch.selection = Some(policy.sanitize(state, selection));
        }
        state.apply(patch)
    }

    /// Restores registration defaults and clears filter, page and selection.
    ///
    /// The cached rows stay; if the fetch parameters moved the view is marked
    /// stale instead.
    pub fn reset(&mut self, key: ViewKey) -> ViewChanges {
        let slot = self.slot_mut(key);
        let profile = &slot.profile;
        let patch = ViewPatch::default()
            .raw_filter("")
            .committed_filter("")
            .page(1)
            .page_size(profile.page_size)
            .sort(profile.sort)
            .visible_columns(profile.visible_columns.clone())
            .selection(Default::default());
        let changes = slot.state.apply(patch);
        if changes.filter || changes.page || changes.page_size || changes.sort {
            slot.state.stale = true;
        }
        changes
    }
}
