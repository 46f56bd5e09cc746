//! Cascading category selection over the two category trees
//!
//! Each tree has four levels. The options offered at a level are the children
//! of whatever is selected one level above, and changing a level clears every
//! level below it in the same tree.

use incident_types::{CategorySlot, Depth, Tag, TagId, Tree};
use serde::Serialize;
use std::sync::Arc;

use crate::taxonomy::TaxonomyIndex;

/// Selected tag per category level, four per tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorySelection {
    primary: [Option<TagId>; 4],
    secondary: [Option<TagId>; 4],
}

impl CategorySelection {
    pub fn get(&self, slot: CategorySlot) -> Option<TagId> {
        self.tree(slot.tree)[slot.depth.index()]
    }

    pub fn tree(&self, tree: Tree) -> &[Option<TagId>; 4] {
        match tree {
            Tree::Primary => &self.primary,
            Tree::Secondary => &self.secondary,
        }
    }

    /// Write one slot without cascading.
    ///
    /// Hydration uses this: persisted levels are restored independently.
    pub fn set(&mut self, slot: CategorySlot, value: Option<TagId>) {
        self.tree_mut(slot.tree)[slot.depth.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategorySlot, Option<TagId>)> + '_ {
        CategorySlot::ALL
            .into_iter()
            .map(move |slot| (slot, self.get(slot)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, value)| value.is_none())
    }

    fn tree_mut(&mut self, tree: Tree) -> &mut [Option<TagId>; 4] {
        match tree {
            Tree::Primary => &mut self.primary,
            Tree::Secondary => &mut self.secondary,
        }
    }

    fn clear_below(&mut self, slot: CategorySlot) {
        let levels = self.tree_mut(slot.tree);
        for depth in slot.depth.descendants() {
            levels[depth.index()] = None;
        }
    }
}

/// Category selection bound to the taxonomy it selects from
#[derive(Debug, Clone)]
pub struct CascadingSelector {
    index: Arc<TaxonomyIndex>,
    selection: CategorySelection,
}

impl CascadingSelector {
    pub fn new(index: Arc<TaxonomyIndex>) -> Self {
        Self::with_selection(index, CategorySelection::default())
    }

    pub fn with_selection(index: Arc<TaxonomyIndex>, selection: CategorySelection) -> Self {
        Self { index, selection }
    }

    pub fn selection(&self) -> &CategorySelection {
        &self.selection
    }

    pub fn into_selection(self) -> CategorySelection {
        self.selection
    }

    /// Tags for `slot` whose parent is `parent`, in source order.
    ///
    /// Empty when `parent` is absent.
    pub fn children_of(&self, slot: CategorySlot, parent: Option<TagId>) -> Vec<&Tag> {
        self.index.children_of(slot.kind(), parent)
    }

    /// Options currently offered at `slot`
    pub fn options(&self, slot: CategorySlot) -> Vec<&Tag> {
        match slot.parent() {
            None => self.index.roots(slot.tree),
            Some(parent) => self.children_of(slot, self.selection.get(parent)),
        }
    }

    /// Whether the control for `slot` accepts input: roots always do,
    /// deeper levels only once their parent level is selected
    pub fn is_enabled(&self, slot: CategorySlot) -> bool {
        match slot.parent() {
            None => true,
            Some(parent) => self.selection.get(parent).is_some(),
        }
    }

    /// Select `value` at `slot` and clear the levels below it in the same tree.
    ///
    /// Returns false, changing nothing, when the parent level is empty, the
    /// id is not among the slot's current options, or the value is already
    /// selected.
    pub fn select(&mut self, slot: CategorySlot, value: Option<TagId>) -> bool {
        if !self.is_enabled(slot) {
            tracing::trace!(%slot, "Ignoring selection under an empty parent");
            return false;
        }
        if let Some(id) = value {
            if !self.options(slot).iter().any(|tag| tag.id == id) {
                tracing::debug!(%slot, %id, "Ignoring id not offered at this level");
                return false;
            }
        }
        if self.selection.get(slot) == value {
            return false;
        }

        self.selection.set(slot, value);
        self.selection.clear_below(slot);
        true
    }

    /// [`select`](Self::select) addressed by one-based level; out-of-range
    /// levels are ignored
    pub fn select_level(&mut self, tree: Tree, level: usize, value: Option<TagId>) -> bool {
        match CategorySlot::new(tree, level) {
            Some(slot) => self.select(slot, value),
            None => false,
        }
    }

    /// Clear a whole tree
    pub fn reset(&mut self, tree: Tree) {
        self.selection.set(CategorySlot::of(tree, Depth::One), None);
        self.selection.clear_below(CategorySlot::of(tree, Depth::One));
    }
}
