//! The operator's selection set.
//!
//! Selections are keyed by [`SelectionKey`] `(entity_index, media_id)`, so
//! the same provider id picked under two different people yields two
//! entries. Insertion order is preserved; it is the row order of the CSV
//! export. Every operation is total and idempotent under re-application,
//! and bulk operations on one kind never touch the other kind.

use std::collections::HashSet;

use crate::models::{MediaItem, MediaKind, PersonResults, Selection, SelectionKey};

#[derive(Debug, Clone, Default)]
pub struct SelectionLedger {
    entries: Vec<Selection>,
    keys: HashSet<SelectionKey>,
}

impl SelectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selections in ledger order.
    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Selection] {
        &self.entries
    }

    pub fn count_of_kind(&self, kind: MediaKind) -> usize {
        self.entries.iter().filter(|s| s.kind == kind).count()
    }

    pub fn is_selected(&self, entity_index: usize, media_id: &str) -> bool {
        self.keys
            .contains(&SelectionKey::new(entity_index, media_id.to_string()))
    }

    /// Adds the item if absent, removes it if present.
    ///
    /// Returns `true` when the item is selected afterwards.
    pub fn toggle(
        &mut self,
        entity_index: usize,
        entity_name: &str,
        media: &MediaItem,
        kind: MediaKind,
    ) -> bool {
        let key = SelectionKey::new(entity_index, media.id.clone());
        if self.keys.remove(&key) {
            self.entries.retain(|s| s.key() != key);
            false
        } else {
            self.push(Selection::new(entity_index, entity_name, media, kind));
            true
        }
    }

    /// Replaces every `(entity_index, kind)` selection with one per item.
    ///
    /// Returns how many selections of `kind` the person holds afterwards.
    /// Items whose id is already selected under the other kind are skipped.
    pub fn select_all_of_kind(
        &mut self,
        entity_index: usize,
        entity_name: &str,
        items: &[MediaItem],
        kind: MediaKind,
    ) -> usize {
        self.remove_where(|s| s.entity_index == entity_index && s.kind == kind);
        items
            .iter()
            .filter(|media| self.push(Selection::new(entity_index, entity_name, media, kind)))
            .count()
    }

    pub fn deselect_all_of_kind(&mut self, entity_index: usize, kind: MediaKind) {
        self.remove_where(|s| s.entity_index == entity_index && s.kind == kind);
    }

    /// Replaces every selection of `kind` with all items of that kind across
    /// every person's results.
    pub fn select_all_global(&mut self, kind: MediaKind, results: &[PersonResults]) {
        self.remove_where(|s| s.kind == kind);
        for (entity_index, result) in results.iter().enumerate() {
            for media in result.items(kind) {
                self.push(Selection::new(
                    entity_index,
                    &result.person.name,
                    media,
                    kind,
                ));
            }
        }
    }

    pub fn deselect_all_global(&mut self, kind: MediaKind) {
        self.remove_where(|s| s.kind == kind);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
    }

    // Skips the push if the key is already taken (e.g. the same id under
    // the other kind), so at most one selection exists per key.
    fn push(&mut self, selection: Selection) -> bool {
        let inserted = self.keys.insert(selection.key());
        if inserted {
            self.entries.push(selection);
        }
        inserted
    }

    fn remove_where(&mut self, pred: impl Fn(&Selection) -> bool) {
        let keys = &mut self.keys;
        self.entries.retain(|s| {
            if pred(s) {
                keys.remove(&s.key());
                false
            } else {
                true
            }
        });
    }
}
