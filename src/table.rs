//! The working table threaded through C4–C6: one entry per setting, moving
//! from a raw parsed value to a typed (and possibly re-keyed) one as the
//! pipeline progresses.
//!
//! Kept as a flat, insertion-ordered `Vec` rather than a map — matching
//! spec.md §3's "no duplicate keys" invariant via an explicit check on
//! insert rather than relying on a map type's own dedup, since later passes
//! need to *replace* an entry's key (aggregation re-parents matched entries
//! under `to`, translation can replace a value in place) which a plain
//! `HashMap` keyed by the original `KeyPath` can't express as cleanly.

use tracing::trace;

use crate::value::{KeyPath, RawValue, TypedValue};

/// A single working-table slot: either still raw (not yet claimed by any
/// non-`Complex` mapping) or coerced/aggregated/translated into a typed
/// value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    Raw(RawValue),
    Typed(TypedValue),
}

impl Entry {
    pub(crate) fn is_typed(&self) -> bool {
        matches!(self, Self::Typed(_))
    }

    pub(crate) fn as_raw(&self) -> Option<&RawValue> {
        match self {
            Self::Raw(raw) => Some(raw),
            Self::Typed(_) => None,
        }
    }

    pub(crate) fn as_typed(&self) -> Option<&TypedValue> {
        match self {
            Self::Typed(v) => Some(v),
            Self::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct WorkingTable {
    entries: Vec<(KeyPath, Entry)>,
}

impl WorkingTable {
    /// Builds a table from C1's parsed `(key, raw value)` pairs. A later
    /// assignment for the same key overwrites an earlier one in place,
    /// keeping its original position — this is the "no duplicate keys"
    /// invariant: the table never holds two entries for the same key.
    pub(crate) fn from_pairs(pairs: Vec<(KeyPath, RawValue)>) -> Self {
        let mut table = Self::default();
        for (key, raw) in pairs {
            table.set(key, Entry::Raw(raw));
        }
        table
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(KeyPath, Entry)> {
        self.entries.iter()
    }

    pub(crate) fn entries(&self) -> &[(KeyPath, Entry)] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<(KeyPath, Entry)> {
        self.entries
    }

    /// Inserts or overwrites the entry for `key`, preserving its original
    /// position when overwriting.
    pub(crate) fn set(&mut self, key: KeyPath, entry: Entry) {
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            trace!(key = %existing.0, "overwriting existing working-table entry");
            existing.1 = entry;
        } else {
            self.entries.push((key, entry));
        }
    }

    pub(crate) fn contains(&self, key: &KeyPath) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub(crate) fn get(&self, key: &KeyPath) -> Option<&Entry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    /// Returns the indices of untyped entries whose key has the same length
    /// as, and matches, `pattern`.
    pub(crate) fn matching_raw_indices(&self, pattern: &KeyPath) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, (key, entry))| !entry.is_typed() && key.len() == pattern.len() && pattern.matches(key))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Returns `(index, key, value)` for typed entries whose key has the
    /// same length as, and matches, `pattern` — used by the translator (C6).
    pub(crate) fn matching_typed(&self, pattern: &KeyPath) -> Vec<(usize, KeyPath, TypedValue)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(idx, (key, entry))| {
                if key.len() == pattern.len() && pattern.matches(key) {
                    entry.as_typed().map(|v| (idx, key.clone(), v.clone()))
                } else {
                    None
                }
            })
            .collect()
    }

    pub(crate) fn replace_at(&mut self, idx: usize, key: KeyPath, entry: Entry) {
        self.entries[idx] = (key, entry);
    }

    /// Removes entries at the given indices (order-preserving for the rest).
    pub(crate) fn remove_indices(&mut self, mut indices: Vec<usize>) {
        indices.sort_unstable();
        indices.dedup();
        for idx in indices.into_iter().rev() {
            self.entries.remove(idx);
        }
    }

    /// A read-only snapshot of all currently-typed entries, handed to
    /// arity-3 translation functions as their accumulator (spec.md §4.6).
    pub(crate) fn typed_snapshot(&self) -> Vec<(KeyPath, TypedValue)> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| entry.as_typed().map(|v| (key.clone(), v.clone())))
            .collect()
    }
}
