//! Typed, ordered store of document entries with validity queries.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use log::trace;

use super::error::{Error, Result};
use super::validity::ValidityKey;

/// One indexed document contribution of a given data type.
#[derive(Debug, Clone)]
pub struct DocumentEntry<K: ValidityKey, A> {
    /// Identifier of the document.
    pub doc_id: String,
    /// End of the validity period, considered only if set.
    pub valid_to: K,
    /// Arbitrary per-entry state recorded at discovery time.
    pub aux: A,
}

/// Query result: validity starts paired with the entries to apply, in
/// application order.
pub type Updates<'a, K, A> = Vec<(K, &'a DocumentEntry<K, A>)>;

/// Per-type index of document entries ordered by validity start.
///
/// Entries with an equal start keep their insertion order, so later
/// definitions shadow earlier ones where queries call for it. Entries are
/// never mutated after insertion and removal is not supported.
#[derive(Debug)]
pub struct ValidityIndex<K: ValidityKey, A> {
    types: HashMap<String, BTreeMap<K, Vec<DocumentEntry<K, A>>>>,
}

impl<K: ValidityKey, A> ValidityIndex<K, A> {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Appends a document entry for a data type. Nothing is merged or
    /// deduplicated; overlap policies belong to higher layers.
    pub fn add_entry(&mut self, doc_id: &str, data_type: &str, from: K, to: K, aux: A) {
        trace!("index entry: type={data_type} doc={doc_id} from={from:?} to={to:?}");
        self.types
            .entry(data_type.to_string())
            .or_default()
            .entry(from)
            .or_default()
            .push(DocumentEntry {
                doc_id: doc_id.to_string(),
                valid_to: to,
                aux,
            });
    }

    /// Returns all entries still valid for `key`, in application order.
    ///
    /// Entries start at or before `key`, ordered by ascending start and
    /// insertion order at equal starts. Entries whose end is set and does
    /// not exceed `key` are stale and skipped. An unknown type yields an
    /// empty list when `lenient`, an unknown-type error otherwise.
    pub fn updates(&self, type_name: &str, key: K, lenient: bool) -> Result<Updates<'_, K, A>> {
        let by_from = match self.types.get(type_name) {
            Some(m) => m,
            None if lenient => return Ok(Vec::new()),
            None => {
                return Err(Error::UnknownDataType {
                    type_name: type_name.to_string(),
                })
            }
        };
        let mut updates = Vec::new();
        for (&from, bucket) in by_from.range(..=key) {
            for entry in bucket {
                if entry.valid_to.is_set() && !key.precedes(entry.valid_to) {
                    continue; // stale
                }
                updates.push((from, entry));
            }
        }
        Ok(updates)
    }

    /// Returns entries whose validity start lies in `(old_key, new_key]`.
    ///
    /// An unset `old_key` starts at the beginning and an unset `new_key`
    /// continues to the end. Unless `keep_stale` is set, entries whose end
    /// does not exceed `new_key` are skipped.
    pub fn updates_between(
        &self,
        type_name: &str,
        old_key: K,
        new_key: K,
        lenient: bool,
        keep_stale: bool,
    ) -> Result<Updates<'_, K, A>> {
        let by_from = match self.types.get(type_name) {
            Some(m) => m,
            None if lenient => return Ok(Vec::new()),
            None => {
                return Err(Error::UnknownDataType {
                    type_name: type_name.to_string(),
                })
            }
        };
        if old_key.is_set() && new_key.is_set() && !old_key.precedes(new_key) {
            return Ok(Vec::new());
        }
        let lower = if old_key.is_set() {
            Bound::Excluded(old_key)
        } else {
            Bound::Unbounded
        };
        let upper = if new_key.is_set() {
            Bound::Included(new_key)
        } else {
            Bound::Unbounded
        };
        let mut updates = Vec::new();
        for (&from, bucket) in by_from.range((lower, upper)) {
            for entry in bucket {
                if !keep_stale
                    && new_key.is_set()
                    && entry.valid_to.is_set()
                    && !new_key.precedes(entry.valid_to)
                {
                    continue; // stale
                }
                updates.push((from, entry));
            }
        }
        Ok(updates)
    }

    /// Returns the most recent entry valid for `key`.
    ///
    /// The entry with the greatest start at or before `key` whose end is
    /// open or beyond `key` wins; at equal starts the latest inserted one
    /// shadows the others. Fails with unknown-type when the type was never
    /// indexed and with no-data when no entry qualifies.
    pub fn latest(&self, type_name: &str, key: K) -> Result<(K, &DocumentEntry<K, A>)> {
        let by_from = self
            .types
            .get(type_name)
            .ok_or_else(|| Error::UnknownDataType {
                type_name: type_name.to_string(),
            })?;
        for (&from, bucket) in by_from.range(..=key).rev() {
            for entry in bucket.iter().rev() {
                if !entry.valid_to.is_set() || key.precedes(entry.valid_to) {
                    return Ok((from, entry));
                }
            }
        }
        Err(Error::NoData {
            type_name: type_name.to_string(),
            key: key.to_text(),
        })
    }

    /// Immutable view of the per-type entries.
    pub fn entries(&self) -> &HashMap<String, BTreeMap<K, Vec<DocumentEntry<K, A>>>> {
        &self.types
    }
}

impl<K: ValidityKey, A> Default for ValidityIndex<K, A> {
    fn default() -> Self {
        Self::new()
    }
}
