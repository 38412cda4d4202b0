/*!

A `PropertyValueStore<V>` holds the local property overrides of a single UI
object: a sorted map from [`PropertyId`] to a value of type `V`.

Every property read and write in the toolkit goes through one of these stores,
once per object per property, so the implementation is tuned for the workload
actually observed there:

- Reads vastly outnumber writes, so lookup cost dominates.
- A typical object carries only a handful of overrides (2–30), so a
  constant-factor-optimized linear scan beats binary search in the common
  case. A hybrid search switches to binary search past a size-class
  threshold to keep pathological objects logarithmic.
- Stores are numerous and individually tiny, so the backing buffer is always
  sized exactly to the entry count: every structural mutation performs exactly
  one allocation, and value-only updates perform none. A store with no
  overrides holds a zero-length buffer, which allocates nothing at all.

Entries are kept in a contiguous array-of-structs so the scan stays
cache-friendly; a generic balanced tree would regress both allocation count
and locality.

Objects constructed in bulk (from a style or template) can set the
initializing flag to append values without searching, deferring a single sort
to the end of the phase. See [`PropertyValueStore::set_initializing`].

*/

use std::mem;

use log::debug;

use crate::property::PropertyId;

/// Backing lengths at or below this threshold are searched with the linear
/// scan; longer stores use binary search. The crossover is a tunable constant:
/// 11 was chosen by benchmarking typical override counts (see
/// `benches/value_store.rs`), and a different target may prefer another value.
pub const LINEAR_SEARCH_MAX: usize = 11;

/// Binary search hands off to the linear scan once the candidate window is at
/// most this wide, avoiding the branch mispredictions of the last few halvings.
const BINARY_SEARCH_WINDOW: usize = 3;

#[derive(Clone, Debug)]
struct Entry<V> {
    id: PropertyId,
    value: V,
}

/// A sparse, sorted map from [`PropertyId`] to `V`, owned by exactly one UI
/// object at a time.
///
/// Misuse of the contract-checked operations ([`add`](Self::add) on a present
/// id, [`set`](Self::set) on an absent one, [`entry_at`](Self::entry_at) out
/// of range) panics; absent ids are otherwise well-defined
/// ([`get`](Self::get) returns `None`, [`remove`](Self::remove) is a no-op).
#[derive(Clone, Debug)]
pub struct PropertyValueStore<V> {
    /// Sorted ascending by id, except transiently during bulk initialization.
    /// Length is always exactly the entry count.
    entries: Box<[Entry<V>]>,
    is_initializing: bool,
    /// Set when a bulk-initialization append broke the sort order.
    unsorted: bool,
}

impl<V> Default for PropertyValueStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PropertyValueStore<V> {
    /// Creates an empty store. Does not allocate; a zero-length boxed slice
    /// is the shared empty representation all stores start from and collapse
    /// back to.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Box::default(),
            is_initializing: false,
            unsorted: false,
        }
    }

    /// The number of local values currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds `id` with the hybrid search. Returns the entry's position on a
    /// hit, or the sorted insertion position on a miss, along with whether it
    /// was a hit.
    fn find(&self, id: PropertyId) -> (usize, bool) {
        debug_assert!(
            !self.unsorted,
            "property store searched while bulk initialization left it unsorted"
        );
        let entries = &self.entries;

        if entries.len() <= LINEAR_SEARCH_MAX {
            // Ascending order lets a single `>=` comparison per entry both
            // detect a hit and stop at the insertion position.
            for (position, entry) in entries.iter().enumerate() {
                if entry.id >= id {
                    return (position, entry.id == id);
                }
            }
            (entries.len(), false)
        } else {
            let mut low = 0;
            let mut high = entries.len();

            while high - low > BINARY_SEARCH_WINDOW {
                let pivot = (low + high) / 2;
                let probe = entries[pivot].id;

                if probe == id {
                    return (pivot, true);
                }
                if id < probe {
                    high = pivot;
                } else {
                    low = pivot + 1;
                }
            }

            // Finish the remaining window with the same short scan.
            while low < high {
                let probe = entries[low].id;
                if probe >= id {
                    return (low, probe == id);
                }
                low += 1;
            }

            (low, false)
        }
    }

    /// Returns the local value for `id`, or `None` if the object has no
    /// override for it. Never allocates.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&V> {
        let (position, found) = self.find(id);
        if found {
            Some(&self.entries[position].value)
        } else {
            None
        }
    }

    /// Mutable variant of [`get`](Self::get).
    #[must_use]
    pub fn get_mut(&mut self, id: PropertyId) -> Option<&mut V> {
        let (position, found) = self.find(id);
        if found {
            Some(&mut self.entries[position].value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn contains(&self, id: PropertyId) -> bool {
        self.find(id).1
    }

    /// Adds a local value for a property that has none yet.
    ///
    /// Allocates a backing buffer one entry larger and installs it; the old
    /// buffer stays valid until the copy completes, so an allocation failure
    /// leaves the store unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `id` already has a local value. Callers that cannot rule a
    /// duplicate out must check with [`contains`](Self::contains) or use
    /// [`set`](Self::set). (During bulk initialization no search is performed
    /// and duplicates are only caught by a debug assertion in the deferred
    /// sort.)
    pub fn add(&mut self, id: PropertyId, value: V) {
        if self.is_initializing {
            self.append(id, value);
            return;
        }

        let (position, found) = self.find(id);
        assert!(
            !found,
            "property {id:?} already has a local value; use `set` to overwrite it"
        );
        self.insert_at(position, id, value);
    }

    /// Bulk-initialization append: skip the search, fix the order later.
    fn append(&mut self, id: PropertyId, value: V) {
        if let Some(last) = self.entries.last() {
            if last.id >= id {
                self.unsorted = true;
            }
        }
        self.insert_at(self.entries.len(), id, value);
    }

    fn insert_at(&mut self, position: usize, id: PropertyId, value: V) {
        let old = mem::take(&mut self.entries).into_vec();
        let mut new = Vec::with_capacity(old.len() + 1);
        let mut rest = old.into_iter();

        new.extend(rest.by_ref().take(position));
        new.push(Entry { id, value });
        new.extend(rest);

        // Capacity equals length, so this does not reallocate.
        self.entries = new.into_boxed_slice();
    }

    /// Overwrites the local value for `id` in place. No allocation, no
    /// reordering.
    ///
    /// # Panics
    ///
    /// Panics if `id` has no local value.
    pub fn set(&mut self, id: PropertyId, value: V) {
        let (position, found) = self.find(id);
        assert!(
            found,
            "property {id:?} has no local value; use `add` to create one"
        );
        self.entries[position].value = value;
    }

    /// Removes and returns the local value for `id`, or `None` if there is
    /// none. Removing the last entry reinstates the non-allocating empty
    /// representation; otherwise one exact-size buffer is allocated.
    pub fn remove(&mut self, id: PropertyId) -> Option<V> {
        let (position, found) = self.find(id);
        if !found {
            return None;
        }

        // `mem::take` already left the empty representation in place, so the
        // single-entry case needs no further work.
        let mut rest = mem::take(&mut self.entries).into_vec().into_iter();
        if rest.len() == 1 {
            return rest.next().map(|entry| entry.value);
        }

        let mut new = Vec::with_capacity(rest.len() - 1);
        new.extend(rest.by_ref().take(position));
        let removed = rest.next();
        new.extend(rest);
        self.entries = new.into_boxed_slice();

        removed.map(|entry| entry.value)
    }

    /// Returns the entry at ordinal position `ordinal` (`0..len()`), in
    /// ascending id order.
    ///
    /// # Panics
    ///
    /// Panics if `ordinal >= len()`.
    #[must_use]
    pub fn entry_at(&self, ordinal: usize) -> (PropertyId, &V) {
        let entry = &self.entries[ordinal];
        (entry.id, &entry.value)
    }

    /// Iterates over all local values in ascending id order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Whether the store is in its bulk-initialization phase.
    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.is_initializing
    }

    /// Enters or leaves the bulk-initialization phase.
    ///
    /// While the flag is set, [`add`](Self::add) appends without searching
    /// for the insertion position, trading one sort for `n` searches when an
    /// object's values are all known up front. The owner must clear the flag
    /// before any lookup, removal, or enumeration; clearing it performs the
    /// deferred sort. Lookups while unsorted appended data is present are
    /// unspecified and guarded by a debug assertion.
    pub fn set_initializing(&mut self, is_initializing: bool) {
        self.is_initializing = is_initializing;

        if !is_initializing && self.unsorted {
            debug!(
                "sorting {} property values appended during bulk initialization",
                self.entries.len()
            );
            self.entries.sort_unstable_by_key(|entry| entry.id);
            debug_assert!(
                self.entries.windows(2).all(|pair| pair[0].id < pair[1].id),
                "duplicate property ids appended during bulk initialization"
            );
            self.unsorted = false;
        }
    }
}

/// Iterator over a store's entries in ascending id order. Created by
/// [`PropertyValueStore::iter`].
pub struct Iter<'a, V> {
    inner: std::slice::Iter<'a, Entry<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (PropertyId, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (entry.id, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<'a, V> IntoIterator for &'a PropertyValueStore<V> {
    type Item = (PropertyId, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
