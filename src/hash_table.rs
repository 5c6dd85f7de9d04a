//! The raw open-addressing hash table.
//!
//! [`HashTable<T>`] stores elements of type `T` in a contiguous slot array
//! and resolves collisions by linear probing. Unlike a standard map, every
//! operation takes the element's 64-bit hash and an equality predicate; the
//! table itself never hashes or compares keys. This makes it a suitable
//! building block for maps, sets, interners, and caches that want full
//! control over hashing.
//!
//! Removal marks the slot with a tombstone rather than emptying it, so probe
//! chains that ran through the removed element still terminate correctly.
//! Tombstones are compacted away by the next resize.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Debug;
use core::mem;

/// Number of slots allocated on first insertion.
const INITIAL_CAPACITY: usize = 16;

/// The growth threshold, expressed as a rational so the trigger comparison
/// stays in integer arithmetic.
///
/// Growth is due when `(occupied + tombstones) / capacity` exceeds the
/// fraction. Tombstones count because they cost probe distance even though
/// they hold no data. The default is 2/3.
///
/// A valid load factor is strictly between zero and one, which guarantees
/// the slot array always retains at least one empty slot and therefore that
/// every probe terminates.
///
/// # Examples
///
/// ```rust
/// use probe_hash::hash_table::LoadFactor;
///
/// assert!(LoadFactor::new(3, 4).is_some());
/// assert!(LoadFactor::new(4, 4).is_none());
/// assert!(LoadFactor::new(0, 4).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadFactor {
    numerator: usize,
    denominator: usize,
}

impl LoadFactor {
    /// The default growth threshold of 2/3.
    pub const DEFAULT: LoadFactor = LoadFactor {
        numerator: 2,
        denominator: 3,
    };

    /// Creates a load factor of `numerator / denominator`.
    ///
    /// Returns `None` unless `0 < numerator < denominator`.
    pub fn new(numerator: usize, denominator: usize) -> Option<Self> {
        if numerator == 0 || numerator >= denominator {
            return None;
        }
        Some(LoadFactor {
            numerator,
            denominator,
        })
    }

    /// Whether `used` pressure over `capacity` slots exceeds this fraction.
    ///
    /// Widened to u128 so the cross-multiplication cannot overflow.
    #[inline]
    fn exceeded_by(self, used: usize, capacity: usize) -> bool {
        used as u128 * self.denominator as u128 > self.numerator as u128 * capacity as u128
    }
}

impl Default for LoadFactor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The error returned when the table fails to allocate or grow its slot
/// array.
///
/// Every operation that may allocate reports failure through this type
/// instead of aborting, so callers under memory pressure can back off and
/// recover. Operations that never allocate (`find`, `remove`, `clear`) are
/// infallible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TryReserveError {
    /// Doubling the slot array would overflow `usize`.
    CapacityOverflow,
    /// The allocator declined to provide the requested slot array.
    AllocError,
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryReserveError::CapacityOverflow => {
                f.write_str("capacity overflow while growing hash table")
            }
            TryReserveError::AllocError => {
                f.write_str("allocation failed while growing hash table")
            }
        }
    }
}

impl core::error::Error for TryReserveError {}

impl From<alloc::collections::TryReserveError> for TryReserveError {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        TryReserveError::AllocError
    }
}

/// One storage unit in the slot array.
///
/// Only `Occupied` slots are elements. `Tombstone` marks a removed element
/// whose slot is still "pressure" for probing purposes until the next
/// resize compacts it away. The element's hash is stored alongside it so
/// resize can re-derive home indices without re-invoking the hash function.
#[derive(Clone)]
enum Slot<T> {
    Empty,
    Tombstone,
    Occupied { hash: u64, item: T },
}

/// Allocates `capacity` empty slots, reporting failure instead of aborting.
fn allocate_slots<T>(capacity: usize) -> Result<Box<[Slot<T>]>, TryReserveError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots.into_boxed_slice())
}

/// A hash table using linear probing with tombstone deletion.
///
/// `HashTable<T>` owns its elements inline in the slot array. Every
/// operation requires the element's hash and an equality predicate; the
/// caller must ensure the hash is deterministic for equal elements and the
/// predicate is consistent with it (equal elements hash identically). The
/// table does not check this obligation at runtime.
///
/// A new table holds no backing storage. The first insertion allocates 16
/// slots; the table doubles whenever occupied-plus-tombstone pressure
/// exceeds the [`LoadFactor`]. Lookups and removals on a never-allocated
/// table answer "not found" without allocating.
///
/// ## Ownership
///
/// Overwritten and removed elements are returned to the caller; the table
/// drops elements only when it discards them without returning them, that
/// is in [`clear`](HashTable::clear), [`reset`](HashTable::reset), and its
/// own `Drop`. Each element is therefore dropped exactly once, by exactly
/// one owner.
///
/// ## Example
///
/// ```rust
/// use probe_hash::hash_table::HashTable;
///
/// fn hash_id(id: u64) -> u64 {
///     // Any deterministic hash works; production callers want a real
///     // hasher here.
///     id.wrapping_mul(0x9E37_79B9_7F4A_7C15)
/// }
///
/// let mut table: HashTable<(u64, &str)> = HashTable::new();
/// table
///     .insert(hash_id(1), |a, b| a.0 == b.0, (1, "one"))
///     .unwrap();
///
/// assert_eq!(table.find(hash_id(1), |&(id, _)| id == 1), Some(&(1, "one")));
/// assert_eq!(table.remove(hash_id(1), |&(id, _)| id == 1), Some((1, "one")));
/// assert!(table.is_empty());
/// ```
#[derive(Clone)]
pub struct HashTable<T> {
    slots: Box<[Slot<T>]>,
    /// Occupied slots; the externally visible size.
    live: usize,
    /// Occupied plus tombstone slots; drives growth decisions.
    used: usize,
    load_factor: LoadFactor,
}

impl<T> Debug for HashTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("live", &self.live)
            .field("used", &self.used)
            .field("capacity", &self.slots.len())
            .field("load_factor", &self.load_factor)
            .finish_non_exhaustive()
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashTable<T> {
    /// Creates a new, unallocated table with the default load factor.
    ///
    /// No backing storage is allocated until the first insertion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    ///
    /// let table: HashTable<u64> = HashTable::new();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 0);
    /// ```
    pub fn new() -> Self {
        Self::with_load_factor(LoadFactor::DEFAULT)
    }

    /// Creates a new, unallocated table with the given load factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    /// use probe_hash::hash_table::LoadFactor;
    ///
    /// let lf = LoadFactor::new(1, 2).unwrap();
    /// let table: HashTable<u64> = HashTable::with_load_factor(lf);
    /// assert_eq!(table.load_factor(), lf);
    /// ```
    pub fn with_load_factor(load_factor: LoadFactor) -> Self {
        Self {
            slots: Vec::new().into_boxed_slice(),
            live: 0,
            used: 0,
            load_factor,
        }
    }

    /// Returns the number of elements in the table.
    ///
    /// Tombstones are not elements and do not count.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the number of slots in the backing array.
    ///
    /// Zero until the first insertion allocates. The table resizes before
    /// the slot array fills, so capacity is always larger than `len()` once
    /// allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the growth threshold this table was configured with.
    pub fn load_factor(&self) -> LoadFactor {
        self.load_factor
    }

    /// The home index for `hash` in the current slot array.
    ///
    /// Callers must ensure the table is allocated.
    #[inline]
    fn home(&self, hash: u64) -> usize {
        hash as usize % self.slots.len()
    }

    /// The doubled capacity for the next resize.
    fn grown_capacity(&self) -> Result<usize, TryReserveError> {
        self.slots
            .len()
            .checked_mul(2)
            .ok_or(TryReserveError::CapacityOverflow)
    }

    /// Allocates the initial slot array if the table has never allocated.
    fn allocate_if_unallocated(&mut self) -> Result<(), TryReserveError> {
        if self.slots.is_empty() {
            self.slots = allocate_slots(INITIAL_CAPACITY)?;
        }
        Ok(())
    }

    /// Moves every live element into a fresh array of `new_capacity` slots.
    ///
    /// Home indices are recomputed from the stored hashes, so the hash
    /// function is never re-invoked. Tombstones are dropped on the floor,
    /// which resets `used` to `live`. Elements are relocated, never
    /// dropped.
    ///
    /// On allocation failure the table is left untouched.
    fn resize(&mut self, new_capacity: usize) -> Result<(), TryReserveError> {
        let new_slots = allocate_slots(new_capacity)?;
        let old_slots = mem::replace(&mut self.slots, new_slots);

        for slot in old_slots.into_vec() {
            if let Slot::Occupied { hash, item } = slot {
                let mut index = self.home(hash);
                while !matches!(self.slots[index], Slot::Empty) {
                    index = (index + 1) % new_capacity;
                }
                self.slots[index] = Slot::Occupied { hash, item };
            }
        }

        self.used = self.live;
        Ok(())
    }

    /// Inserts `value` with the given hash, or overwrites the element it is
    /// equal to.
    ///
    /// `eq` is invoked as `eq(existing, &value)` for every occupied slot the
    /// probe visits, so the predicate compares two whole elements rather
    /// than capturing the new one.
    ///
    /// Returns `Ok(Some(old))` if an equal element was already present; its
    /// replacement happens in place and ownership of the old element
    /// transfers back to the caller. Returns `Ok(None)` if the value took a
    /// previously empty slot.
    ///
    /// This is the only operation that allocates: it lazily allocates the
    /// initial slots, grows when the load factor is exceeded, and as a last
    /// resort forces a doubling if a probe visits more than `capacity`
    /// slots without terminating (possible only under degenerate hash
    /// distributions). All three paths report failure via
    /// [`TryReserveError`] and leave the table usable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<(u32, u32)> = HashTable::new();
    /// assert_eq!(table.insert(7, |a, b| a.0 == b.0, (7, 1)).unwrap(), None);
    /// assert_eq!(
    ///     table.insert(7, |a, b| a.0 == b.0, (7, 2)).unwrap(),
    ///     Some((7, 1))
    /// );
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(
        &mut self,
        hash: u64,
        eq: impl Fn(&T, &T) -> bool,
        value: T,
    ) -> Result<Option<T>, TryReserveError> {
        self.allocate_if_unallocated()?;

        if self.load_factor.exceeded_by(self.used, self.slots.len()) {
            let grown = self.grown_capacity()?;
            self.resize(grown)?;
        }

        let mut index = self.home(hash);
        let mut visited = 0usize;
        loop {
            match &mut self.slots[index] {
                slot @ Slot::Empty => {
                    *slot = Slot::Occupied { hash, item: value };
                    self.live += 1;
                    self.used += 1;
                    return Ok(None);
                }
                Slot::Occupied { item, .. } if eq(item, &value) => {
                    return Ok(Some(mem::replace(item, value)));
                }
                // Tombstone or a different element: keep probing. Tombstones
                // are not reused; the next resize reclaims them.
                _ => {}
            }

            visited += 1;
            if visited > self.slots.len() {
                // Pathological clustering. Force a doubling and restart the
                // probe from the new home index, which bounds worst-case
                // probe length even under adversarial hashes.
                let grown = self.grown_capacity()?;
                self.resize(grown)?;
                index = self.home(hash);
                visited = 0;
                continue;
            }
            index = (index + 1) % self.slots.len();
        }
    }

    /// Walks the probe sequence for `hash` and returns the index of the
    /// occupied slot the predicate matches.
    ///
    /// An empty slot ends an unsuccessful search; tombstones and
    /// non-matching occupied slots are stepped over. The walk is bounded to
    /// one full revolution of the slot array so it terminates even if no
    /// empty slot remains.
    fn find_index(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }

        let mut index = self.home(hash);
        for _ in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied { item, .. } if eq(item) => return Some(index),
                _ => {}
            }
            index = (index + 1) % self.slots.len();
        }

        None
    }

    /// Returns a reference to the element matching the predicate, if any.
    ///
    /// Never allocates; an unallocated table reports `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<(u32, &str)> = HashTable::new();
    /// assert_eq!(table.find(3, |&(k, _)| k == 3), None);
    ///
    /// table.insert(3, |a, b| a.0 == b.0, (3, "three")).unwrap();
    /// assert_eq!(table.find(3, |&(k, _)| k == 3), Some(&(3, "three")));
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&T> {
        let index = self.find_index(hash, eq)?;
        if let Slot::Occupied { item, .. } = &self.slots[index] {
            Some(item)
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element matching the predicate,
    /// if any.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&mut T> {
        let index = self.find_index(hash, eq)?;
        if let Slot::Occupied { item, .. } = &mut self.slots[index] {
            Some(item)
        } else {
            None
        }
    }

    /// Removes and returns the element matching the predicate, if any.
    ///
    /// The vacated slot becomes a tombstone so probe chains through it keep
    /// working; the tombstone's pressure on the load factor remains until
    /// the next resize compacts it. Ownership of the element transfers to
    /// the caller, so the table does not drop it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<(u32, &str)> = HashTable::new();
    /// table.insert(3, |a, b| a.0 == b.0, (3, "three")).unwrap();
    ///
    /// assert_eq!(table.remove(3, |&(k, _)| k == 3), Some((3, "three")));
    /// assert_eq!(table.remove(3, |&(k, _)| k == 3), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.find_index(hash, eq)?;
        match mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Occupied { item, .. } => {
                self.live -= 1;
                Some(item)
            }
            // find_index only reports occupied slots.
            _ => None,
        }
    }

    /// Drops every element and resets every slot to empty, keeping the
    /// backing storage.
    ///
    /// Prior tombstones are cleared as well. Returns the number of elements
    /// dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<(u32, u32)> = HashTable::new();
    /// table.insert(1, |a, b| a.0 == b.0, (1, 1)).unwrap();
    /// table.insert(2, |a, b| a.0 == b.0, (2, 2)).unwrap();
    ///
    /// let capacity = table.capacity();
    /// assert_eq!(table.clear(), 2);
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn clear(&mut self) -> usize {
        let mut removed = 0;
        for slot in self.slots.iter_mut() {
            if matches!(slot, Slot::Occupied { .. }) {
                removed += 1;
            }
            *slot = Slot::Empty;
        }

        self.live = 0;
        self.used = 0;
        removed
    }

    /// Drops every element and releases the backing storage, returning the
    /// table to its unallocated state.
    ///
    /// The handle stays valid: the next insertion re-allocates from
    /// scratch. Dropping the table has the same effect on the elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<(u32, u32)> = HashTable::new();
    /// table.insert(1, |a, b| a.0 == b.0, (1, 1)).unwrap();
    ///
    /// table.reset();
    /// assert_eq!(table.capacity(), 0);
    ///
    /// table.insert(2, |a, b| a.0 == b.0, (2, 2)).unwrap();
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn reset(&mut self) {
        self.slots = Vec::new().into_boxed_slice();
        self.live = 0;
        self.used = 0;
    }

    /// Returns an iterator over the elements of the table, in arbitrary
    /// order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: self.slots.iter(),
        }
    }

    /// Occupied + tombstone slots, exposed for invariant checks.
    #[cfg(test)]
    fn used(&self) -> usize {
        self.used
    }
}

/// An iterator over the elements of a [`HashTable`].
pub struct Iter<'a, T> {
    slots: core::slice::Iter<'a, Slot<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.slots.next()? {
                Slot::Occupied { item, .. } => return Some(item),
                _ => continue,
            }
        }
    }
}
