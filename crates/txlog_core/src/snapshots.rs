//! Registry of snapshots held by running transactions.
//!
//! Snapshots are appended in begin order. Since they are read from a
//! monotonic counter, the head of the list is always the oldest snapshot in
//! use. Entries are removed through the [`SlotHandle`] returned at insertion,
//! never by value, so duplicates are harmless and removal is O(1).

use crate::types::Snapshot;

/// Position of an entry in a [`SnapshotList`].
///
/// The generation makes a handle single-use: once its slot is freed and
/// reused, the old handle no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    index: usize,
    generation: u32,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

struct Entry {
    snapshot: Snapshot,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena-backed doubly linked list of in-use snapshots.
#[derive(Default)]
pub struct SnapshotList {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl SnapshotList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot and returns the handle that removes it.
    pub fn push_back(&mut self, snapshot: Snapshot) -> SlotHandle {
        let entry = Entry {
            snapshot,
            prev: self.tail,
            next: None,
        };

        let index = if let Some(index) = self.free_list.pop() {
            self.slots[index].entry = Some(entry);
            index
        } else {
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            self.slots.len() - 1
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_entry) = self.slots[tail].entry.as_mut() {
                    tail_entry.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        SlotHandle {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Removes the entry behind `handle`.
    ///
    /// Returns `None` if the handle is stale or was never issued by this list.
    pub fn remove(&mut self, handle: SlotHandle) -> Option<Snapshot> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);

        match entry.prev {
            Some(prev) => {
                if let Some(prev_entry) = self.slots[prev].entry.as_mut() {
                    prev_entry.next = entry.next;
                }
            }
            None => self.head = entry.next,
        }
        match entry.next {
            Some(next) => {
                if let Some(next_entry) = self.slots[next].entry.as_mut() {
                    next_entry.prev = entry.prev;
                }
            }
            None => self.tail = entry.prev,
        }
        self.len -= 1;

        Some(entry.snapshot)
    }

    /// Returns true if `handle` refers to a live entry.
    #[must_use]
    pub fn contains(&self, handle: SlotHandle) -> bool {
        self.slots
            .get(handle.index)
            .is_some_and(|slot| slot.generation == handle.generation && slot.entry.is_some())
    }

    /// Returns the oldest snapshot in use.
    #[must_use]
    pub fn front(&self) -> Option<Snapshot> {
        let head = self.head?;
        self.slots[head].entry.as_ref().map(|e| e.snapshot)
    }

    /// Number of snapshots in use.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no snapshot is in use.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates snapshots oldest first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }
}

impl std::fmt::Debug for SnapshotList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotList")
            .field("len", &self.len)
            .field("front", &self.front())
            .field("free_count", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

/// Iterator over a [`SnapshotList`], oldest first.
pub struct Iter<'a> {
    list: &'a SnapshotList,
    cursor: Option<usize>,
}

impl Iterator for Iter<'_> {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        let index = self.cursor?;
        let entry = self.list.slots[index].entry.as_ref()?;
        self.cursor = entry.next;
        Some(entry.snapshot)
    }
}
