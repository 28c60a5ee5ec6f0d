//! Array-backed binary min-heap of tasks with stable entry handles.
//!
//! Entries live in a contiguous heap array; a side arena maps each stable
//! [`EntryId`] to the entry's current offset in that array. Every swap updates
//! both arena slots in the same `&mut self` call, so the arena always agrees
//! with the array and arbitrary removal stays O(log n).
//!
//! Ordering is by [`Task::priority`], lowest first. Tasks with equal priority
//! come out in no particular order: the heap does not preserve insertion order.

use crate::core::{QueueError, Task};

/// Stable handle to an entry, valid until that entry leaves the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    slot: usize,
    generation: u32,
}

#[derive(Debug)]
struct HeapEntry {
    id: EntryId,
    priority: i64,
    task: Task,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    /// Offset of the entry in the heap array, `None` when the slot is free.
    index: Option<usize>,
}

/// Binary min-heap keyed on task priority. Not thread-safe on its own; see
/// [`SafePriorityQueue`](super::SafePriorityQueue) for the locked wrapper.
#[derive(Debug, Default)]
pub struct PriorityHeap {
    entries: Vec<HeapEntry>,
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl PriorityHeap {
    /// Create an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a task in O(log n) and return its handle.
    pub fn push(&mut self, task: Task) -> EntryId {
        let index = self.entries.len();
        let id = self.allocate_slot(index);
        self.entries.push(HeapEntry {
            id,
            priority: task.priority(),
            task,
        });
        self.sift_up(index);
        id
    }

    /// Remove and return the lowest-priority-value task in O(log n).
    ///
    /// # Errors
    ///
    /// `QueueError::EmptyQueue` if there is nothing to pop.
    pub fn pop(&mut self) -> Result<Task, QueueError> {
        if self.entries.is_empty() {
            return Err(QueueError::EmptyQueue);
        }
        Ok(self.remove_at(0))
    }

    /// The task that [`pop`](Self::pop) would return next.
    #[must_use]
    pub fn peek(&self) -> Option<&Task> {
        self.entries.first().map(|entry| &entry.task)
    }

    /// Remove an arbitrary entry by handle. Returns `None` for a stale handle.
    pub fn remove(&mut self, id: EntryId) -> Option<Task> {
        let index = self.index_of(id)?;
        Some(self.remove_at(index))
    }

    /// Whether the handle still refers to a queued entry.
    #[must_use]
    pub fn contains(&self, id: EntryId) -> bool {
        self.index_of(id).is_some()
    }

    /// Drop every entry. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for entry in self.entries.drain(..) {
            let slot = &mut self.slots[entry.id.slot];
            slot.index = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(entry.id.slot);
        }
    }

    fn index_of(&self, id: EntryId) -> Option<usize> {
        self.slots
            .get(id.slot)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.index)
    }

    fn allocate_slot(&mut self, index: usize) -> EntryId {
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot];
            entry.index = Some(index);
            EntryId {
                slot,
                generation: entry.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                index: Some(index),
            });
            EntryId {
                slot: self.slots.len() - 1,
                generation: 0,
            }
        }
    }

    fn remove_at(&mut self, index: usize) -> Task {
        let last = self.entries.len() - 1;
        self.swap(index, last);
        let removed = self.entries.swap_remove(last);

        let slot = &mut self.slots[removed.id.slot];
        slot.index = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(removed.id.slot);

        if index < self.entries.len() {
            let settled = self.sift_down(index);
            if settled == index {
                self.sift_up(index);
            }
        }
        removed.task
    }

    /// Swap two array positions and record both new offsets in the arena.
    fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.entries.swap(i, j);
        self.slots[self.entries[i].id.slot].index = Some(i);
        self.slots[self.entries[j].id.slot].index = Some(j);
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.entries[parent].priority <= self.entries[index].priority {
                break;
            }
            self.swap(parent, index);
            index = parent;
        }
        index
    }

    fn sift_down(&mut self, mut index: usize) -> usize {
        let len = self.entries.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.entries[right].priority < self.entries[left].priority {
                right
            } else {
                left
            };
            if self.entries[index].priority <= self.entries[child].priority {
                break;
            }
            self.swap(index, child);
            index = child;
        }
        index
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        for (index, entry) in self.entries.iter().enumerate() {
            assert_eq!(self.slots[entry.id.slot].index, Some(index));
            if index > 0 {
                let parent = (index - 1) / 2;
                assert!(self.entries[parent].priority <= entry.priority);
            }
        }
    }
}
