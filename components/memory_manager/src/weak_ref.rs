//! Weak references through heap-owned cells.
//!
//! A weak reference never keeps its target alive. After marking, the
//! collector clears every cell whose target was not reached; during fixup it
//! rewrites surviving targets to their new addresses.

use std::fmt;
use std::marker::PhantomData;

use core_types::HeapRef;

/// Index of a weak-reference cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeakSlotId(u32);

impl WeakSlotId {
    /// Raw cell index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Typed weak reference to a GC-managed object.
pub struct WeakRef<T> {
    slot: WeakSlotId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> WeakRef<T> {
    pub(crate) fn from_slot(slot: WeakSlotId) -> Self {
        WeakRef {
            slot,
            _marker: PhantomData,
        }
    }

    /// The cell backing this reference.
    pub fn slot(&self) -> WeakSlotId {
        self.slot
    }
}

impl<T> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakRef(slot {})", self.slot.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Unmarked,
    Marked,
}

#[derive(Debug)]
struct WeakSlot {
    target: Option<HeapRef>,
    state: SlotState,
}

#[derive(Debug, Default)]
pub(crate) struct WeakSlotTable {
    slots: Vec<WeakSlot>,
    free_list: Vec<u32>,
}

impl WeakSlotTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        WeakSlotTable {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
        }
    }

    /// New cells start marked so a cell created mid-cycle survives it.
    pub(crate) fn allocate(&mut self, target: HeapRef) -> WeakSlotId {
        let slot = WeakSlot {
            target: Some(target),
            state: SlotState::Marked,
        };
        match self.free_list.pop() {
            Some(index) => {
                self.slots[index as usize] = slot;
                WeakSlotId(index)
            }
            None => {
                self.slots.push(slot);
                WeakSlotId(self.slots.len() as u32 - 1)
            }
        }
    }

    pub(crate) fn target(&self, id: WeakSlotId) -> Option<HeapRef> {
        self.slots.get(id.index()).and_then(|slot| match slot.state {
            SlotState::Free => None,
            _ => slot.target,
        })
    }

    pub(crate) fn begin_cycle(&mut self) {
        for slot in &mut self.slots {
            if slot.state == SlotState::Marked {
                slot.state = SlotState::Unmarked;
            }
        }
    }

    /// Clears the target. Returns true if there was one.
    pub(crate) fn clear(&mut self, id: WeakSlotId) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.state != SlotState::Free => slot.target.take().is_some(),
            _ => false,
        }
    }

    /// Marks the cell in use and rewrites its target through `forward`.
    pub(crate) fn mark_and_forward(
        &mut self,
        id: WeakSlotId,
        forward: impl FnOnce(HeapRef) -> Option<HeapRef>,
    ) {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            debug_assert!(false, "unknown weak slot {:?}", id);
            return;
        };
        debug_assert_ne!(slot.state, SlotState::Free, "weak slot {:?} was freed", id);
        slot.state = SlotState::Marked;
        if let Some(target) = slot.target {
            slot.target = forward(target);
        }
    }

    /// Frees every cell nobody reported this cycle. Returns how many.
    pub(crate) fn sweep(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.state == SlotState::Unmarked {
                slot.state = SlotState::Free;
                slot.target = None;
                self.free_list.push(index as u32);
                freed += 1;
            }
        }
        freed
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state != SlotState::Free)
            .count()
    }
}
