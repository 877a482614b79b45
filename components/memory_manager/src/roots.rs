//! Host-held strong roots.

use std::fmt;
use std::marker::PhantomData;

use core_types::HeapRef;

use crate::gc::RootAcceptor;
use crate::heap::Gc;

/// Handle to a slot in a [`RootSet`].
pub struct RootHandle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for RootHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RootHandle<T> {}

impl<T> PartialEq for RootHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for RootHandle<T> {}

impl<T> fmt::Debug for RootHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootHandle({})", self.index)
    }
}

/// Strong references held on behalf of the embedder.
///
/// Every slot is reported to the collector in both the marking and fixup
/// phases, so a rooted object survives and its address stays current.
#[derive(Debug, Default)]
pub struct RootSet {
    slots: Vec<Option<HeapRef>>,
    free: Vec<u32>,
}

impl RootSet {
    /// Creates an empty root set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots `gc` until the handle is removed.
    pub fn add<T>(&mut self, gc: Gc<T>) -> RootHandle<T> {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(gc.addr());
                index
            }
            None => {
                self.slots.push(Some(gc.addr()));
                self.slots.len() as u32 - 1
            }
        };
        RootHandle {
            index,
            _marker: PhantomData,
        }
    }

    /// Current handle of the rooted object.
    pub fn get<T>(&self, handle: RootHandle<T>) -> Option<Gc<T>> {
        self.slots
            .get(handle.index as usize)
            .copied()
            .flatten()
            .map(Gc::from_addr)
    }

    /// Unroots the object and returns its current handle.
    pub fn remove<T>(&mut self, handle: RootHandle<T>) -> Option<Gc<T>> {
        let addr = self.slots.get_mut(handle.index as usize)?.take()?;
        self.free.push(handle.index);
        Some(Gc::from_addr(addr))
    }

    /// Number of rooted objects.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns true if nothing is rooted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports every rooted object.
    pub fn mark(&mut self, acceptor: &mut dyn RootAcceptor) {
        for addr in self.slots.iter_mut().flatten() {
            acceptor.accept(addr);
        }
    }
}
