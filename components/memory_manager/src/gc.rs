//! Mark-compact collector and the root-marking protocol.
//!
//! A collection runs in fixed phases:
//!
//! 1. **Marking**: roots are reported through [`RootAcceptor`]; the
//!    collector greys them and [`Collector::complete_marking`] traces
//!    everything reachable.
//! 2. **Weak processing**: weak roots are reported through
//!    [`WeakRootAcceptor`]; any whose target is still white is cleared.
//!    Dead domains are finalized here.
//! 3. **Fixup**: after [`Collector::compact`] every root is reported again
//!    so its address can be rewritten, and every live weak reference is
//!    reported through [`Collector::mark_weak_ref`].
//!
//! The collector never calls out to its clients. The owner of the roots
//! drives the phases and hands the collector to each client in turn.

use core_types::{HeapRef, ModuleId, Value};

use crate::heap::{Gc, GcStats, Heap};
use crate::mark_stack::MarkStack;
use crate::weak_ref::{WeakRef, WeakSlotId};

/// Mark colors for tri-color marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MarkColor {
    /// Unmarked (not yet visited)
    White = 0,
    /// In process (reachable, needs scanning)
    Gray = 1,
    /// Fully processed (reachable, all references scanned)
    Black = 2,
}

/// Current phase of a [`Collector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcPhase {
    /// Strong roots are being reported
    Marking,
    /// Marking is complete; weak roots are being reported
    WeakProcessing,
    /// The heap has been compacted; roots are reported again for rewriting
    Fixup,
}

/// Receives strong references during marking and fixup.
///
/// The slot is passed by `&mut` because the collector may rewrite it once
/// the object has moved.
pub trait RootAcceptor {
    /// Reports one strong reference.
    fn accept(&mut self, slot: &mut HeapRef);

    /// Reports a value; only object values carry a reference.
    fn accept_value(&mut self, value: &mut Value) {
        if let Some(slot) = value.heap_ref_mut() {
            self.accept(slot);
        }
    }
}

impl dyn RootAcceptor + '_ {
    /// Reports a typed handle.
    pub fn accept_gc<T>(&mut self, gc: &mut Gc<T>) {
        self.accept(gc.addr_mut());
    }
}

/// Receives weak references after marking.
pub trait WeakRootAcceptor {
    /// Reports one weak-reference cell.
    fn accept_weak(&mut self, slot: WeakSlotId);
}

impl dyn WeakRootAcceptor + '_ {
    /// Reports a typed weak reference.
    pub fn accept_weak_ref<T>(&mut self, weak: &WeakRef<T>) {
        self.accept_weak(weak.slot());
    }
}

/// Old-address to new-address mapping produced by compaction.
#[derive(Debug, Default)]
pub(crate) struct ForwardingTable {
    new_index: Vec<Option<u32>>,
}

impl ForwardingTable {
    pub(crate) fn with_len(len: usize) -> Self {
        ForwardingTable {
            new_index: vec![None; len],
        }
    }

    pub(crate) fn record(&mut self, old: usize, new: usize) {
        self.new_index[old] = Some(new as u32);
    }

    /// New address of a survivor, or `None` if the object was freed.
    pub(crate) fn forward(&self, addr: HeapRef) -> Option<HeapRef> {
        self.new_index
            .get(addr.index())
            .copied()
            .flatten()
            .map(HeapRef::from_index)
    }
}

/// One collection in progress.
///
/// # Example
///
/// ```
/// use memory_manager::{Collector, Heap, JSObject, RootAcceptor};
///
/// let mut heap = Heap::new();
/// let _garbage = heap.allocate(JSObject::new(None));
/// let mut kept = heap.allocate(JSObject::new(None));
///
/// let mut gc = Collector::new(&mut heap);
/// (&mut gc as &mut dyn RootAcceptor).accept_gc(&mut kept);
/// gc.complete_marking();
/// gc.compact();
/// (&mut gc as &mut dyn RootAcceptor).accept_gc(&mut kept);
/// let stats = gc.finish();
///
/// assert_eq!(stats.objects_freed, 1);
/// assert_eq!(kept.addr().index(), 0);
/// ```
#[derive(Debug)]
pub struct Collector<'h> {
    heap: &'h mut Heap,
    mark_stack: MarkStack,
    phase: GcPhase,
    forwarding: ForwardingTable,
    cycle: GcStats,
}

impl<'h> Collector<'h> {
    /// Starts a collection. Every object begins white.
    pub fn new(heap: &'h mut Heap) -> Self {
        heap.begin_collection();
        tracing::debug!(target: "memory_manager::gc", objects = heap.len(), "collection started");
        Collector {
            heap,
            mark_stack: MarkStack::new(),
            phase: GcPhase::Marking,
            forwarding: ForwardingTable::default(),
            cycle: GcStats {
                collections: 1,
                ..GcStats::default()
            },
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GcPhase {
        self.phase
    }

    /// Read access to the heap under collection.
    pub fn heap(&self) -> &Heap {
        self.heap
    }

    /// Returns true if `addr` was reached during marking.
    pub fn is_marked(&self, addr: HeapRef) -> bool {
        self.heap.is_marked(addr)
    }

    /// Traces everything reachable from the reported roots and moves to
    /// weak processing.
    pub fn complete_marking(&mut self) {
        debug_assert_eq!(self.phase, GcPhase::Marking);
        while let Some(addr) = self.mark_stack.pop() {
            for child in self.heap.blacken(addr) {
                if self.heap.mark(child) {
                    self.mark_stack.push(child);
                }
            }
        }
        self.phase = GcPhase::WeakProcessing;
    }

    /// Collects the modules registered in every unreachable domain.
    ///
    /// The domains themselves are freed by [`compact`](Self::compact); the
    /// caller releases the returned modules' domain references.
    pub fn finalize_dead_domains(&mut self) -> Vec<ModuleId> {
        debug_assert_eq!(self.phase, GcPhase::WeakProcessing);
        let modules: Vec<ModuleId> = self
            .heap
            .unmarked_domains()
            .flat_map(|domain| domain.runtime_modules().iter().copied())
            .collect();
        if !modules.is_empty() {
            tracing::debug!(
                target: "memory_manager::gc",
                modules = modules.len(),
                "finalizing unreachable domains"
            );
        }
        modules
    }

    /// Frees unmarked objects, slides survivors down and moves to fixup.
    pub fn compact(&mut self) {
        debug_assert_eq!(self.phase, GcPhase::WeakProcessing);
        let (forwarding, freed, moved) = self.heap.compact();
        self.forwarding = forwarding;
        self.cycle.objects_freed = freed;
        self.cycle.objects_moved = moved;
        self.phase = GcPhase::Fixup;
    }

    /// Keeps a weak reference's cell alive and rewrites its target.
    pub fn mark_weak_ref<T>(&mut self, weak: &WeakRef<T>) {
        debug_assert_eq!(self.phase, GcPhase::Fixup);
        let forwarding = &self.forwarding;
        self.heap
            .weak_slots_mut()
            .mark_and_forward(weak.slot(), |target| forwarding.forward(target));
    }

    /// Ends the collection. Weak cells nobody reported are reclaimed.
    pub fn finish(self) -> GcStats {
        debug_assert_eq!(self.phase, GcPhase::Fixup);
        let Collector { heap, mut cycle, .. } = self;
        let reclaimed = heap.weak_slots_mut().sweep();
        cycle.live_objects = heap.len();
        heap.record_cycle(&cycle);
        tracing::debug!(
            target: "memory_manager::gc",
            freed = cycle.objects_freed,
            moved = cycle.objects_moved,
            weak_cleared = cycle.weak_refs_cleared,
            weak_cells_reclaimed = reclaimed,
            live = cycle.live_objects,
            "collection finished"
        );
        cycle
    }
}

impl RootAcceptor for Collector<'_> {
    fn accept(&mut self, slot: &mut HeapRef) {
        match self.phase {
            GcPhase::Marking => {
                if self.heap.mark(*slot) {
                    self.mark_stack.push_root(*slot);
                }
            }
            GcPhase::Fixup => match self.forwarding.forward(*slot) {
                Some(new) => *slot = new,
                None => debug_assert!(false, "strong root {:?} refers to a freed object", slot),
            },
            GcPhase::WeakProcessing => {
                debug_assert!(false, "strong roots are not reported during weak processing")
            }
        }
    }
}

impl WeakRootAcceptor for Collector<'_> {
    fn accept_weak(&mut self, slot: WeakSlotId) {
        debug_assert_eq!(self.phase, GcPhase::WeakProcessing);
        if let Some(target) = self.heap.weak_slot_target(slot) {
            if !self.heap.is_marked(target) && self.heap.weak_slots_mut().clear(slot) {
                self.cycle.weak_refs_cleared += 1;
            }
        }
    }
}
