//! Handle-addressed heap with compaction.
//!
//! Objects live in a dense table; an object's address is its index. The
//! collector slides live objects down over dead ones, so addresses change
//! across collections. Anything that holds an address across a collection
//! must be reported as a root (strong) or through a weak-reference cell
//! (weak) so the collector can rewrite it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use core_types::{HeapRef, SymbolId, Value};

use crate::domain::Domain;
use crate::gc::{ForwardingTable, MarkColor};
use crate::hidden_class::HiddenClass;
use crate::object::JSObject;
use crate::weak_ref::{WeakRef, WeakSlotId, WeakSlotTable};

/// Typed handle to a GC-managed object.
///
/// A `Gc<T>` is a plain address plus a type tag. It does not keep the object
/// alive by itself.
pub struct Gc<T> {
    addr: HeapRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Gc<T> {
    pub(crate) fn from_addr(addr: HeapRef) -> Self {
        Gc {
            addr,
            _marker: PhantomData,
        }
    }

    /// Returns the current address of the object.
    pub fn addr(self) -> HeapRef {
        self.addr
    }

    pub(crate) fn addr_mut(&mut self) -> &mut HeapRef {
        &mut self.addr
    }
}

impl<T> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Gc<T> {}

impl<T> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<T> Eq for Gc<T> {}

impl<T> Hash for Gc<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl<T> fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gc({})", self.addr.index())
    }
}

/// Every kind of object the heap can hold.
#[derive(Debug)]
pub enum HeapObject {
    /// Logical owner of runtime modules
    Domain(Domain),
    /// Shared object shape
    HiddenClass(HiddenClass),
    /// Plain object (template objects, literals)
    Object(JSObject),
}

impl HeapObject {
    /// Short name of the object kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            HeapObject::Domain(_) => "Domain",
            HeapObject::HiddenClass(_) => "HiddenClass",
            HeapObject::Object(_) => "Object",
        }
    }

    pub(crate) fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(&mut HeapRef)) {
        match self {
            HeapObject::Domain(_) => {}
            HeapObject::HiddenClass(class) => class.for_each_ref_mut(f),
            HeapObject::Object(object) => object.for_each_ref_mut(f),
        }
    }

    fn children(&self) -> Vec<HeapRef> {
        match self {
            HeapObject::Domain(_) => Vec::new(),
            HeapObject::HiddenClass(class) => class.parent().map(Gc::addr).into_iter().collect(),
            HeapObject::Object(object) => object.references().collect(),
        }
    }
}

/// Conversion between a concrete object type and [`HeapObject`].
pub trait HeapData: Sized {
    /// Wraps the value for storage in the heap.
    fn into_object(self) -> HeapObject;
    /// Borrows the value if `object` is of this kind.
    fn from_object(object: &HeapObject) -> Option<&Self>;
    /// Mutably borrows the value if `object` is of this kind.
    fn from_object_mut(object: &mut HeapObject) -> Option<&mut Self>;
}

impl HeapData for Domain {
    fn into_object(self) -> HeapObject {
        HeapObject::Domain(self)
    }

    fn from_object(object: &HeapObject) -> Option<&Self> {
        match object {
            HeapObject::Domain(d) => Some(d),
            _ => None,
        }
    }

    fn from_object_mut(object: &mut HeapObject) -> Option<&mut Self> {
        match object {
            HeapObject::Domain(d) => Some(d),
            _ => None,
        }
    }
}

impl HeapData for HiddenClass {
    fn into_object(self) -> HeapObject {
        HeapObject::HiddenClass(self)
    }

    fn from_object(object: &HeapObject) -> Option<&Self> {
        match object {
            HeapObject::HiddenClass(c) => Some(c),
            _ => None,
        }
    }

    fn from_object_mut(object: &mut HeapObject) -> Option<&mut Self> {
        match object {
            HeapObject::HiddenClass(c) => Some(c),
            _ => None,
        }
    }
}

impl HeapData for JSObject {
    fn into_object(self) -> HeapObject {
        HeapObject::Object(self)
    }

    fn from_object(object: &HeapObject) -> Option<&Self> {
        match object {
            HeapObject::Object(o) => Some(o),
            _ => None,
        }
    }

    fn from_object_mut(object: &mut HeapObject) -> Option<&mut Self> {
        match object {
            HeapObject::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Heap sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Object slots reserved up front
    pub initial_capacity: usize,
    /// Weak-reference cells reserved up front
    pub weak_slot_capacity: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            initial_capacity: 256,
            weak_slot_capacity: 64,
        }
    }
}

/// Collection statistics, per cycle or accumulated over the heap's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Number of completed collections
    pub collections: usize,
    /// Objects found unreachable and freed
    pub objects_freed: usize,
    /// Live objects whose address changed
    pub objects_moved: usize,
    /// Weak references cleared because their target died
    pub weak_refs_cleared: usize,
    /// Live objects after the most recent collection
    pub live_objects: usize,
}

impl GcStats {
    fn accumulate(&mut self, cycle: &GcStats) {
        self.collections += cycle.collections;
        self.objects_freed += cycle.objects_freed;
        self.objects_moved += cycle.objects_moved;
        self.weak_refs_cleared += cycle.weak_refs_cleared;
        self.live_objects = cycle.live_objects;
    }
}

#[derive(Debug)]
struct HeapCell {
    mark: MarkColor,
    object: HeapObject,
}

/// The GC-managed heap.
///
/// # Example
///
/// ```
/// use memory_manager::{Heap, JSObject};
/// use core_types::Value;
///
/// let mut heap = Heap::new();
/// let obj = heap.allocate(JSObject::with_elements(vec![Value::Smi(1)]));
/// assert_eq!(heap.get(obj).map(|o| o.elements().len()), Some(1));
/// ```
#[derive(Debug)]
pub struct Heap {
    cells: Vec<HeapCell>,
    weak_slots: WeakSlotTable,
    stats: GcStats,
}

impl Heap {
    /// Creates a heap with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Creates a heap with explicit sizing.
    pub fn with_config(config: HeapConfig) -> Self {
        Heap {
            cells: Vec::with_capacity(config.initial_capacity),
            weak_slots: WeakSlotTable::with_capacity(config.weak_slot_capacity),
            stats: GcStats::default(),
        }
    }

    /// Allocates an object and returns its handle.
    pub fn allocate<T: HeapData>(&mut self, data: T) -> Gc<T> {
        let addr = HeapRef::from_index(self.cells.len() as u32);
        self.cells.push(HeapCell {
            mark: MarkColor::White,
            object: data.into_object(),
        });
        Gc::from_addr(addr)
    }

    /// Borrows the object behind `gc`, if the address is live and of type `T`.
    pub fn get<T: HeapData>(&self, gc: Gc<T>) -> Option<&T> {
        self.object(gc.addr()).and_then(T::from_object)
    }

    /// Mutably borrows the object behind `gc`.
    pub fn get_mut<T: HeapData>(&mut self, gc: Gc<T>) -> Option<&mut T> {
        self.cells
            .get_mut(gc.addr().index())
            .and_then(|cell| T::from_object_mut(&mut cell.object))
    }

    /// Borrows the untyped object at `addr`.
    pub fn object(&self, addr: HeapRef) -> Option<&HeapObject> {
        self.cells.get(addr.index()).map(|cell| &cell.object)
    }

    /// Returns the object at `addr` as a typed handle, if it has type `T`.
    pub fn downcast<T: HeapData>(&self, addr: HeapRef) -> Option<Gc<T>> {
        self.object(addr)
            .and_then(T::from_object)
            .map(|_| Gc::from_addr(addr))
    }

    /// Number of objects currently in the heap.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true when the heap holds no objects.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Statistics accumulated over every collection so far.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// Reads a named property through the object's hidden class.
    pub fn get_named_property(&self, object: Gc<JSObject>, name: SymbolId) -> Option<Value> {
        let obj = self.get(object)?;
        let class = self.get(obj.class()?)?;
        let offset = class.lookup_property(name)?;
        obj.property(offset)
    }

    /// Creates a weak reference to `target`.
    ///
    /// The reference goes through a cell owned by the heap. The owner of the
    /// weak reference must report it to every collection through
    /// [`Collector::mark_weak_ref`](crate::Collector::mark_weak_ref), or the
    /// cell is reclaimed.
    pub fn create_weak_ref<T>(&mut self, target: Gc<T>) -> WeakRef<T> {
        WeakRef::from_slot(self.weak_slots.allocate(target.addr()))
    }

    /// Returns the current target of a weak reference, or `None` once the
    /// target has been collected.
    pub fn weak_ref_target<T: HeapData>(&self, weak: &WeakRef<T>) -> Option<Gc<T>> {
        self.weak_slots
            .target(weak.slot())
            .and_then(|addr| self.downcast(addr))
    }

    /// Number of weak-reference cells in use.
    pub fn weak_ref_count(&self) -> usize {
        self.weak_slots.live_count()
    }

    pub(crate) fn begin_collection(&mut self) {
        for cell in &mut self.cells {
            cell.mark = MarkColor::White;
        }
        self.weak_slots.begin_cycle();
    }

    /// Greys a white object. Returns true if the object was newly marked.
    pub(crate) fn mark(&mut self, addr: HeapRef) -> bool {
        match self.cells.get_mut(addr.index()) {
            Some(cell) if cell.mark == MarkColor::White => {
                cell.mark = MarkColor::Gray;
                true
            }
            Some(_) => false,
            None => {
                debug_assert!(false, "marking an address outside the heap: {:?}", addr);
                false
            }
        }
    }

    pub(crate) fn is_marked(&self, addr: HeapRef) -> bool {
        self.cells
            .get(addr.index())
            .is_some_and(|cell| cell.mark != MarkColor::White)
    }

    /// Blackens a grey object and returns the objects it references.
    pub(crate) fn blacken(&mut self, addr: HeapRef) -> Vec<HeapRef> {
        match self.cells.get_mut(addr.index()) {
            Some(cell) => {
                cell.mark = MarkColor::Black;
                cell.object.children()
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn unmarked_domains(&self) -> impl Iterator<Item = &Domain> + '_ {
        self.cells
            .iter()
            .filter(|cell| cell.mark == MarkColor::White)
            .filter_map(|cell| Domain::from_object(&cell.object))
    }

    /// Frees every white object and slides survivors down.
    ///
    /// Returns the forwarding table plus the number of objects freed and moved.
    pub(crate) fn compact(&mut self) -> (ForwardingTable, usize, usize) {
        let old_len = self.cells.len();
        let mut forwarding = ForwardingTable::with_len(old_len);
        let mut survivors = Vec::with_capacity(old_len);
        let mut moved = 0;

        for (old_index, cell) in std::mem::take(&mut self.cells).into_iter().enumerate() {
            if cell.mark == MarkColor::White {
                continue;
            }
            let new_index = survivors.len();
            if new_index != old_index {
                moved += 1;
            }
            forwarding.record(old_index, new_index);
            survivors.push(cell);
        }

        let freed = old_len - survivors.len();
        for cell in &mut survivors {
            cell.mark = MarkColor::White;
            cell.object.for_each_ref_mut(&mut |slot| {
                if let Some(new) = forwarding.forward(*slot) {
                    *slot = new;
                }
            });
        }
        self.cells = survivors;
        (forwarding, freed, moved)
    }

    pub(crate) fn weak_slots_mut(&mut self) -> &mut WeakSlotTable {
        &mut self.weak_slots
    }

    pub(crate) fn weak_slot_target(&self, slot: WeakSlotId) -> Option<HeapRef> {
        self.weak_slots.target(slot)
    }

    pub(crate) fn record_cycle(&mut self, cycle: &GcStats) {
        self.stats.accumulate(cycle);
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
