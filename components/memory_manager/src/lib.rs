//! Memory Manager - Compacting garbage-collected heap
//!
//! This component provides:
//! - A handle-addressed heap whose collector compacts live objects, so object
//!   addresses ([`core_types::HeapRef`]) change across collections
//! - Typed handles ([`Gc`]) and weak references ([`WeakRef`]) that go through a
//!   stable indirection cell the collector rewrites
//! - The root-marking protocol ([`RootAcceptor`], [`WeakRootAcceptor`]) and a
//!   phased [`Collector`] that drives it
//! - Hidden classes (shared object shapes), plain objects and domains

pub mod domain;
pub mod gc;
pub mod heap;
pub mod hidden_class;
pub mod mark_stack;
pub mod object;
pub mod roots;
pub mod weak_ref;

// Re-export main types
pub use domain::{CjsModule, Domain};
pub use gc::{Collector, GcPhase, MarkColor, RootAcceptor, WeakRootAcceptor};
pub use heap::{Gc, GcStats, Heap, HeapConfig, HeapData, HeapObject};
pub use hidden_class::{HiddenClass, PropertyDescriptor};
pub use mark_stack::MarkStack;
pub use object::JSObject;
pub use roots::{RootHandle, RootSet};
pub use weak_ref::{WeakRef, WeakSlotId};
