//! Identifier newtypes.
//!
//! Bytecode-local indices (`StringId`, `FunctionId`) are plain integers as
//! emitted by the compiler. Runtime-wide identities get their own newtypes so
//! they cannot be mixed up with bytecode indices.

use std::fmt;

/// Index into a bytecode module's string table.
pub type StringId = u32;

/// Index into a bytecode module's function table.
pub type FunctionId = u32;

/// An interned identifier.
///
/// Symbols are handed out by the identifier table and are stable for the
/// lifetime of the runtime. Two symbols are equal exactly when their string
/// contents are equal.
///
/// # Examples
///
/// ```
/// use core_types::SymbolId;
///
/// let a = SymbolId::from_raw(3);
/// assert_eq!(a.raw(), 3);
/// assert_eq!(SymbolId::default(), SymbolId::INVALID);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Marker for a symbol-import slot that has not been materialized.
    pub const INVALID: SymbolId = SymbolId(u32::MAX);

    /// Wraps a raw symbol number.
    pub const fn from_raw(raw: u32) -> Self {
        SymbolId(raw)
    }

    /// Returns the raw symbol number.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true unless this is [`SymbolId::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for SymbolId {
    fn default() -> Self {
        SymbolId::INVALID
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "SymbolId({})", self.0)
        } else {
            write!(f, "SymbolId(invalid)")
        }
    }
}

/// Handle of a runtime module inside the runtime's module list.
///
/// Handles are never reused: once a module is destroyed its handle stays
/// dead, so a stale handle can be detected instead of aliasing a newer module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    /// Creates a handle from a list index.
    pub const fn from_index(index: u32) -> Self {
        ModuleId(index)
    }

    /// Returns the list index of this handle.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Address of a GC-managed object.
///
/// The collector compacts the heap, so an address is only meaningful until the
/// next collection. Code holding a `HeapRef` across a collection must expose it
/// to the collector as a root slot so the slot can be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapRef(u32);

impl HeapRef {
    /// Creates a reference from a heap slot index.
    pub const fn from_index(index: u32) -> Self {
        HeapRef(index)
    }

    /// Returns the heap slot index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
