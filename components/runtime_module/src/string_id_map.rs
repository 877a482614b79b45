//! Per-module map from string table index to symbol.

use core_types::{StringId, SymbolId};

/// One slot per string table entry; a slot stays [`SymbolId::INVALID`]
/// until the string is first used as an identifier.
#[derive(Debug, Clone, Default)]
pub struct StringIdMap {
    slots: Vec<SymbolId>,
}

impl StringIdMap {
    /// Creates a map with `len` unmaterialized slots.
    pub fn with_len(len: u32) -> Self {
        StringIdMap {
            slots: vec![SymbolId::INVALID; len as usize],
        }
    }

    /// Symbol in slot `id`, or [`SymbolId::INVALID`] if not materialized.
    #[inline]
    pub fn get(&self, id: StringId) -> SymbolId {
        self.slots
            .get(id as usize)
            .copied()
            .unwrap_or(SymbolId::INVALID)
    }

    pub(crate) fn set(&mut self, id: StringId, symbol: SymbolId) {
        debug_assert!(symbol.is_valid(), "storing an invalid symbol for string {}", id);
        match self.slots.get_mut(id as usize) {
            Some(slot) => *slot = symbol,
            None => debug_assert!(false, "string {} is outside the table", id),
        }
    }

    pub(crate) fn push(&mut self, symbol: SymbolId) -> StringId {
        self.slots.push(symbol);
        self.slots.len() as StringId - 1
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a symbol.
    pub fn materialized_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_valid()).count()
    }

    pub(crate) fn memory_size(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<SymbolId>()
    }
}
