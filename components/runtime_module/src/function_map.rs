//! Per-module table of materialized code blocks.

use core_types::FunctionId;

use crate::code_block::CodeBlock;

/// One slot per function table entry, filled on first use.
#[derive(Debug, Default)]
pub struct FunctionMap {
    slots: Vec<Option<Box<CodeBlock>>>,
}

impl FunctionMap {
    /// Creates a map with `len` empty slots.
    pub fn with_len(len: u32) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(len as usize, || None);
        FunctionMap { slots }
    }

    /// The block in slot `index`, if materialized.
    #[inline]
    pub fn get(&self, index: FunctionId) -> Option<&CodeBlock> {
        self.slots.get(index as usize).and_then(|slot| slot.as_deref())
    }

    /// Returns true if slot `index` holds a block.
    #[inline]
    pub fn is_materialized(&self, index: FunctionId) -> bool {
        self.get(index).is_some()
    }

    /// Stores a block. Slots are filled at most once.
    pub(crate) fn insert(&mut self, index: FunctionId, block: Box<CodeBlock>) -> Option<&CodeBlock> {
        let slot = self.slots.get_mut(index as usize)?;
        debug_assert!(slot.is_none(), "function {} materialized twice", index);
        *slot = Some(block);
        slot.as_deref()
    }

    pub(crate) fn take(&mut self, index: FunctionId) -> Option<Box<CodeBlock>> {
        self.slots.get_mut(index as usize).and_then(Option::take)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Materialized blocks in function order.
    pub fn iter(&self) -> impl Iterator<Item = &CodeBlock> + '_ {
        self.slots.iter().filter_map(|slot| slot.as_deref())
    }

    pub(crate) fn memory_size(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Option<Box<CodeBlock>>>()
            + self.iter().map(CodeBlock::memory_size).sum::<usize>()
    }
}
