//! Executable units.

use bytecode_system::{BytecodeProvider, FunctionHeader};
use core_types::{FunctionId, ModuleId, StringId};

/// One function's runtime representation, owned by the module that
/// materialized it.
///
/// A code block is boxed when materialized and never moves afterwards, so
/// its address identifies it for the module's lifetime.
#[derive(Debug)]
pub struct CodeBlock {
    module: ModuleId,
    function_index: FunctionId,
    header: FunctionHeader,
    bytecode: Box<[u8]>,
}

impl CodeBlock {
    pub(crate) fn from_provider(
        module: ModuleId,
        provider: &dyn BytecodeProvider,
        function_index: FunctionId,
    ) -> Box<Self> {
        Box::new(CodeBlock {
            module,
            function_index,
            header: provider.function_header(function_index),
            bytecode: provider.function_bytecode(function_index).into(),
        })
    }

    /// Reloads a lazy block from freshly compiled bytecode in place.
    pub(crate) fn complete_lazy(&mut self, provider: &dyn BytecodeProvider, function_index: FunctionId) {
        debug_assert!(self.header.lazy, "code block is already compiled");
        self.function_index = function_index;
        self.header = provider.function_header(function_index);
        self.bytecode = provider.function_bytecode(function_index).into();
    }

    /// The owning module.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Index in the owning module's function table.
    pub fn function_index(&self) -> FunctionId {
        self.function_index
    }

    /// String index of the function's name in the owning module.
    pub fn name(&self) -> StringId {
        self.header.name
    }

    /// Declared parameter count.
    pub fn param_count(&self) -> u32 {
        self.header.param_count
    }

    /// Register frame size.
    pub fn frame_size(&self) -> u32 {
        self.header.frame_size
    }

    /// True until the body has been compiled.
    pub fn is_lazy(&self) -> bool {
        self.header.lazy
    }

    /// The function body.
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub(crate) fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.bytecode.len()
    }
}
