//! The one-function provider backing a lazily compiled child module.

use std::sync::Arc;

use core_types::{FunctionId, StringId};

use crate::provider::{
    BytecodeProvider, CjsModuleEntry, FunctionHeader, StaticCjsModuleEntry, StringKind,
};

/// Presents a single function of a parent provider as a module of its own.
///
/// The view has one string (the function's name) and one function, both at
/// index 0. It carries no CommonJS tables and no epilogue, and always reports
/// itself lazy. Regexp ids resolve against the parent.
#[derive(Debug, Clone)]
pub struct LazyFunctionProvider {
    parent: Arc<dyn BytecodeProvider>,
    function_index: FunctionId,
    header: FunctionHeader,
}

impl LazyFunctionProvider {
    /// Creates the view of `function_index` in `parent`.
    pub fn new(parent: Arc<dyn BytecodeProvider>, function_index: FunctionId) -> Self {
        let header = parent.function_header(function_index);
        LazyFunctionProvider {
            parent,
            function_index,
            header,
        }
    }

    /// The function's index in the parent.
    pub fn function_index(&self) -> FunctionId {
        self.function_index
    }

    /// String index of the function's name in the parent.
    pub fn parent_name(&self) -> StringId {
        self.header.name
    }
}

impl BytecodeProvider for LazyFunctionProvider {
    fn string_count(&self) -> u32 {
        1
    }

    fn string_table_entry(&self, id: StringId) -> &str {
        if id == 0 {
            self.parent.string_table_entry(self.header.name)
        } else {
            ""
        }
    }

    fn string_kind(&self, _id: StringId) -> StringKind {
        StringKind::String
    }

    fn function_count(&self) -> u32 {
        1
    }

    fn function_header(&self, id: FunctionId) -> FunctionHeader {
        if id == 0 {
            FunctionHeader {
                name: 0,
                lazy: true,
                ..self.header
            }
        } else {
            FunctionHeader::default()
        }
    }

    fn function_bytecode(&self, id: FunctionId) -> &[u8] {
        if id == 0 {
            self.parent.function_bytecode(self.function_index)
        } else {
            &[]
        }
    }

    fn global_function_index(&self) -> FunctionId {
        0
    }

    fn cjs_module_table(&self) -> &[CjsModuleEntry] {
        &[]
    }

    fn cjs_module_table_static(&self) -> &[StaticCjsModuleEntry] {
        &[]
    }

    fn regexp_bytecode(&self, id: u32) -> &[u8] {
        self.parent.regexp_bytecode(id)
    }

    fn epilogue(&self) -> &[u8] {
        &[]
    }

    fn is_lazy(&self) -> bool {
        true
    }
}
