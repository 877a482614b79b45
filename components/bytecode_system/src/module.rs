//! In-memory bytecode modules.

use core_types::{FunctionId, StringId};

use crate::provider::{
    hash_string, BytecodeProvider, CjsModuleEntry, FunctionHeader, StaticCjsModuleEntry,
    StringKind,
};

#[derive(Debug, Clone, PartialEq)]
struct StringTableEntry {
    text: String,
    kind: StringKind,
}

#[derive(Debug, Clone, PartialEq)]
struct FunctionEntry {
    header: FunctionHeader,
    bytecode: Vec<u8>,
}

/// A fully compiled bytecode unit held in memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BytecodeModule {
    strings: Vec<StringTableEntry>,
    functions: Vec<FunctionEntry>,
    global_function: FunctionId,
    cjs_modules: Vec<CjsModuleEntry>,
    cjs_modules_static: Vec<StaticCjsModuleEntry>,
    regexps: Vec<Vec<u8>>,
    epilogue: Vec<u8>,
}

impl BytecodeModule {
    /// Starts building a module.
    pub fn builder() -> BytecodeModuleBuilder {
        BytecodeModuleBuilder::new()
    }
}

impl BytecodeProvider for BytecodeModule {
    fn string_count(&self) -> u32 {
        self.strings.len() as u32
    }

    fn string_table_entry(&self, id: StringId) -> &str {
        self.strings
            .get(id as usize)
            .map(|entry| entry.text.as_str())
            .unwrap_or("")
    }

    fn string_kind(&self, id: StringId) -> StringKind {
        self.strings
            .get(id as usize)
            .map(|entry| entry.kind)
            .unwrap_or(StringKind::String)
    }

    fn function_count(&self) -> u32 {
        self.functions.len() as u32
    }

    fn function_header(&self, id: FunctionId) -> FunctionHeader {
        self.functions
            .get(id as usize)
            .map(|f| f.header)
            .unwrap_or_default()
    }

    fn function_bytecode(&self, id: FunctionId) -> &[u8] {
        self.functions
            .get(id as usize)
            .map(|f| f.bytecode.as_slice())
            .unwrap_or(&[])
    }

    fn global_function_index(&self) -> FunctionId {
        self.global_function
    }

    fn cjs_module_table(&self) -> &[CjsModuleEntry] {
        &self.cjs_modules
    }

    fn cjs_module_table_static(&self) -> &[StaticCjsModuleEntry] {
        &self.cjs_modules_static
    }

    fn regexp_bytecode(&self, id: u32) -> &[u8] {
        self.regexps
            .get(id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn epilogue(&self) -> &[u8] {
        &self.epilogue
    }

    fn is_lazy(&self) -> bool {
        false
    }
}

/// Assembles a [`BytecodeModule`] table by table.
///
/// # Example
///
/// ```
/// use bytecode_system::{BytecodeModuleBuilder, BytecodeProvider};
///
/// let mut builder = BytecodeModuleBuilder::new();
/// let file = builder.add_string("./lib.js");
/// let body = builder.add_function(file, 1, 8, vec![0xff]);
/// builder.add_cjs_module(file, body);
/// builder.set_epilogue(b"trailer".to_vec());
///
/// let module = builder.build();
/// assert_eq!(module.cjs_module_table().len(), 1);
/// assert_eq!(module.epilogue(), b"trailer");
/// ```
#[derive(Debug, Default)]
pub struct BytecodeModuleBuilder {
    module: BytecodeModule,
}

impl BytecodeModuleBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push_string(&mut self, text: &str, kind: StringKind) -> StringId {
        let id = self.module.strings.len() as StringId;
        self.module.strings.push(StringTableEntry {
            text: text.to_string(),
            kind,
        });
        id
    }

    /// Adds a literal string.
    pub fn add_string(&mut self, text: &str) -> StringId {
        self.push_string(text, StringKind::String)
    }

    /// Adds a string the compiler marked as an identifier.
    pub fn add_identifier(&mut self, text: &str) -> StringId {
        self.push_string(text, StringKind::Identifier { hash: hash_string(text) })
    }

    /// Adds a string that names the predefined symbol `predefined`.
    pub fn add_predefined(&mut self, text: &str, predefined: u32) -> StringId {
        self.push_string(text, StringKind::Predefined(predefined))
    }

    /// Adds a compiled function.
    pub fn add_function(
        &mut self,
        name: StringId,
        param_count: u32,
        frame_size: u32,
        bytecode: Vec<u8>,
    ) -> FunctionId {
        self.push_function(
            FunctionHeader {
                name,
                param_count,
                frame_size,
                lazy: false,
            },
            bytecode,
        )
    }

    /// Adds a function whose body is compiled on first call.
    pub fn add_lazy_function(&mut self, name: StringId, param_count: u32) -> FunctionId {
        self.push_function(
            FunctionHeader {
                name,
                param_count,
                frame_size: 0,
                lazy: true,
            },
            Vec::new(),
        )
    }

    fn push_function(&mut self, header: FunctionHeader, bytecode: Vec<u8>) -> FunctionId {
        let id = self.module.functions.len() as FunctionId;
        self.module.functions.push(FunctionEntry { header, bytecode });
        id
    }

    /// Sets the top-level function. Defaults to function 0.
    pub fn set_global_function(&mut self, id: FunctionId) {
        self.module.global_function = id;
    }

    /// Adds a CommonJS module keyed by file name.
    pub fn add_cjs_module(&mut self, filename: StringId, function_index: FunctionId) {
        self.module.cjs_modules.push(CjsModuleEntry {
            filename,
            function_index,
        });
    }

    /// Adds a CommonJS module keyed by static id.
    pub fn add_static_cjs_module(&mut self, module_id: u32, function_index: FunctionId) {
        self.module.cjs_modules_static.push(StaticCjsModuleEntry {
            module_id,
            function_index,
        });
    }

    /// Adds compiled regexp bytecode and returns its id.
    pub fn add_regexp(&mut self, bytecode: Vec<u8>) -> u32 {
        self.module.regexps.push(bytecode);
        self.module.regexps.len() as u32 - 1
    }

    /// Sets the trailing epilogue bytes.
    pub fn set_epilogue(&mut self, epilogue: Vec<u8>) {
        self.module.epilogue = epilogue;
    }

    /// Finishes the module.
    pub fn build(self) -> BytecodeModule {
        self.module
    }
}
