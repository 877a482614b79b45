//! The read-only view of a compiled bytecode unit.

use std::fmt;
use std::hash::Hasher;

use rustc_hash::FxHasher;

use core_types::{FunctionId, StringId};

/// How the compiler classified a string table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// Literal content; a symbol is created only if the string is used as
    /// an identifier at runtime.
    String,
    /// Used as an identifier by some opcode. The symbol is created when the
    /// module is loaded, using the precomputed hash.
    Identifier {
        /// Content hash computed by the compiler
        hash: u32,
    },
    /// One of the runtime's predefined names, identified by its index.
    Predefined(u32),
}

/// One entry of the function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionHeader {
    /// String index of the function's name
    pub name: StringId,
    /// Declared parameter count
    pub param_count: u32,
    /// Register frame size
    pub frame_size: u32,
    /// True if the body has not been compiled yet
    pub lazy: bool,
}

/// A CommonJS module resolved by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CjsModuleEntry {
    /// String index of the module's file name
    pub filename: StringId,
    /// Function implementing the module body
    pub function_index: FunctionId,
}

/// A CommonJS module resolved statically by the compiler to a dense id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCjsModuleEntry {
    /// Compiler-assigned module id
    pub module_id: u32,
    /// Function implementing the module body
    pub function_index: FunctionId,
}

/// Read-only accessor for a compiled bytecode unit.
///
/// Providers are shared (`Arc<dyn BytecodeProvider>`) because one compiled
/// unit may back several runtime modules. Out-of-range indices yield empty
/// content rather than panicking; callers size their own tables from
/// [`string_count`](Self::string_count) and
/// [`function_count`](Self::function_count).
pub trait BytecodeProvider: fmt::Debug + Send + Sync {
    /// Number of entries in the string table.
    fn string_count(&self) -> u32;

    /// Content of a string table entry.
    fn string_table_entry(&self, id: StringId) -> &str;

    /// Compiler classification of a string table entry.
    fn string_kind(&self, id: StringId) -> StringKind;

    /// Number of entries in the function table.
    fn function_count(&self) -> u32;

    /// Header of a function table entry.
    fn function_header(&self, id: FunctionId) -> FunctionHeader;

    /// Compiled body of a function.
    fn function_bytecode(&self, id: FunctionId) -> &[u8];

    /// Index of the top-level function.
    fn global_function_index(&self) -> FunctionId;

    /// CommonJS modules keyed by file name.
    fn cjs_module_table(&self) -> &[CjsModuleEntry];

    /// CommonJS modules keyed by static id.
    fn cjs_module_table_static(&self) -> &[StaticCjsModuleEntry];

    /// Compiled regexp bytecode for a regexp id.
    fn regexp_bytecode(&self, id: u32) -> &[u8];

    /// Trailing data appended after the bytecode.
    fn epilogue(&self) -> &[u8];

    /// True if this provider is a stub awaiting lazy compilation.
    fn is_lazy(&self) -> bool;
}

/// Content hash used for identifier strings.
///
/// The compiler stores this value for every [`StringKind::Identifier`]
/// entry, and the identifier table computes it for strings materialized at
/// runtime, so the two must agree.
pub fn hash_string(s: &str) -> u32 {
    let mut hasher = FxHasher::default();
    hasher.write(s.as_bytes());
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as u32
}
