//! Bytecode provider contract for the JavaScript runtime
//!
//! A runtime module never parses bytecode itself. It reads a compiled unit
//! through the [`BytecodeProvider`] trait: the string table, the function
//! table, the CommonJS module tables, regexp bytecode and the trailing
//! epilogue bytes.
//!
//! # Features
//!
//! - The [`BytecodeProvider`] trait and its table entry types
//! - String kinds: plain strings, compiler-marked identifiers with a
//!   precomputed hash, and predefined names
//! - [`BytecodeModule`], an in-memory provider assembled with
//!   [`BytecodeModuleBuilder`]
//! - [`LazyFunctionProvider`], the one-function stub handed to a lazily
//!   compiled child module
//!
//! # Example
//!
//! ```
//! use bytecode_system::{BytecodeModuleBuilder, BytecodeProvider, StringKind};
//!
//! let mut builder = BytecodeModuleBuilder::new();
//! let name = builder.add_identifier("main");
//! let main = builder.add_function(name, 0, 4, vec![0x01, 0x02]);
//! builder.set_global_function(main);
//! let module = builder.build();
//!
//! assert_eq!(module.string_table_entry(name), "main");
//! assert!(matches!(module.string_kind(name), StringKind::Identifier { .. }));
//! assert_eq!(module.function_count(), 1);
//! assert!(!module.is_lazy());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lazy;
pub mod module;
pub mod provider;

// Re-export main types at crate root
pub use lazy::LazyFunctionProvider;
pub use module::{BytecodeModule, BytecodeModuleBuilder};
pub use provider::{
    hash_string, BytecodeProvider, CjsModuleEntry, FunctionHeader, StaticCjsModuleEntry,
    StringKind,
};
