//! Runtime modules for the JavaScript runtime
//!
//! A runtime module is the live bridge between one compiled bytecode unit's
//! read-only tables and the runtime's mutable universe of interned symbols,
//! code blocks and GC objects.
//!
//! # Features
//!
//! - Lazy, memoized symbol import per string table entry, with a fast path
//!   for compiler-marked identifiers and direct mapping of predefined names
//! - Lazy, memoized code block materialization with stable identity
//! - Per-module caches for object-literal hidden classes and template objects
//! - Cooperation with a moving collector: strong roots, a weak reference to
//!   the owning domain, and reference fixup after compaction
//! - Eager, deferred and lazy-child construction; reference-counted
//!   teardown with a persistent exemption; unconditional shutdown
//! - CommonJS module table import into the owning domain
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bytecode_system::BytecodeModuleBuilder;
//! use runtime_module::{Predefined, Runtime, RuntimeModuleFlags, SymbolTable};
//!
//! let mut builder = BytecodeModuleBuilder::new();
//! let length = builder.add_predefined("length", Predefined::Length as u32);
//! let greeting = builder.add_string("hello");
//! builder.add_function(greeting, 0, 1, vec![]);
//!
//! let mut runtime = Runtime::new();
//! let domain = runtime.create_domain();
//! let id = runtime
//!     .create_module(domain, Arc::new(builder.build()), RuntimeModuleFlags::default(), "app.js".into())
//!     .unwrap();
//!
//! let (module, symbols) = runtime.module_and_symbols(id).unwrap();
//! assert_eq!(module.get_symbol_must_exist(length), Predefined::Length.symbol());
//! let hello = module.get_symbol_from_string_index(greeting, symbols);
//! assert_eq!(runtime.identifiers().symbol_name(hello), Some("hello"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cjs;
pub mod code_block;
pub mod config;
pub mod flags;
pub mod function_map;
pub mod identifier_table;
pub mod literal_cache;
pub mod module;
pub mod module_list;
pub mod runtime;
pub mod string_id_map;

// Re-export main types at crate root
pub use code_block::CodeBlock;
pub use config::RuntimeConfig;
pub use flags::RuntimeModuleFlags;
pub use function_map::FunctionMap;
pub use identifier_table::{IdentifierStats, IdentifierTable, Predefined, SymbolTable};
pub use literal_cache::{LiteralShapeCache, TemplateObjectCache};
pub use module::{Lifecycle, RuntimeModule};
pub use module_list::ModuleList;
pub use runtime::Runtime;
pub use string_id_map::StringIdMap;
