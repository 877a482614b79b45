//! Core identifier, value and error types shared by the runtime components.
//!
//! This crate provides the small vocabulary every other component speaks:
//! interned symbol identifiers, runtime module handles, movable heap
//! references, the values stored inside GC objects, and the recoverable
//! error type produced while loading bytecode modules.
//!
//! # Overview
//!
//! - [`SymbolId`] - Interned identifier handed out by the identifier table
//! - [`ModuleId`] - Handle of a runtime module in the module list
//! - [`HeapRef`] - Address of a GC-managed object (changes when the heap compacts)
//! - [`Value`] - Tagged representation of values stored in GC objects
//! - [`ModuleError`] - Recoverable module initialization failures
//! - [`SourceLocator`] - The source URL reported for a module
//!
//! # Examples
//!
//! ```
//! use core_types::{SymbolId, Value};
//!
//! let sym = SymbolId::from_raw(7);
//! assert!(sym.is_valid());
//! assert!(!SymbolId::INVALID.is_valid());
//!
//! let v = Value::Symbol(sym);
//! assert_eq!(v.type_of(), "string");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod ids;
mod source;
mod value;

pub use error::{ModuleError, ModuleResult};
pub use ids::{FunctionId, HeapRef, ModuleId, StringId, SymbolId};
pub use source::SourceLocator;
pub use value::Value;
