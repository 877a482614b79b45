//! Recoverable module errors.
//!
//! Only initialization can fail recoverably: importing a CommonJS module
//! table may find a malformed table, and the caller decides whether to
//! abandon the whole load. Invariant violations are not represented here;
//! they are debug assertions at the call site.

use thiserror::Error;

use crate::ModuleId;

/// Errors produced while creating or initializing a runtime module.
///
/// # Examples
///
/// ```
/// use core_types::ModuleError;
///
/// let err = ModuleError::CjsFunctionOutOfRange {
///     function_index: 9,
///     function_count: 3,
/// };
/// assert_eq!(
///     err.to_string(),
///     "CommonJS module refers to function 9 but the bytecode has 3 functions"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// A CommonJS table entry names a function the bytecode does not contain.
    #[error("CommonJS module refers to function {function_index} but the bytecode has {function_count} functions")]
    CjsFunctionOutOfRange {
        /// Function index found in the table
        function_index: u32,
        /// Number of functions in the bytecode
        function_count: u32,
    },

    /// A dynamic CommonJS module name is already registered in the domain.
    #[error("CommonJS module '{name}' is already registered in this domain")]
    DuplicateCjsModule {
        /// The module file name
        name: String,
    },

    /// Static CommonJS module ids must continue the domain's id sequence.
    #[error("static CommonJS module id {module_id} is out of sequence (expected {expected})")]
    MalformedStaticCjsTable {
        /// Module id found in the table
        module_id: u32,
        /// Next id the domain expected
        expected: u32,
    },

    /// The owning domain was collected before the module table could be imported.
    #[error("the owning domain is no longer alive")]
    DomainUnavailable,

    /// `initialize` was called on a module that already has bytecode.
    #[error("{0} is already initialized")]
    AlreadyInitialized(ModuleId),

    /// The handle does not name a live module.
    #[error("{0} is not a live runtime module")]
    UnknownModule(ModuleId),

    /// The operation needs bytecode but the module has none yet.
    #[error("{0} has no bytecode")]
    NotInitialized(ModuleId),

    /// A function index is outside the module's function table.
    #[error("{module} has no function {function_index}")]
    FunctionOutOfRange {
        /// Module that was asked
        module: ModuleId,
        /// Requested function index
        function_index: u32,
    },

    /// The module is owned elsewhere and cannot become a dependency.
    #[error("{0} is already owned and cannot become a dependency")]
    SharedDependency(ModuleId),
}

/// Result alias for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;
