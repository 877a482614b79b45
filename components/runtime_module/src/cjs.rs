//! CommonJS module table import.
//!
//! A module's bytecode may carry two CommonJS tables: modules keyed by file
//! name and modules keyed by a dense compiler-assigned id. Both are
//! registered into the owning domain when the module is initialized.

use core_types::{FunctionId, ModuleError, ModuleResult};
use memory_manager::{CjsModule, Domain, Gc, Heap};

use crate::identifier_table::SymbolTable;
use crate::module::RuntimeModule;

/// Registers the module's CommonJS tables with its domain.
pub(crate) fn import_cjs_module_table(
    module: &mut RuntimeModule,
    heap: &mut Heap,
    symbols: &mut dyn SymbolTable,
) -> ModuleResult<()> {
    let result = import_tables(module, heap, symbols);
    if let Err(err) = &result {
        tracing::warn!(target: "runtime_module::cjs", module = %module.id(), error = %err, "CommonJS import failed");
    }
    result
}

fn import_tables(module: &mut RuntimeModule, heap: &mut Heap, symbols: &mut dyn SymbolTable) -> ModuleResult<()> {
    let Some(bytecode) = module.bytecode_shared() else {
        return Ok(());
    };
    let by_name = bytecode.cjs_module_table();
    let by_id = bytecode.cjs_module_table_static();
    if by_name.is_empty() && by_id.is_empty() {
        return Ok(());
    }

    let domain = module.domain(heap).ok_or(ModuleError::DomainUnavailable)?;
    let function_count = bytecode.function_count();

    for entry in by_name {
        check_function_index(entry.function_index, function_count)?;
        let name = module.get_symbol_from_string_index(entry.filename, symbols);
        let cjs = CjsModule {
            module: module.id(),
            function_index: entry.function_index,
        };
        if !domain_mut(heap, domain)?.register_cjs_module(name, cjs) {
            return Err(ModuleError::DuplicateCjsModule {
                name: bytecode.string_table_entry(entry.filename).to_string(),
            });
        }
    }

    let target = domain_mut(heap, domain)?;
    for entry in by_id {
        check_function_index(entry.function_index, function_count)?;
        let cjs = CjsModule {
            module: module.id(),
            function_index: entry.function_index,
        };
        target
            .register_static_cjs_module(entry.module_id, cjs)
            .map_err(|expected| ModuleError::MalformedStaticCjsTable {
                module_id: entry.module_id,
                expected,
            })?;
    }

    tracing::debug!(
        target: "runtime_module::cjs",
        module = %module.id(),
        by_name = by_name.len(),
        by_id = by_id.len(),
        "CommonJS modules registered"
    );
    Ok(())
}

fn domain_mut(heap: &mut Heap, domain: Gc<Domain>) -> ModuleResult<&mut Domain> {
    heap.get_mut(domain).ok_or(ModuleError::DomainUnavailable)
}

fn check_function_index(function_index: FunctionId, function_count: u32) -> ModuleResult<()> {
    if function_index >= function_count {
        return Err(ModuleError::CjsFunctionOutOfRange {
            function_index,
            function_count,
        });
    }
    Ok(())
}
