//! Integration test suite for the runtime module components
//!
//! This crate provides integration tests that verify components work
//! together correctly across component boundaries.

use std::sync::Arc;

use bytecode_system::{BytecodeModuleBuilder, BytecodeProvider};

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use core_types;
    pub use memory_manager;
    pub use runtime_module;
}

/// Builds a small "bundle": a global function, a lazily compiled helper and
/// two CommonJS modules.
///
/// String table:
/// 0 `""` (predefined), 1 `length` (predefined), 2 `main`, 3 `helper`,
/// 4 `./a.js`, 5 `./b.js`, 6 `greeting`.
pub fn bundle() -> Arc<dyn BytecodeProvider> {
    let mut builder = BytecodeModuleBuilder::new();
    builder.add_predefined("", 0);
    builder.add_predefined("length", 1);
    let main = builder.add_identifier("main");
    let helper = builder.add_identifier("helper");
    let a = builder.add_string("./a.js");
    let b = builder.add_string("./b.js");
    builder.add_string("greeting");

    builder.add_function(main, 0, 8, vec![0x01, 0x02, 0x03]);
    builder.add_lazy_function(helper, 2);
    let module_a = builder.add_function(a, 1, 4, vec![0x10]);
    let module_b = builder.add_function(b, 1, 4, vec![0x20]);
    builder.add_cjs_module(a, module_a);
    builder.add_cjs_module(b, module_b);
    builder.add_static_cjs_module(0, module_a);
    builder.add_static_cjs_module(1, module_b);
    builder.set_epilogue(b"bundle-epilogue".to_vec());
    Arc::new(builder.build())
}

/// The compiled body of the bundle's `helper` function.
pub fn compiled_helper() -> Arc<dyn BytecodeProvider> {
    let mut builder = BytecodeModuleBuilder::new();
    let helper = builder.add_identifier("helper");
    builder.add_function(helper, 2, 5, vec![0x30, 0x31]);
    Arc::new(builder.build())
}
