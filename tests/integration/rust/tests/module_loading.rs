//! Module Loading Integration Tests
//!
//! Tests loading a bundle into a runtime: symbol import, CommonJS
//! registration, lazy compilation and teardown.

use integration_tests::{bundle, compiled_helper};
use memory_manager::CjsModule;
use runtime_module::{Predefined, Runtime, RuntimeModuleFlags};

/// Test: Predefined and identifier strings resolve at load, others on demand
#[test]
fn test_bundle_symbols() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let id = runtime
        .create_module(domain, bundle(), RuntimeModuleFlags::persistent(), "bundle.js".into())
        .unwrap();

    let (module, symbols) = runtime.module_and_symbols(id).unwrap();
    assert_eq!(module.get_symbol_must_exist(0), Predefined::EmptyString.symbol());
    assert_eq!(module.get_symbol_must_exist(1), Predefined::Length.symbol());
    assert!(module.string_id_map().get(2).is_valid());
    assert!(!module.string_id_map().get(6).is_valid());

    let greeting = module.get_symbol_from_string_index(6, symbols);
    assert_eq!(symbols.lookup("greeting"), Some(greeting));
    assert_eq!(module.get_symbol_must_exist(6), greeting);
}

/// Test: CommonJS modules are reachable by name and by id through the domain
#[test]
fn test_bundle_cjs_registration() {
    let mut runtime = Runtime::new();
    let handle = runtime.create_domain();
    let id = runtime
        .create_module(handle, bundle(), RuntimeModuleFlags::default(), "bundle.js".into())
        .unwrap();

    let a = runtime.identifiers().lookup("./a.js").unwrap();
    let domain = runtime.heap().get(runtime.domain(handle).unwrap()).unwrap();
    assert_eq!(
        domain.cjs_module(a),
        Some(CjsModule {
            module: id,
            function_index: 2
        })
    );
    assert_eq!(domain.static_cjs_module(1).map(|m| m.function_index), Some(3));

    let module = runtime.module_mut(id).unwrap();
    let entry = module.get_code_block(2).unwrap();
    assert_eq!(entry.bytecode(), &[0x10]);
}

/// Test: Lazy function compiled later keeps its code block
#[test]
fn test_lazy_helper_compilation() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let parent = runtime
        .create_module(domain, bundle(), RuntimeModuleFlags::default(), "bundle.js".into())
        .unwrap();
    let child = runtime.create_lazy_module(domain, parent, 1).unwrap();
    runtime.add_dependency(parent, child).unwrap();

    let helper = runtime.identifiers().lookup("helper").unwrap();
    let stub = runtime.module(child).unwrap().get_only_lazy_code_block().unwrap() as *const _;
    assert_eq!(runtime.module(child).unwrap().get_lazy_name(), helper);

    runtime.initialize_lazy_module(child, compiled_helper()).unwrap();
    let module = runtime.module_mut(child).unwrap();
    let block = module.get_code_block(0).unwrap();
    assert!(std::ptr::eq(block, stub));
    assert_eq!(block.frame_size(), 5);
    assert_eq!(block.bytecode(), &[0x30, 0x31]);
}

/// Test: Epilogues of loaded modules are collected, teardown empties the runtime
#[test]
fn test_epilogues_and_shutdown() {
    let mut runtime = Runtime::new();
    let first = runtime.create_domain();
    let second = runtime.create_domain();
    runtime
        .create_module(first, bundle(), RuntimeModuleFlags::default(), "one.js".into())
        .unwrap();
    runtime
        .create_module(second, bundle(), RuntimeModuleFlags::default(), "two.js".into())
        .unwrap();

    assert_eq!(runtime.get_epilogues(), vec![&b"bundle-epilogue"[..]; 2]);

    runtime.shutdown();
    assert!(runtime.modules().is_empty());
    assert!(runtime.get_epilogues().is_empty());
}
