//! Unit tests for module creation, reference counting and shutdown

use std::sync::Arc;

use bytecode_system::{BytecodeModuleBuilder, BytecodeProvider};
use core_types::{ModuleError, ModuleId};
use memory_manager::{Domain, RootHandle};
use runtime_module::{Lifecycle, Runtime, RuntimeConfig, RuntimeModuleFlags};

fn bytecode_with_epilogue(epilogue: &[u8]) -> Arc<dyn BytecodeProvider> {
    let mut builder = BytecodeModuleBuilder::new();
    let main = builder.add_identifier("main");
    let inner = builder.add_identifier("inner");
    builder.add_function(main, 0, 2, vec![0x01, 0x02]);
    builder.add_lazy_function(inner, 1);
    builder.set_epilogue(epilogue.to_vec());
    Arc::new(builder.build())
}

fn bytecode() -> Arc<dyn BytecodeProvider> {
    bytecode_with_epilogue(&[])
}

fn owned_modules(runtime: &Runtime, domain: RootHandle<Domain>) -> Vec<ModuleId> {
    let gc = runtime.domain(domain).unwrap();
    runtime.heap().get(gc).unwrap().runtime_modules().to_vec()
}

fn parent_and_lazy_child(runtime: &mut Runtime) -> (RootHandle<Domain>, ModuleId, ModuleId) {
    let domain = runtime.create_domain();
    let parent = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::default(), "a.js".into())
        .unwrap();
    let child = runtime.create_lazy_module(domain, parent, 1).unwrap();
    runtime.add_dependency(parent, child).unwrap();
    (domain, parent, child)
}

#[test]
fn test_create_module_registers_with_domain() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let id = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::default(), "main.js".into())
        .unwrap();

    let module = runtime.module(id).unwrap();
    assert!(module.is_initialized());
    assert_eq!(module.ref_count(), 1);
    assert_eq!(module.lifecycle(), Lifecycle::Live);
    assert_eq!(module.source_locator().as_str(), "main.js");
    assert_eq!(module.num_code_blocks(), 2);
    assert_eq!(owned_modules(&runtime, domain), vec![id]);
    assert_eq!(runtime.modules().len(), 1);
}

#[test]
fn test_uninitialized_then_initialize() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let id = runtime
        .create_uninitialized_module(domain, RuntimeModuleFlags::default())
        .unwrap();
    assert!(!runtime.module(id).unwrap().is_initialized());
    assert_eq!(runtime.module(id).unwrap().num_code_blocks(), 0);

    runtime.initialize_module(id, bytecode()).unwrap();
    assert!(runtime.module(id).unwrap().is_initialized());

    assert_eq!(
        runtime.initialize_module(id, bytecode()),
        Err(ModuleError::AlreadyInitialized(id))
    );
    assert_eq!(
        runtime.initialize_module_without_cjs(id, bytecode()),
        Err(ModuleError::AlreadyInitialized(id))
    );
    assert!(runtime.module(id).is_some());
}

#[test]
fn test_create_in_released_domain_fails() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    runtime.release_domain(domain);
    assert_eq!(
        runtime.create_uninitialized_module(domain, RuntimeModuleFlags::default()),
        Err(ModuleError::DomainUnavailable)
    );
    assert!(runtime.modules().is_empty());
}

#[test]
fn test_retain_and_release() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let id = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::default(), "m.js".into())
        .unwrap();

    runtime.retain_module(id).unwrap();
    assert_eq!(runtime.module(id).unwrap().ref_count(), 2);
    runtime.release_module(id).unwrap();
    assert_eq!(runtime.module(id).unwrap().ref_count(), 1);

    runtime.release_module(id).unwrap();
    assert!(runtime.module(id).is_none());
    assert!(owned_modules(&runtime, domain).is_empty());
    assert_eq!(runtime.release_module(id), Err(ModuleError::UnknownModule(id)));
}

#[test]
fn test_persistent_module_survives_zero_refs() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let id = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::persistent(), "core.js".into())
        .unwrap();

    runtime.release_module(id).unwrap();
    let module = runtime.module(id).unwrap();
    assert_eq!(module.ref_count(), 0);
    assert!(module.flags().persistent);

    runtime.shutdown_module(id).unwrap();
    assert!(runtime.module(id).is_none());
    assert!(owned_modules(&runtime, domain).is_empty());
}

#[test]
fn test_second_persistent_module_is_still_created() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let first = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::persistent(), "a.js".into())
        .unwrap();
    let second = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::persistent(), "b.js".into())
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(runtime.modules().len(), 2);
}

#[test]
fn test_destroying_parent_destroys_lazy_child() {
    let mut runtime = Runtime::new();
    let (domain, parent, child) = parent_and_lazy_child(&mut runtime);
    assert_eq!(runtime.modules().len(), 2);

    runtime.release_module(parent).unwrap();
    assert!(runtime.module(parent).is_none());
    assert!(runtime.module(child).is_none());
    assert!(runtime.modules().is_empty());
    assert!(owned_modules(&runtime, domain).is_empty());
}

#[test]
fn test_shutdown_parent_before_child() {
    let mut runtime = Runtime::new();
    let (_, parent, child) = parent_and_lazy_child(&mut runtime);

    runtime.shutdown_module(parent).unwrap();
    assert!(runtime.module(parent).is_none());
    assert!(runtime.module(child).is_some());

    runtime.shutdown_module(child).unwrap();
    assert!(runtime.modules().is_empty());
}

#[test]
fn test_shutdown_child_before_parent() {
    let mut runtime = Runtime::new();
    let (_, parent, child) = parent_and_lazy_child(&mut runtime);

    runtime.shutdown_module(child).unwrap();
    assert!(runtime.module(child).is_none());
    assert!(runtime.module(parent).is_some());

    runtime.shutdown_module(parent).unwrap();
    assert!(runtime.modules().is_empty());
    assert_eq!(runtime.shutdown_module(parent), Err(ModuleError::UnknownModule(parent)));
}

#[test]
fn test_release_ignored_while_shutting_down() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let id = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::default(), "m.js".into())
        .unwrap();

    let module = runtime.module_mut(id).unwrap();
    module.prepare_for_shutdown();
    assert!(module.is_shutting_down());
    assert_eq!(module.lifecycle(), Lifecycle::ShuttingDown);

    runtime.release_module(id).unwrap();
    assert_eq!(runtime.module(id).unwrap().ref_count(), 1);
}

#[test]
fn test_prepare_for_shutdown_drops_dependencies() {
    let mut runtime = Runtime::new();
    let (_, parent, _) = parent_and_lazy_child(&mut runtime);
    let module = runtime.module_mut(parent).unwrap();
    module.prepare_for_shutdown();
    assert!(module.dependent_modules().is_empty());
}

#[test]
fn test_shutdown_tears_down_everything() {
    let mut runtime = Runtime::new();
    let (domain, _, _) = parent_and_lazy_child(&mut runtime);
    runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::persistent(), "core.js".into())
        .unwrap();
    assert_eq!(runtime.modules().len(), 3);

    runtime.shutdown();
    assert!(runtime.modules().is_empty());
    assert!(owned_modules(&runtime, domain).is_empty());
    runtime.shutdown();
}

#[test]
fn test_get_epilogues_skips_hidden_and_uninitialized() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    runtime
        .create_module(domain, bytecode_with_epilogue(b"visible"), RuntimeModuleFlags::default(), "a.js".into())
        .unwrap();
    let hidden = RuntimeModuleFlags {
        hides_epilogue: true,
        ..RuntimeModuleFlags::default()
    };
    let hidden_id = runtime
        .create_module(domain, bytecode_with_epilogue(b"hidden"), hidden, "b.js".into())
        .unwrap();
    runtime
        .create_uninitialized_module(domain, RuntimeModuleFlags::default())
        .unwrap();

    let module = runtime.module(hidden_id).unwrap();
    assert!(module.hides_epilogue());
    assert_eq!(module.get_epilogue(), b"hidden");
    assert_eq!(runtime.get_epilogues(), vec![&b"visible"[..]]);
}

#[test]
fn test_runtime_config_sizes_tables() {
    let config = RuntimeConfig::from_json(r#"{ "identifier_capacity": 16, "verify_single_persistent": false }"#)
        .unwrap();
    let runtime = Runtime::with_config(config.clone());
    assert_eq!(runtime.config(), &config);
    assert_eq!(runtime.config().heap_capacity, 256);
    assert!(runtime.heap().is_empty());
    assert!(runtime.identifiers().lookup("length").is_some());
}

#[test]
fn test_add_dependency_rejects_shared_modules() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let a = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::default(), "a.js".into())
        .unwrap();
    let b = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::default(), "b.js".into())
        .unwrap();
    runtime.retain_module(b).unwrap();

    assert_eq!(runtime.add_dependency(a, b), Err(ModuleError::SharedDependency(b)));
    assert_eq!(runtime.add_dependency(a, a), Err(ModuleError::SharedDependency(a)));
    assert!(runtime.module(a).unwrap().dependent_modules().is_empty());

    runtime.release_module(a).unwrap();
    let module = runtime.module(b).unwrap();
    assert_eq!(module.ref_count(), 2);
}

#[test]
fn test_lazy_child_has_a_single_owner() {
    let mut runtime = Runtime::new();
    let (domain, parent, child) = parent_and_lazy_child(&mut runtime);
    let other = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::default(), "b.js".into())
        .unwrap();
    assert_eq!(runtime.add_dependency(other, child), Err(ModuleError::SharedDependency(child)));
    assert_eq!(runtime.add_dependency(parent, child), Err(ModuleError::SharedDependency(child)));

    let retained = runtime.create_lazy_module(domain, parent, 1).unwrap();
    runtime.retain_module(retained).unwrap();
    assert_eq!(
        runtime.add_dependency(parent, retained),
        Err(ModuleError::SharedDependency(retained))
    );
    assert_eq!(runtime.module(parent).unwrap().dependent_modules(), &[child]);
}

#[test]
fn test_persistent_module_ignores_release_at_zero() {
    let mut runtime = Runtime::new();
    let domain = runtime.create_domain();
    let id = runtime
        .create_module(domain, bytecode(), RuntimeModuleFlags::persistent(), "core.js".into())
        .unwrap();

    runtime.release_module(id).unwrap();
    runtime.release_module(id).unwrap();
    assert_eq!(runtime.module(id).unwrap().ref_count(), 0);
}
