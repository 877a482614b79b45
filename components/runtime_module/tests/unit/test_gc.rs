//! Unit tests for cooperation with the moving collector

use std::sync::Arc;

use bytecode_system::{BytecodeModuleBuilder, BytecodeProvider};
use core_types::{HeapRef, ModuleId};
use memory_manager::{Domain, JSObject, RootAcceptor, RootHandle, WeakRootAcceptor, WeakSlotId};
use runtime_module::{Runtime, RuntimeModuleFlags};

#[derive(Default)]
struct CountingRoots {
    strong: usize,
}

impl RootAcceptor for CountingRoots {
    fn accept(&mut self, _slot: &mut HeapRef) {
        self.strong += 1;
    }
}

#[derive(Default)]
struct CountingWeakRoots {
    slots: Vec<WeakSlotId>,
}

impl WeakRootAcceptor for CountingWeakRoots {
    fn accept_weak(&mut self, slot: WeakSlotId) {
        self.slots.push(slot);
    }
}

fn bytecode() -> Arc<dyn BytecodeProvider> {
    let mut builder = BytecodeModuleBuilder::new();
    let main = builder.add_identifier("main");
    let inner = builder.add_identifier("inner");
    builder.add_string("part");
    builder.add_function(main, 0, 1, vec![0x00]);
    builder.add_lazy_function(inner, 0);
    Arc::new(builder.build())
}

fn load(runtime: &mut Runtime, flags: RuntimeModuleFlags) -> (RootHandle<Domain>, ModuleId) {
    let domain = runtime.create_domain();
    let id = runtime
        .create_module(domain, bytecode(), flags, "gc.js".into())
        .unwrap();
    (domain, id)
}

fn allocate_garbage(runtime: &mut Runtime, count: usize) {
    for _ in 0..count {
        runtime.heap_mut().allocate(JSObject::new(None));
    }
}

#[test]
fn test_cached_objects_are_relocated() {
    let mut runtime = Runtime::new();
    let (_, id) = load(&mut runtime, RuntimeModuleFlags::default());
    allocate_garbage(&mut runtime, 3);
    let template = runtime.get_or_create_template_object(id, 0, &[2]).unwrap();
    let class = runtime.get_or_create_literal_class(id, 0, &[0, 1]).unwrap();

    let stats = runtime.collect_garbage();
    assert_eq!(stats.objects_freed, 3);
    assert_eq!(stats.objects_moved, 2);
    assert_eq!(runtime.heap().len(), 3);

    let module = runtime.module(id).unwrap();
    let moved_template = module.find_cached_template_object(0).unwrap();
    let moved_class = module.find_cached_literal_hidden_class(0, 2).unwrap();
    assert_ne!(moved_template, template);
    assert_ne!(moved_class, class);

    let part = runtime.identifiers().lookup("part").unwrap();
    let object = runtime.heap().get(moved_template).unwrap();
    assert!(object.is_frozen());
    assert_eq!(object.elements(), &[core_types::Value::Symbol(part)]);
    assert_eq!(runtime.heap().get(moved_class).unwrap().property_count(), 2);

    assert_eq!(runtime.get_or_create_template_object(id, 0, &[2]).unwrap(), moved_template);
    assert_eq!(runtime.get_or_create_literal_class(id, 0, &[0, 1]).unwrap(), moved_class);
}

#[test]
fn test_mark_roots_reports_long_lived_shapes_on_request() {
    let mut runtime = Runtime::new();
    let (_, id) = load(&mut runtime, RuntimeModuleFlags::default());
    runtime.get_or_create_template_object(id, 0, &[2]).unwrap();
    runtime.get_or_create_literal_class(id, 0, &[0]).unwrap();
    runtime.get_or_create_literal_class(id, 1, &[1]).unwrap();

    let module = runtime.module_mut(id).unwrap();
    let mut short = CountingRoots::default();
    module.mark_roots(&mut short, false);
    assert_eq!(short.strong, 1);

    let mut full = CountingRoots::default();
    module.mark_roots(&mut full, true);
    assert_eq!(full.strong, 3);
}

#[test]
fn test_mark_weak_roots_reports_domain() {
    let mut runtime = Runtime::new();
    let (_, id) = load(&mut runtime, RuntimeModuleFlags::default());
    let mut weak = CountingWeakRoots::default();
    runtime.module(id).unwrap().mark_weak_roots(&mut weak);
    assert_eq!(weak.slots.len(), 1);
}

#[test]
fn test_live_domain_follows_compaction() {
    let mut runtime = Runtime::new();
    allocate_garbage(&mut runtime, 2);
    let (handle, id) = load(&mut runtime, RuntimeModuleFlags::default());
    let before = runtime.domain(handle).unwrap();

    runtime.collect_garbage();
    let after = runtime.domain(handle).unwrap();
    assert_ne!(before, after);
    assert_eq!(runtime.module(id).unwrap().domain(runtime.heap()), Some(after));
    assert_eq!(runtime.heap().get(after).unwrap().runtime_modules(), &[id]);

    runtime.collect_garbage();
    assert_eq!(runtime.module(id).unwrap().domain(runtime.heap()), Some(after));
    assert_eq!(runtime.heap().stats().collections, 2);
}

#[test]
fn test_collected_domain_destroys_its_modules() {
    let mut runtime = Runtime::new();
    let (handle, _) = load(&mut runtime, RuntimeModuleFlags::default());
    runtime.release_domain(handle);

    let stats = runtime.collect_garbage();
    assert_eq!(stats.weak_refs_cleared, 1);
    assert!(runtime.modules().is_empty());
    assert!(runtime.heap().is_empty());
}

#[test]
fn test_collected_domain_takes_lazy_children() {
    let mut runtime = Runtime::new();
    let (handle, parent) = load(&mut runtime, RuntimeModuleFlags::default());
    let child = runtime.create_lazy_module(handle, parent, 1).unwrap();
    runtime.add_dependency(parent, child).unwrap();
    runtime.release_domain(handle);

    runtime.collect_garbage();
    assert!(runtime.module(parent).is_none());
    assert!(runtime.module(child).is_none());
}

#[test]
fn test_retained_module_outlives_domain() {
    let mut runtime = Runtime::new();
    let (handle, id) = load(&mut runtime, RuntimeModuleFlags::default());
    runtime.retain_module(id).unwrap();
    runtime.release_domain(handle);

    runtime.collect_garbage();
    let module = runtime.module(id).unwrap();
    assert_eq!(module.ref_count(), 1);
    assert_eq!(module.domain(runtime.heap()), None);

    runtime.collect_garbage();
    assert!(runtime.module(id).is_some());
    runtime.release_module(id).unwrap();
    assert!(runtime.module(id).is_none());
}

#[test]
fn test_persistent_module_outlives_domain() {
    let mut runtime = Runtime::new();
    let (handle, id) = load(&mut runtime, RuntimeModuleFlags::persistent());
    runtime.release_domain(handle);

    runtime.collect_garbage();
    let module = runtime.module(id).unwrap();
    assert_eq!(module.ref_count(), 0);
    assert_eq!(module.domain(runtime.heap()), None);
}

#[test]
fn test_additional_memory_size_tracks_materialization() {
    let mut runtime = Runtime::new();
    let (_, id) = load(&mut runtime, RuntimeModuleFlags::default());
    let before = runtime.additional_memory_size();
    assert!(before > 0);

    let module = runtime.module_mut(id).unwrap();
    module.get_code_block(0);
    module.get_code_block(1);
    assert!(runtime.additional_memory_size() > before);
    assert_eq!(runtime.additional_memory_size(), runtime.module(id).unwrap().additional_memory_size());
}

#[test]
fn test_released_persistent_module_outlives_collected_domain() {
    let mut runtime = Runtime::new();
    let (handle, id) = load(&mut runtime, RuntimeModuleFlags::persistent());
    runtime.release_module(id).unwrap();
    assert_eq!(runtime.module(id).unwrap().ref_count(), 0);

    runtime.release_domain(handle);
    runtime.collect_garbage();
    let module = runtime.module(id).unwrap();
    assert_eq!(module.ref_count(), 0);
    assert_eq!(module.domain(runtime.heap()), None);
}
