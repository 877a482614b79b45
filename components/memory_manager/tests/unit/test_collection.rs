//! Unit tests for full collection cycles

use core_types::{SymbolId, Value};
use memory_manager::{
    Collector, Domain, GcPhase, Heap, HiddenClass, JSObject, RootAcceptor, WeakRootAcceptor,
};

#[test]
fn test_phases_advance_in_order() {
    let mut heap = Heap::new();
    let mut gc = Collector::new(&mut heap);
    assert_eq!(gc.phase(), GcPhase::Marking);
    gc.complete_marking();
    assert_eq!(gc.phase(), GcPhase::WeakProcessing);
    gc.compact();
    assert_eq!(gc.phase(), GcPhase::Fixup);
    gc.finish();
}

#[test]
fn test_object_graph_survives_through_one_root() {
    let mut heap = Heap::new();
    let garbage = heap.allocate(JSObject::new(None));
    let leaf = heap.allocate(JSObject::with_elements(vec![Value::Smi(42)]));
    let mut root = heap.allocate(JSObject::with_elements(vec![Value::Object(leaf.addr())]));
    assert_eq!(garbage.addr().index(), 0);

    let mut gc = Collector::new(&mut heap);
    (&mut gc as &mut dyn RootAcceptor).accept_gc(&mut root);
    gc.complete_marking();
    gc.compact();
    (&mut gc as &mut dyn RootAcceptor).accept_gc(&mut root);
    let stats = gc.finish();

    assert_eq!(stats.objects_freed, 1);
    assert_eq!(heap.len(), 2);
    let inner = heap.get(root).map(|o| o.elements()[0]);
    let Some(Value::Object(leaf_addr)) = inner else {
        panic!("expected object element, got {:?}", inner);
    };
    let leaf = heap.downcast::<JSObject>(leaf_addr).unwrap();
    assert_eq!(heap.get(leaf).unwrap().elements(), &[Value::Smi(42)]);
}

#[test]
fn test_class_chain_is_kept_alive_by_child() {
    let mut heap = Heap::new();
    let a = SymbolId::from_raw(10);
    let b = SymbolId::from_raw(11);
    let base = heap.allocate(HiddenClass::for_literal(&[a]));
    let child = heap.get(base).unwrap().with_property(base, b);
    let mut child = heap.allocate(child);

    let mut gc = Collector::new(&mut heap);
    (&mut gc as &mut dyn RootAcceptor).accept_gc(&mut child);
    gc.complete_marking();
    gc.compact();
    (&mut gc as &mut dyn RootAcceptor).accept_gc(&mut child);
    let stats = gc.finish();

    assert_eq!(stats.objects_freed, 0);
    let parent = heap.get(child).and_then(HiddenClass::parent).unwrap();
    assert_eq!(heap.get(parent).unwrap().lookup_property(a), Some(0));
}

#[test]
fn test_weak_ref_does_not_keep_target_alive() {
    let mut heap = Heap::new();
    let domain = heap.allocate(Domain::new());
    let weak = heap.create_weak_ref(domain);

    let mut gc = Collector::new(&mut heap);
    gc.complete_marking();
    (&mut gc as &mut dyn WeakRootAcceptor).accept_weak_ref(&weak);
    assert!(!gc.is_marked(domain.addr()));
    gc.compact();
    gc.mark_weak_ref(&weak);
    gc.finish();

    assert!(heap.is_empty());
    assert!(heap.weak_ref_target(&weak).is_none());
}

#[test]
fn test_stats_accumulate_across_collections() {
    let mut heap = Heap::new();
    for _ in 0..2 {
        heap.allocate(JSObject::new(None));
        let mut gc = Collector::new(&mut heap);
        gc.complete_marking();
        gc.compact();
        gc.finish();
    }
    assert_eq!(heap.stats().collections, 2);
    assert_eq!(heap.stats().objects_freed, 2);
    assert_eq!(heap.stats().live_objects, 0);
}
