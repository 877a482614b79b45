//! Unit tests for host roots

use memory_manager::{Collector, Heap, JSObject, RootSet};

fn collect(heap: &mut Heap, roots: &mut RootSet) {
    let mut gc = Collector::new(heap);
    roots.mark(&mut gc);
    gc.complete_marking();
    gc.compact();
    roots.mark(&mut gc);
    gc.finish();
}

#[test]
fn test_rooted_object_survives_and_moves() {
    let mut heap = Heap::new();
    let mut roots = RootSet::new();
    heap.allocate(JSObject::new(None));
    let kept = heap.allocate(JSObject::new(None));
    let handle = roots.add(kept);

    collect(&mut heap, &mut roots);

    let moved = roots.get(handle).unwrap();
    assert_eq!(moved.addr().index(), 0);
    assert!(heap.get(moved).is_some());
}

#[test]
fn test_unrooted_object_is_freed() {
    let mut heap = Heap::new();
    let mut roots = RootSet::new();
    let obj = heap.allocate(JSObject::new(None));
    let handle = roots.add(obj);
    roots.remove(handle);

    collect(&mut heap, &mut roots);
    assert!(heap.is_empty());
}
