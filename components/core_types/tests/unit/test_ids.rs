//! Unit tests for identifier newtypes

use core_types::{HeapRef, ModuleId, SymbolId};
use std::collections::HashSet;

#[test]
fn test_symbol_ids_hash_by_value() {
    let mut set = HashSet::new();
    set.insert(SymbolId::from_raw(1));
    set.insert(SymbolId::from_raw(1));
    set.insert(SymbolId::from_raw(2));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_invalid_symbol_is_default() {
    let slots = vec![SymbolId::default(); 3];
    assert!(slots.iter().all(|s| !s.is_valid()));
}

#[test]
fn test_module_ids_order_by_index() {
    let a = ModuleId::from_index(1);
    let b = ModuleId::from_index(5);
    assert!(a < b);
    assert_eq!(b.index(), 5);
}

#[test]
fn test_heap_ref_round_trip_index() {
    let r = HeapRef::from_index(42);
    assert_eq!(r.index(), 42);
    assert_ne!(r, HeapRef::from_index(41));
}
