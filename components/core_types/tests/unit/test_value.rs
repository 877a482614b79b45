//! Unit tests for Value

use core_types::{HeapRef, SymbolId, Value};

#[test]
fn test_type_of_all_variants() {
    assert_eq!(Value::Undefined.type_of(), "undefined");
    assert_eq!(Value::Null.type_of(), "object");
    assert_eq!(Value::Boolean(true).type_of(), "boolean");
    assert_eq!(Value::Smi(1).type_of(), "number");
    assert_eq!(Value::Double(0.5).type_of(), "number");
    assert_eq!(Value::Symbol(SymbolId::from_raw(3)).type_of(), "string");
    assert_eq!(Value::Object(HeapRef::from_index(0)).type_of(), "object");
}

#[test]
fn test_objects_are_truthy() {
    assert!(Value::Object(HeapRef::from_index(0)).is_truthy());
}

#[test]
fn test_only_objects_expose_heap_refs() {
    let values = [
        Value::Undefined,
        Value::Smi(4),
        Value::Symbol(SymbolId::from_raw(1)),
        Value::Object(HeapRef::from_index(8)),
    ];
    let refs: Vec<_> = values.iter().filter_map(Value::as_heap_ref).collect();
    assert_eq!(refs, vec![HeapRef::from_index(8)]);
}
