//! Values stored inside GC-managed objects.
//!
//! Template objects and other heap objects hold their slots as `Value`s.
//! Strings are represented by their interned [`SymbolId`]; objects by a
//! movable [`HeapRef`] that the collector rewrites when it compacts.

use std::fmt;

use crate::{HeapRef, SymbolId};

/// A value held in a heap object slot.
///
/// # Examples
///
/// ```
/// use core_types::{HeapRef, Value};
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let object = Value::Object(HeapRef::from_index(3));
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(object.as_heap_ref(), Some(HeapRef::from_index(3)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// Interned string, identified by its symbol
    Symbol(SymbolId),
    /// Reference to a GC-managed object
    Object(HeapRef),
}

impl Value {
    /// Returns whether this value is truthy in JavaScript semantics.
    ///
    /// Interned strings are always treated as truthy except the empty string,
    /// which the identifier table reserves as symbol 0.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::Symbol(sym) => sym.raw() != 0,
            Value::Object(_) => true,
        }
    }

    /// Returns the JavaScript typeof result for this value.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::Undefined.type_of(), "undefined");
    /// assert_eq!(Value::Null.type_of(), "object");
    /// assert_eq!(Value::Double(1.5).type_of(), "number");
    /// ```
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // JavaScript quirk
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::Symbol(_) => "string",
            Value::Object(_) => "object",
        }
    }

    /// Returns the heap reference if this value points at a GC object.
    pub fn as_heap_ref(&self) -> Option<HeapRef> {
        match self {
            Value::Object(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns the heap reference slot so a collector can rewrite it.
    pub fn heap_ref_mut(&mut self) -> Option<&mut HeapRef> {
        match self {
            Value::Object(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Symbol(sym) => write!(f, "{:?}", sym),
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}
