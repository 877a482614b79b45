//! Plain objects.

use core_types::{HeapRef, Value};

use crate::heap::Gc;
use crate::hidden_class::HiddenClass;

/// Ordinary object: named properties laid out by a hidden class plus
/// indexed elements.
#[derive(Debug, Clone, Default)]
pub struct JSObject {
    class: Option<Gc<HiddenClass>>,
    properties: Vec<Value>,
    elements: Vec<Value>,
    frozen: bool,
}

impl JSObject {
    /// Creates an empty object with the given shape.
    pub fn new(class: Option<Gc<HiddenClass>>) -> Self {
        JSObject {
            class,
            ..JSObject::default()
        }
    }

    /// Creates a shapeless object holding `elements`.
    pub fn with_elements(elements: Vec<Value>) -> Self {
        JSObject {
            elements,
            ..JSObject::default()
        }
    }

    /// The object's hidden class.
    pub fn class(&self) -> Option<Gc<HiddenClass>> {
        self.class
    }

    /// Changes the object's hidden class.
    pub fn set_class(&mut self, class: Gc<HiddenClass>) {
        self.class = Some(class);
    }

    /// Reads the property at `offset`.
    pub fn property(&self, offset: u32) -> Option<Value> {
        self.properties.get(offset as usize).copied()
    }

    /// Writes the property at `offset`. Returns false if the object is frozen.
    pub fn set_property(&mut self, offset: u32, value: Value) -> bool {
        if self.frozen {
            return false;
        }
        let offset = offset as usize;
        if offset >= self.properties.len() {
            self.properties.resize(offset + 1, Value::Undefined);
        }
        self.properties[offset] = value;
        true
    }

    /// Indexed elements.
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// Appends an element. Returns false if the object is frozen.
    pub fn push_element(&mut self, value: Value) -> bool {
        if self.frozen {
            return false;
        }
        self.elements.push(value);
        true
    }

    /// Makes the object immutable.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Returns true once [`freeze`](Self::freeze) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn references(&self) -> impl Iterator<Item = HeapRef> + '_ {
        self.class
            .map(Gc::addr)
            .into_iter()
            .chain(self.properties.iter().filter_map(Value::as_heap_ref))
            .chain(self.elements.iter().filter_map(Value::as_heap_ref))
    }

    pub(crate) fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(&mut HeapRef)) {
        if let Some(class) = &mut self.class {
            f(class.addr_mut());
        }
        for value in self.properties.iter_mut().chain(self.elements.iter_mut()) {
            if let Some(slot) = value.heap_ref_mut() {
                f(slot);
            }
        }
    }
}
