//! Hidden classes (object shapes).
//!
//! Objects with the same properties in the same order share a hidden class,
//! so property access is an offset lookup instead of a hash lookup. Object
//! literals with the same key sequence are created from one cached class.

use core_types::{HeapRef, SymbolId};

use crate::heap::Gc;

/// A property slot in a hidden class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property key
    pub name: SymbolId,
    /// Offset in the object's property storage
    pub offset: u32,
}

/// Shared object shape.
///
/// # Example
///
/// ```
/// use memory_manager::HiddenClass;
/// use core_types::SymbolId;
///
/// let x = SymbolId::from_raw(10);
/// let y = SymbolId::from_raw(11);
/// let class = HiddenClass::for_literal(&[x, y]);
///
/// assert_eq!(class.lookup_property(x), Some(0));
/// assert_eq!(class.lookup_property(y), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HiddenClass {
    properties: Vec<PropertyDescriptor>,
    parent: Option<Gc<HiddenClass>>,
}

impl HiddenClass {
    /// Creates a class with no properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the class of an object literal with keys in the given order.
    ///
    /// Duplicate keys keep their first slot.
    pub fn for_literal(keys: &[SymbolId]) -> Self {
        let mut class = HiddenClass::new();
        for &key in keys {
            if class.lookup_property(key).is_none() {
                class.push(key);
            }
        }
        class
    }

    /// Creates the class reached from `this` by adding `name`.
    ///
    /// The new class records `this` as its parent, which keeps the parent
    /// alive while the child is.
    pub fn with_property(&self, this: Gc<HiddenClass>, name: SymbolId) -> HiddenClass {
        let mut class = HiddenClass {
            properties: self.properties.clone(),
            parent: Some(this),
        };
        if class.lookup_property(name).is_none() {
            class.push(name);
        }
        class
    }

    fn push(&mut self, name: SymbolId) {
        let offset = self.properties.len() as u32;
        self.properties.push(PropertyDescriptor { name, offset });
    }

    /// Offset of `name`, if present.
    pub fn lookup_property(&self, name: SymbolId) -> Option<u32> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.offset)
    }

    /// Number of properties.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Properties in slot order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// The class this one was derived from.
    pub fn parent(&self) -> Option<Gc<HiddenClass>> {
        self.parent
    }

    pub(crate) fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(&mut HeapRef)) {
        if let Some(parent) = &mut self.parent {
            f(parent.addr_mut());
        }
    }
}
