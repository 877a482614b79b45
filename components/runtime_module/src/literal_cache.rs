//! Per-module caches for object-literal shapes and template objects.
//!
//! Both caches hold GC handles. Their entries are strong roots for as long as
//! they are cached, and are reported to the collector through
//! [`RuntimeModule::mark_roots`](crate::RuntimeModule::mark_roots).

use rustc_hash::FxHashMap;

use memory_manager::{Gc, HiddenClass, JSObject, RootAcceptor};

/// Key-buffer indices at or above this value cannot be cached.
pub const LITERAL_KEY_BUFFER_LIMIT: u32 = 1 << 24;

/// Literal counts at or above this value cannot be cached.
pub const LITERAL_COUNT_LIMIT: u32 = 1 << 8;

/// Packs an object literal's layout into a single cache key.
///
/// Returns `None` when either part does not fit.
///
/// # Example
///
/// ```
/// use runtime_module::literal_cache::pack_literal_key;
///
/// assert_eq!(pack_literal_key(2, 3), Some(0x203));
/// assert_eq!(pack_literal_key(1 << 24, 1), None);
/// assert_eq!(pack_literal_key(0, 256), None);
/// ```
#[inline]
pub fn pack_literal_key(key_buffer_index: u32, num_literals: u32) -> Option<u32> {
    if key_buffer_index >= LITERAL_KEY_BUFFER_LIMIT || num_literals >= LITERAL_COUNT_LIMIT {
        return None;
    }
    Some(key_buffer_index << 8 | num_literals)
}

/// Hidden classes of object literals, keyed by packed layout.
#[derive(Debug, Default)]
pub struct LiteralShapeCache {
    entries: FxHashMap<u32, Gc<HiddenClass>>,
}

impl LiteralShapeCache {
    /// Looks up the cached class for a layout.
    pub fn find(&self, key_buffer_index: u32, num_literals: u32) -> Option<Gc<HiddenClass>> {
        let key = pack_literal_key(key_buffer_index, num_literals)?;
        self.entries.get(&key).copied()
    }

    /// Caches `class` for a layout, replacing any earlier entry.
    ///
    /// Layouts that do not pack are skipped; returns whether it was cached.
    pub fn try_insert(&mut self, key_buffer_index: u32, num_literals: u32, class: Gc<HiddenClass>) -> bool {
        match pack_literal_key(key_buffer_index, num_literals) {
            Some(key) => {
                self.entries.insert(key, class);
                true
            }
            None => false,
        }
    }

    /// Number of cached layouts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn mark(&mut self, acceptor: &mut dyn RootAcceptor) {
        for class in self.entries.values_mut() {
            acceptor.accept_gc(class);
        }
    }

    pub(crate) fn memory_size(&self) -> usize {
        self.entries.capacity() * std::mem::size_of::<(u32, Gc<HiddenClass>)>()
    }
}

/// Template objects, keyed by the compiler-assigned template id.
#[derive(Debug, Default)]
pub struct TemplateObjectCache {
    entries: FxHashMap<u32, Gc<JSObject>>,
}

impl TemplateObjectCache {
    /// Looks up the template object for `template_id`.
    pub fn find(&self, template_id: u32) -> Option<Gc<JSObject>> {
        self.entries.get(&template_id).copied()
    }

    /// Caches the template object for `template_id`.
    ///
    /// Each id is cached once; a template object's identity must not change.
    pub fn insert(&mut self, template_id: u32, object: Gc<JSObject>) {
        let previous = self.entries.insert(template_id, object);
        debug_assert!(previous.is_none(), "template {} cached twice", template_id);
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn mark(&mut self, acceptor: &mut dyn RootAcceptor) {
        for object in self.entries.values_mut() {
            acceptor.accept_gc(object);
        }
    }

    pub(crate) fn memory_size(&self) -> usize {
        self.entries.capacity() * std::mem::size_of::<(u32, Gc<JSObject>)>()
    }
}
