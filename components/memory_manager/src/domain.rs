//! Domains: the GC-managed owners of runtime modules.
//!
//! A domain records which runtime modules belong to it and the CommonJS
//! module tables those modules registered. It holds one reference to each
//! registered module; when the domain becomes unreachable the collector
//! reports the modules so the owner can drop those references.

use rustc_hash::FxHashMap;

use core_types::{FunctionId, ModuleId, SymbolId};

/// A CommonJS module registered in a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CjsModule {
    /// Runtime module holding the function
    pub module: ModuleId,
    /// Function implementing the CommonJS module body
    pub function_index: FunctionId,
}

/// Logical owner of a group of runtime modules.
///
/// # Example
///
/// ```
/// use memory_manager::{CjsModule, Domain};
/// use core_types::{ModuleId, SymbolId};
///
/// let mut domain = Domain::new();
/// let module = ModuleId::from_index(0);
/// domain.add_runtime_module(module);
///
/// let entry = CjsModule { module, function_index: 1 };
/// assert!(domain.register_cjs_module(SymbolId::from_raw(7), entry));
/// assert!(!domain.register_cjs_module(SymbolId::from_raw(7), entry));
/// ```
#[derive(Debug, Default)]
pub struct Domain {
    runtime_modules: Vec<ModuleId>,
    cjs_modules: FxHashMap<SymbolId, CjsModule>,
    static_cjs_modules: Vec<Option<CjsModule>>,
}

impl Domain {
    /// Creates an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a runtime module with this domain.
    pub fn add_runtime_module(&mut self, module: ModuleId) {
        debug_assert!(!self.owns(module), "{} registered twice", module);
        self.runtime_modules.push(module);
    }

    /// Unregisters a module and every CommonJS entry pointing into it.
    ///
    /// Returns false if the module was not registered.
    pub fn remove_runtime_module(&mut self, module: ModuleId) -> bool {
        let Some(pos) = self.runtime_modules.iter().position(|&m| m == module) else {
            return false;
        };
        self.runtime_modules.remove(pos);
        self.remove_cjs_modules(module);
        true
    }

    /// Drops every CommonJS entry pointing into `module`, keeping the module
    /// registered. Returns how many entries were dropped.
    ///
    /// Static ids at the end of the sequence are handed out again.
    pub fn remove_cjs_modules(&mut self, module: ModuleId) -> usize {
        let before = self.cjs_modules.len();
        self.cjs_modules.retain(|_, entry| entry.module != module);
        let mut removed = before - self.cjs_modules.len();
        for slot in &mut self.static_cjs_modules {
            if slot.is_some_and(|entry| entry.module == module) {
                *slot = None;
                removed += 1;
            }
        }
        while matches!(self.static_cjs_modules.last(), Some(None)) {
            self.static_cjs_modules.pop();
        }
        removed
    }

    /// Modules registered with this domain, in registration order.
    pub fn runtime_modules(&self) -> &[ModuleId] {
        &self.runtime_modules
    }

    /// Returns true if `module` is registered here.
    pub fn owns(&self, module: ModuleId) -> bool {
        self.runtime_modules.contains(&module)
    }

    /// Registers a CommonJS module under its filename symbol.
    ///
    /// Returns false if the name is already taken.
    pub fn register_cjs_module(&mut self, name: SymbolId, entry: CjsModule) -> bool {
        use std::collections::hash_map::Entry;
        match self.cjs_modules.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    /// Registers a statically resolved CommonJS module.
    ///
    /// Static ids must arrive densely in order. On mismatch the expected id
    /// is returned.
    pub fn register_static_cjs_module(&mut self, module_id: u32, entry: CjsModule) -> Result<(), u32> {
        let expected = self.static_cjs_modules.len() as u32;
        if module_id != expected {
            return Err(expected);
        }
        self.static_cjs_modules.push(Some(entry));
        Ok(())
    }

    /// Looks up a CommonJS module by filename symbol.
    pub fn cjs_module(&self, name: SymbolId) -> Option<CjsModule> {
        self.cjs_modules.get(&name).copied()
    }

    /// Looks up a static CommonJS module by id.
    pub fn static_cjs_module(&self, module_id: u32) -> Option<CjsModule> {
        self.static_cjs_modules
            .get(module_id as usize)
            .copied()
            .flatten()
    }

    /// Number of CommonJS modules registered by name.
    pub fn cjs_module_count(&self) -> usize {
        self.cjs_modules.len()
    }

    /// Number of static CommonJS ids handed out.
    pub fn static_cjs_module_count(&self) -> usize {
        self.static_cjs_modules.len()
    }
}
