//! The list of every live runtime module in a runtime.

use core_types::ModuleId;

use crate::module::RuntimeModule;

/// Slab of runtime modules indexed by [`ModuleId`].
///
/// Ids are never reused, so a stale id simply finds nothing. Modules are
/// boxed and never move while alive.
#[derive(Debug, Default)]
pub struct ModuleList {
    slots: Vec<Option<Box<RuntimeModule>>>,
    live: usize,
}

impl ModuleList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_with(&mut self, make: impl FnOnce(ModuleId) -> RuntimeModule) -> ModuleId {
        let id = ModuleId::from_index(self.slots.len() as u32);
        self.slots.push(Some(Box::new(make(id))));
        self.live += 1;
        id
    }

    /// The module with `id`, if alive.
    pub fn get(&self, id: ModuleId) -> Option<&RuntimeModule> {
        self.slots.get(id.index()).and_then(|slot| slot.as_deref())
    }

    /// Mutable access to the module with `id`, if alive.
    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut RuntimeModule> {
        self.slots.get_mut(id.index()).and_then(|slot| slot.as_deref_mut())
    }

    /// Returns true if `id` is alive.
    pub fn contains(&self, id: ModuleId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn remove(&mut self, id: ModuleId) -> Option<Box<RuntimeModule>> {
        let module = self.slots.get_mut(id.index()).and_then(Option::take)?;
        self.live -= 1;
        Some(module)
    }

    /// Removes `id` and, transitively, every module it keeps alive.
    pub(crate) fn remove_tree(&mut self, id: ModuleId) -> Vec<Box<RuntimeModule>> {
        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(module) = self.remove(next) {
                pending.extend_from_slice(module.dependent_modules());
                removed.push(module);
            }
        }
        removed
    }

    /// Number of live modules.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no module is alive.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Ids of live modules, in creation order.
    pub fn ids(&self) -> Vec<ModuleId> {
        self.iter().map(RuntimeModule::id).collect()
    }

    /// Live modules, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &RuntimeModule> + '_ {
        self.slots.iter().filter_map(|slot| slot.as_deref())
    }

    /// Live modules, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RuntimeModule> + '_ {
        self.slots.iter_mut().filter_map(|slot| slot.as_deref_mut())
    }

    /// Removes every module regardless of reference counts.
    pub(crate) fn drain(&mut self) -> Vec<Box<RuntimeModule>> {
        self.live = 0;
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}
