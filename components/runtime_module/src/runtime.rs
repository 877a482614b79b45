//! The execution context owning the heap, the identifier table and every
//! runtime module.
//!
//! Module lifetime follows two disjoint disciplines. Normally a module is
//! reference counted: its domain holds one reference, lazy children are held
//! by their parent's dependency list, and the module is destroyed when the
//! count reaches zero (persistent modules excepted). At shutdown every module
//! is switched to unconditional teardown and freed in arbitrary order.

use std::sync::Arc;

use bytecode_system::{BytecodeProvider, LazyFunctionProvider};
use core_types::{FunctionId, ModuleError, ModuleId, ModuleResult, SourceLocator, StringId, SymbolId, Value};
use memory_manager::{Collector, Domain, Gc, GcStats, Heap, HiddenClass, JSObject, RootHandle, RootSet};

use crate::config::RuntimeConfig;
use crate::flags::RuntimeModuleFlags;
use crate::identifier_table::IdentifierTable;
use crate::module::RuntimeModule;
use crate::module_list::ModuleList;

/// One execution context.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bytecode_system::BytecodeModuleBuilder;
/// use runtime_module::{Runtime, RuntimeModuleFlags};
///
/// let mut builder = BytecodeModuleBuilder::new();
/// let name = builder.add_identifier("main");
/// builder.add_function(name, 0, 1, vec![0x00]);
///
/// let mut runtime = Runtime::new();
/// let domain = runtime.create_domain();
/// let id = runtime
///     .create_module(domain, Arc::new(builder.build()), RuntimeModuleFlags::default(), "main.js".into())
///     .unwrap();
///
/// let module = runtime.module_mut(id).unwrap();
/// assert!(module.is_initialized());
/// assert!(module.get_code_block(0).is_some());
/// ```
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    heap: Heap,
    identifiers: IdentifierTable,
    modules: ModuleList,
    roots: RootSet,
    persistent_module: Option<ModuleId>,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a runtime with an explicit configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Runtime {
            heap: Heap::with_config(config.heap_config()),
            identifiers: IdentifierTable::with_capacity(config.identifier_capacity),
            modules: ModuleList::new(),
            roots: RootSet::new(),
            persistent_module: None,
            config,
        }
    }

    /// The configuration this runtime was created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The GC heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The GC heap, mutably.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// The identifier table.
    pub fn identifiers(&self) -> &IdentifierTable {
        &self.identifiers
    }

    /// The identifier table, mutably.
    pub fn identifiers_mut(&mut self) -> &mut IdentifierTable {
        &mut self.identifiers
    }

    /// Host-held strong roots.
    pub fn roots_mut(&mut self) -> &mut RootSet {
        &mut self.roots
    }

    /// Every live module.
    pub fn modules(&self) -> &ModuleList {
        &self.modules
    }

    /// A live module.
    pub fn module(&self, id: ModuleId) -> Option<&RuntimeModule> {
        self.modules.get(id)
    }

    /// A live module, mutably.
    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut RuntimeModule> {
        self.modules.get_mut(id)
    }

    /// A live module together with the identifier table its symbol
    /// operations need.
    pub fn module_and_symbols(&mut self, id: ModuleId) -> Option<(&mut RuntimeModule, &mut IdentifierTable)> {
        let Runtime { modules, identifiers, .. } = self;
        modules.get_mut(id).map(|module| (module, identifiers))
    }

    // Domains

    /// Allocates a domain and roots it until [`release_domain`](Self::release_domain).
    pub fn create_domain(&mut self) -> RootHandle<Domain> {
        let domain = self.heap.allocate(Domain::new());
        self.roots.add(domain)
    }

    /// Current handle of a rooted domain.
    pub fn domain(&self, handle: RootHandle<Domain>) -> Option<Gc<Domain>> {
        self.roots.get(handle)
    }

    /// Unroots a domain. It is collected by the next collection unless
    /// something else keeps it alive.
    pub fn release_domain(&mut self, handle: RootHandle<Domain>) -> Option<Gc<Domain>> {
        self.roots.remove(handle)
    }

    // Creation

    /// Creates a module and imports `bytecode`, including its CommonJS
    /// tables.
    ///
    /// If the CommonJS import fails the module is destroyed and the error
    /// returned; no module is left behind.
    pub fn create_module(
        &mut self,
        domain: RootHandle<Domain>,
        bytecode: Arc<dyn BytecodeProvider>,
        flags: RuntimeModuleFlags,
        source_locator: SourceLocator,
    ) -> ModuleResult<ModuleId> {
        let id = self.create_uninitialized_module(domain, flags)?;
        if let Some(module) = self.modules.get_mut(id) {
            module.set_source_locator(source_locator);
        }
        if let Err(err) = self.initialize_module(id, bytecode) {
            self.destroy_module(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Creates an empty module registered with `domain`.
    pub fn create_uninitialized_module(
        &mut self,
        domain: RootHandle<Domain>,
        flags: RuntimeModuleFlags,
    ) -> ModuleResult<ModuleId> {
        let domain = self.domain(domain).ok_or(ModuleError::DomainUnavailable)?;
        let weak = self.heap.create_weak_ref(domain);
        let id = self
            .modules
            .insert_with(|id| RuntimeModule::new(id, weak, flags, SourceLocator::default()));
        if let Some(domain) = self.heap.get_mut(domain) {
            domain.add_runtime_module(id);
        }
        if flags.persistent {
            self.note_persistent(id);
        }
        tracing::debug!(
            target: "runtime_module::lifecycle",
            module = %id,
            persistent = flags.persistent,
            "module created"
        );
        Ok(id)
    }

    fn note_persistent(&mut self, id: ModuleId) {
        match self.persistent_module {
            Some(existing) if self.config.verify_single_persistent => {
                tracing::warn!(
                    target: "runtime_module::lifecycle",
                    module = %id,
                    %existing,
                    "more than one persistent module registered"
                );
            }
            Some(_) => {}
            None => self.persistent_module = Some(id),
        }
    }

    /// Imports `bytecode` into an uninitialized module, including its
    /// CommonJS tables.
    ///
    /// If the CommonJS import fails the module stays alive and uninitialized,
    /// so the call can be retried with other bytecode.
    pub fn initialize_module(&mut self, id: ModuleId, bytecode: Arc<dyn BytecodeProvider>) -> ModuleResult<()> {
        let Runtime {
            heap,
            identifiers,
            modules,
            ..
        } = self;
        let module = modules.get_mut(id).ok_or(ModuleError::UnknownModule(id))?;
        if module.bytecode().is_some() {
            return Err(ModuleError::AlreadyInitialized(id));
        }
        module.initialize(bytecode, heap, identifiers)
    }

    /// Imports `bytecode` into an uninitialized module without its CommonJS
    /// tables.
    pub fn initialize_module_without_cjs(
        &mut self,
        id: ModuleId,
        bytecode: Arc<dyn BytecodeProvider>,
    ) -> ModuleResult<()> {
        let (module, identifiers) = self.module_and_symbols(id).ok_or(ModuleError::UnknownModule(id))?;
        if module.bytecode().is_some() {
            return Err(ModuleError::AlreadyInitialized(id));
        }
        module.initialize_without_cjs(bytecode, identifiers);
        Ok(())
    }

    /// Creates a one-function module for a lazily compiled function of
    /// `parent`.
    ///
    /// The child is not registered with the domain. The parent must take
    /// ownership of it with [`add_dependency`](Self::add_dependency).
    pub fn create_lazy_module(
        &mut self,
        domain: RootHandle<Domain>,
        parent: ModuleId,
        function_index: FunctionId,
    ) -> ModuleResult<ModuleId> {
        let domain = self.domain(domain).ok_or(ModuleError::DomainUnavailable)?;
        let Runtime {
            heap,
            identifiers,
            modules,
            ..
        } = self;
        let parent_module = modules.get_mut(parent).ok_or(ModuleError::UnknownModule(parent))?;
        let bytecode = parent_module
            .bytecode_shared()
            .ok_or(ModuleError::NotInitialized(parent))?;
        if function_index >= bytecode.function_count() {
            return Err(ModuleError::FunctionOutOfRange {
                module: parent,
                function_index,
            });
        }

        let name_index = bytecode.function_header(function_index).name;
        let name = parent_module.get_symbol_from_string_index(name_index, identifiers);
        let source_locator = parent_module.source_locator().clone();
        let provider: Arc<dyn BytecodeProvider> = Arc::new(LazyFunctionProvider::new(bytecode, function_index));
        let weak = heap.create_weak_ref(domain);
        let child = modules.insert_with(|id| RuntimeModule::new_lazy(id, weak, source_locator, provider, name));

        tracing::debug!(
            target: "runtime_module::lifecycle",
            module = %child,
            %parent,
            function = function_index,
            "lazy module created"
        );
        Ok(child)
    }

    /// Completes a lazy module with its compiled bytecode.
    pub fn initialize_lazy_module(&mut self, id: ModuleId, bytecode: Arc<dyn BytecodeProvider>) -> ModuleResult<()> {
        let (module, identifiers) = self.module_and_symbols(id).ok_or(ModuleError::UnknownModule(id))?;
        match module.bytecode() {
            None => return Err(ModuleError::NotInitialized(id)),
            Some(current) if !current.is_lazy() => return Err(ModuleError::AlreadyInitialized(id)),
            Some(_) => {}
        }
        module.initialize_lazy(bytecode, identifiers);
        Ok(())
    }

    /// Makes `parent` keep `child` alive.
    ///
    /// The parent becomes the child's only owner, so `child` must be an
    /// unshared lazy module: not registered with a domain, holding just its
    /// initial reference, and not yet a dependency of any module.
    pub fn add_dependency(&mut self, parent: ModuleId, child: ModuleId) -> ModuleResult<()> {
        let child_module = self.modules.get(child).ok_or(ModuleError::UnknownModule(child))?;
        let registered = child_module
            .domain(&self.heap)
            .and_then(|domain| self.heap.get(domain))
            .is_some_and(|domain| domain.owns(child));
        let owned = self
            .modules
            .iter()
            .any(|module| module.dependent_modules().contains(&child));
        if parent == child || registered || owned || child_module.ref_count() != 1 {
            return Err(ModuleError::SharedDependency(child));
        }
        let module = self.modules.get_mut(parent).ok_or(ModuleError::UnknownModule(parent))?;
        module.add_dependency(child);
        Ok(())
    }

    // Reference counting

    /// Adds a reference to a module.
    pub fn retain_module(&mut self, id: ModuleId) -> ModuleResult<()> {
        let module = self.modules.get_mut(id).ok_or(ModuleError::UnknownModule(id))?;
        module.retain();
        Ok(())
    }

    /// Drops a reference to a module, destroying it at zero.
    ///
    /// Persistent modules survive reaching zero and ignore further
    /// releases. Modules prepared for shutdown ignore releases.
    pub fn release_module(&mut self, id: ModuleId) -> ModuleResult<()> {
        let module = self.modules.get_mut(id).ok_or(ModuleError::UnknownModule(id))?;
        if module.is_shutting_down() {
            return Ok(());
        }
        if module.flags().persistent && module.ref_count() == 0 {
            return Ok(());
        }
        let remaining = module.release();
        if remaining == 0 && !module.flags().persistent {
            self.destroy_module(id);
        }
        Ok(())
    }

    fn destroy_module(&mut self, id: ModuleId) {
        let removed = self.modules.remove_tree(id);
        debug_assert!(!removed.is_empty(), "{} destroyed twice", id);
        for module in &removed {
            self.unregister_from_domain(module);
        }
        tracing::debug!(
            target: "runtime_module::lifecycle",
            module = %id,
            destroyed = removed.len(),
            "module destroyed"
        );
    }

    fn unregister_from_domain(&mut self, module: &RuntimeModule) {
        if self.persistent_module == Some(module.id()) {
            self.persistent_module = None;
        }
        if let Some(domain) = module.domain(&self.heap) {
            if let Some(domain) = self.heap.get_mut(domain) {
                domain.remove_runtime_module(module.id());
            }
        }
    }

    // Interpreter support

    /// Hidden class for an object literal, shared between executions of the
    /// same literal.
    ///
    /// `keys` are string indices of the property names in layout order.
    pub fn get_or_create_literal_class(
        &mut self,
        id: ModuleId,
        key_buffer_index: u32,
        keys: &[StringId],
    ) -> ModuleResult<Gc<HiddenClass>> {
        let Runtime {
            heap,
            identifiers,
            modules,
            ..
        } = self;
        let module = modules.get_mut(id).ok_or(ModuleError::UnknownModule(id))?;
        let num_literals = keys.len() as u32;
        if let Some(class) = module.find_cached_literal_hidden_class(key_buffer_index, num_literals) {
            return Ok(class);
        }
        let mut symbols = Vec::with_capacity(keys.len());
        for &key in keys {
            symbols.push(module.get_symbol_from_string_index(key, &mut *identifiers));
        }
        let class = heap.allocate(HiddenClass::for_literal(&symbols));
        module.try_cache_literal_hidden_class(key_buffer_index, num_literals, class);
        Ok(class)
    }

    /// Template object for a tagged-template call site, created once per
    /// template id.
    ///
    /// `strings` are the string indices of the template's parts.
    pub fn get_or_create_template_object(
        &mut self,
        id: ModuleId,
        template_id: u32,
        strings: &[StringId],
    ) -> ModuleResult<Gc<JSObject>> {
        let Runtime {
            heap,
            identifiers,
            modules,
            ..
        } = self;
        let module = modules.get_mut(id).ok_or(ModuleError::UnknownModule(id))?;
        if let Some(object) = module.find_cached_template_object(template_id) {
            return Ok(object);
        }
        let mut parts = Vec::with_capacity(strings.len());
        for &string in strings {
            let sym: SymbolId = module.get_symbol_from_string_index(string, &mut *identifiers);
            parts.push(Value::Symbol(sym));
        }
        let mut object = JSObject::with_elements(parts);
        object.freeze();
        let object = heap.allocate(object);
        module.cache_template_object(template_id, object);
        Ok(object)
    }

    // Collection

    /// Runs a full collection.
    ///
    /// Domains that become unreachable release their reference on every
    /// module they own; those modules see their domain as `None` from then
    /// on and are destroyed if nothing else holds them.
    pub fn collect_garbage(&mut self) -> GcStats {
        let Runtime {
            heap,
            modules,
            roots,
            ..
        } = self;

        let mut gc = Collector::new(heap);
        roots.mark(&mut gc);
        for module in modules.iter_mut() {
            module.mark_roots(&mut gc, true);
        }
        gc.complete_marking();

        for module in modules.iter() {
            module.mark_weak_roots(&mut gc);
        }
        let orphaned = gc.finalize_dead_domains();
        gc.compact();

        roots.mark(&mut gc);
        for module in modules.iter_mut() {
            module.mark_roots(&mut gc, true);
            module.mark_domain_ref(&mut gc);
        }
        let stats = gc.finish();

        for id in orphaned {
            if let Err(err) = self.release_module(id) {
                tracing::debug!(target: "runtime_module::lifecycle", module = %id, error = %err, "orphaned module already gone");
            }
        }
        stats
    }

    /// Malloc'd memory held by all modules.
    pub fn additional_memory_size(&self) -> usize {
        self.modules.iter().map(RuntimeModule::additional_memory_size).sum()
    }

    /// Epilogues of every initialized module that does not hide its own.
    pub fn get_epilogues(&self) -> Vec<&[u8]> {
        self.modules
            .iter()
            .filter(|module| module.is_initialized() && !module.hides_epilogue())
            .map(RuntimeModule::get_epilogue)
            .collect()
    }

    // Shutdown

    /// Tears down one module unconditionally, ignoring its reference count
    /// and without touching the modules it depends on.
    pub fn shutdown_module(&mut self, id: ModuleId) -> ModuleResult<()> {
        let module = self.modules.get_mut(id).ok_or(ModuleError::UnknownModule(id))?;
        module.prepare_for_shutdown();
        if let Some(module) = self.modules.remove(id) {
            self.unregister_from_domain(&module);
        }
        tracing::debug!(target: "runtime_module::lifecycle", module = %id, "module shut down");
        Ok(())
    }

    /// Tears down every module in arbitrary order.
    pub fn shutdown(&mut self) {
        if self.modules.is_empty() {
            return;
        }
        for module in self.modules.iter_mut() {
            module.prepare_for_shutdown();
        }
        let drained = self.modules.drain();
        for module in &drained {
            self.unregister_from_domain(module);
        }
        tracing::debug!(target: "runtime_module::lifecycle", modules = drained.len(), "runtime shut down");
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
