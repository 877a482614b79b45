//! The runtime module: the live bridge between one bytecode unit's static
//! tables and the runtime's symbols, code blocks and GC objects.
//!
//! Symbols and code blocks are materialized lazily, at most once per slot.
//! The module refers to its owning [`Domain`] weakly; the domain holds the
//! owning reference. Modules are created and destroyed through
//! [`Runtime`](crate::Runtime), which keeps the process-wide module list.

use std::sync::Arc;

use bytecode_system::{hash_string, BytecodeProvider, StringKind};
use core_types::{FunctionId, ModuleError, ModuleId, ModuleResult, SourceLocator, StringId, SymbolId};
use memory_manager::{Collector, Domain, Gc, Heap, HiddenClass, JSObject, RootAcceptor, WeakRef, WeakRootAcceptor};

use crate::cjs;
use crate::code_block::CodeBlock;
use crate::flags::RuntimeModuleFlags;
use crate::function_map::FunctionMap;
use crate::identifier_table::SymbolTable;
use crate::literal_cache::{LiteralShapeCache, TemplateObjectCache};
use crate::string_id_map::StringIdMap;

/// Which teardown discipline applies to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Destroyed when its reference count reaches zero
    Live,
    /// Destroyed only by the shutdown sweep; releases are ignored
    ShuttingDown,
}

/// Runtime state of one loaded bytecode unit.
#[derive(Debug)]
pub struct RuntimeModule {
    id: ModuleId,
    flags: RuntimeModuleFlags,
    source_locator: SourceLocator,
    domain: WeakRef<Domain>,
    bytecode: Option<Arc<dyn BytecodeProvider>>,
    string_id_map: StringIdMap,
    function_map: FunctionMap,
    dependent_modules: Vec<ModuleId>,
    literal_shapes: LiteralShapeCache,
    template_objects: TemplateObjectCache,
    ref_count: u32,
    lifecycle: Lifecycle,
}

impl RuntimeModule {
    pub(crate) fn new(
        id: ModuleId,
        domain: WeakRef<Domain>,
        flags: RuntimeModuleFlags,
        source_locator: SourceLocator,
    ) -> Self {
        RuntimeModule {
            id,
            flags,
            source_locator,
            domain,
            bytecode: None,
            string_id_map: StringIdMap::default(),
            function_map: FunctionMap::default(),
            dependent_modules: Vec::new(),
            literal_shapes: LiteralShapeCache::default(),
            template_objects: TemplateObjectCache::default(),
            ref_count: 1,
            lifecycle: Lifecycle::Live,
        }
    }

    /// Builds a module whose only function is a not-yet-compiled stub.
    ///
    /// `name` is the function's name symbol, resolved by the parent.
    pub(crate) fn new_lazy(
        id: ModuleId,
        domain: WeakRef<Domain>,
        source_locator: SourceLocator,
        provider: Arc<dyn BytecodeProvider>,
        name: SymbolId,
    ) -> Self {
        let mut module = Self::new(id, domain, RuntimeModuleFlags::default(), source_locator);
        module.string_id_map = StringIdMap::default();
        module.string_id_map.push(name);
        module.function_map = FunctionMap::with_len(1);
        module
            .function_map
            .insert(0, CodeBlock::from_provider(id, provider.as_ref(), 0));
        module.bytecode = Some(provider);
        module
    }

    /// This module's handle in the module list.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Flags fixed at creation.
    pub fn flags(&self) -> RuntimeModuleFlags {
        self.flags
    }

    /// Current teardown discipline.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The source URL reported for this module.
    pub fn source_locator(&self) -> &SourceLocator {
        &self.source_locator
    }

    /// Replaces the source URL.
    pub fn set_source_locator(&mut self, source_locator: SourceLocator) {
        self.source_locator = source_locator;
    }

    // Initialization

    /// Imports `bytecode`'s tables and its CommonJS module tables.
    ///
    /// On failure the module is returned to its uninitialized state: the
    /// CommonJS entries it already registered are dropped from the domain
    /// and its tables are emptied, so `initialize` can be retried.
    pub fn initialize(
        &mut self,
        bytecode: Arc<dyn BytecodeProvider>,
        heap: &mut Heap,
        symbols: &mut dyn SymbolTable,
    ) -> ModuleResult<()> {
        if self.bytecode.is_some() {
            return Err(ModuleError::AlreadyInitialized(self.id));
        }
        self.initialize_without_cjs(bytecode, symbols);
        let result = cjs::import_cjs_module_table(self, heap, symbols);
        if result.is_err() {
            self.discard_bytecode(heap);
        }
        result
    }

    fn discard_bytecode(&mut self, heap: &mut Heap) {
        if let Some(domain) = self.domain(heap) {
            if let Some(domain) = heap.get_mut(domain) {
                domain.remove_cjs_modules(self.id);
            }
        }
        self.bytecode = None;
        self.string_id_map = StringIdMap::default();
        self.function_map = FunctionMap::default();
        tracing::debug!(target: "runtime_module::lifecycle", module = %self.id, "initialization rolled back");
    }

    /// Imports `bytecode`'s tables without touching CommonJS tables. Cannot
    /// fail.
    pub fn initialize_without_cjs(&mut self, bytecode: Arc<dyn BytecodeProvider>, symbols: &mut dyn SymbolTable) {
        debug_assert!(self.bytecode.is_none(), "{} is already initialized", self.id);
        self.bytecode = Some(bytecode);
        self.import_string_id_map(symbols);
        self.initialize_function_map();
        tracing::debug!(
            target: "runtime_module::lifecycle",
            module = %self.id,
            strings = self.string_id_map.len(),
            functions = self.function_map.len(),
            "module initialized"
        );
    }

    /// Finishes a lazily created module once its function has been compiled.
    ///
    /// The existing code block keeps its identity and moves to the new
    /// bytecode's global function slot.
    pub fn initialize_lazy(&mut self, bytecode: Arc<dyn BytecodeProvider>, symbols: &mut dyn SymbolTable) {
        let lazy_name = self.get_lazy_name();
        let block = self.function_map.take(0);
        self.bytecode = None;
        self.string_id_map = StringIdMap::default();
        self.function_map = FunctionMap::default();

        let global = bytecode.global_function_index();
        let name_index = bytecode.function_header(global).name;
        self.initialize_without_cjs(Arc::clone(&bytecode), symbols);

        if let Some(mut block) = block {
            block.complete_lazy(bytecode.as_ref(), global);
            let stored = self.function_map.insert(global, block).is_some();
            debug_assert!(stored, "global function {} is outside the compiled function table", global);
        }
        let name = self.get_symbol_from_string_index(name_index, symbols);
        debug_assert_eq!(name, lazy_name, "compiled function has a different name");
    }

    fn import_string_id_map(&mut self, symbols: &mut dyn SymbolTable) {
        let Some(bytecode) = self.bytecode.clone() else {
            return;
        };
        let count = bytecode.string_count();
        self.string_id_map = StringIdMap::with_len(count);
        for id in 0..count {
            match bytecode.string_kind(id) {
                StringKind::String => {}
                StringKind::Identifier { hash } => {
                    let sym = symbols.intern_or_create(bytecode.string_table_entry(id), hash);
                    self.string_id_map.set(id, sym);
                }
                StringKind::Predefined(predefined) => self.map_predefined(id, predefined, symbols),
            }
        }
    }

    fn initialize_function_map(&mut self) {
        let count = self.bytecode.as_ref().map_or(0, |bc| bc.function_count());
        self.function_map = FunctionMap::with_len(count);
    }

    /// Returns true once real (not lazy) bytecode has been imported.
    pub fn is_initialized(&self) -> bool {
        self.bytecode.as_ref().is_some_and(|bc| !bc.is_lazy())
    }

    /// The bytecode backing this module.
    pub fn bytecode(&self) -> Option<&dyn BytecodeProvider> {
        self.bytecode.as_deref()
    }

    /// A shared handle to the bytecode backing this module.
    pub fn bytecode_shared(&self) -> Option<Arc<dyn BytecodeProvider>> {
        self.bytecode.clone()
    }

    // Symbols

    /// Symbol for a string the compiler marked as an identifier.
    ///
    /// The slot must already be materialized; this is checked only in debug
    /// builds.
    #[inline]
    pub fn get_symbol_must_exist(&self, id: StringId) -> SymbolId {
        let sym = self.string_id_map.get(id);
        debug_assert!(sym.is_valid(), "symbol must exist for string {}", id);
        sym
    }

    /// Symbol for a string, interning it on first use.
    #[inline]
    pub fn get_symbol_from_string_index(&mut self, id: StringId, symbols: &mut dyn SymbolTable) -> SymbolId {
        let sym = self.string_id_map.get(id);
        if sym.is_valid() {
            return sym;
        }
        self.create_symbol_from_string_index(id, symbols)
    }

    fn create_symbol_from_string_index(&mut self, id: StringId, symbols: &mut dyn SymbolTable) -> SymbolId {
        let Some(bytecode) = &self.bytecode else {
            debug_assert!(false, "{} has no bytecode", self.id);
            return SymbolId::INVALID;
        };
        if id >= bytecode.string_count() {
            debug_assert!(false, "string {} is outside the table", id);
            return SymbolId::INVALID;
        }
        let text = bytecode.string_table_entry(id);
        let sym = symbols.intern_or_create(text, hash_string(text));
        self.string_id_map.set(id, sym);
        tracing::trace!(target: "runtime_module::symbols", cache_hit = false, string_id = id, ?sym);
        sym
    }

    /// Maps a string slot straight to a predefined symbol.
    pub fn map_predefined(&mut self, id: StringId, predefined: u32, symbols: &mut dyn SymbolTable) {
        let sym = symbols.register_predefined(predefined);
        self.string_id_map.set(id, sym);
    }

    /// Appends a slot for `text`, which need not be in the string table.
    ///
    /// The returned index is only meaningful to
    /// [`get_symbol_must_exist`](Self::get_symbol_must_exist).
    pub fn map_string(&mut self, text: &str, symbols: &mut dyn SymbolTable) -> StringId {
        let sym = symbols.intern_or_create(text, hash_string(text));
        self.string_id_map.push(sym)
    }

    /// Content of a string, materializing its symbol if needed.
    pub fn get_string_from_string_index<'s>(
        &mut self,
        id: StringId,
        symbols: &'s mut dyn SymbolTable,
    ) -> Option<&'s str> {
        let sym = self.get_symbol_from_string_index(id, &mut *symbols);
        let symbols: &'s dyn SymbolTable = symbols;
        symbols.symbol_name(sym)
    }

    /// The symbol import table.
    pub fn string_id_map(&self) -> &StringIdMap {
        &self.string_id_map
    }

    /// Compiled regexp bytecode for `regexp_id`.
    pub fn get_regexp_bytecode(&self, regexp_id: u32) -> &[u8] {
        match &self.bytecode {
            Some(bc) => bc.regexp_bytecode(regexp_id),
            None => &[],
        }
    }

    // Code blocks

    /// Number of function slots.
    pub fn num_code_blocks(&self) -> usize {
        self.function_map.len()
    }

    /// Code block for a function, materializing it on first use.
    ///
    /// Returns the same block on every call. `None` if `index` is outside the
    /// function table.
    #[inline]
    pub fn get_code_block(&mut self, index: FunctionId) -> Option<&CodeBlock> {
        if !self.function_map.is_materialized(index) {
            self.materialize_code_block(index)?;
        }
        self.function_map.get(index)
    }

    /// Code block for a function if already materialized.
    pub fn code_block(&self, index: FunctionId) -> Option<&CodeBlock> {
        self.function_map.get(index)
    }

    fn materialize_code_block(&mut self, index: FunctionId) -> Option<&CodeBlock> {
        let bytecode = self.bytecode.as_ref()?;
        if index as usize >= self.function_map.len() {
            return None;
        }
        let block = CodeBlock::from_provider(self.id, bytecode.as_ref(), index);
        tracing::trace!(target: "runtime_module::code_blocks", module = %self.id, function = index, "code block materialized");
        self.function_map.insert(index, block)
    }

    /// Materialized code blocks.
    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeBlock> + '_ {
        self.function_map.iter()
    }

    /// The single code block of a lazily created module.
    ///
    /// Only valid on a module with exactly one materialized function; checked
    /// in debug builds.
    pub fn get_only_lazy_code_block(&self) -> Option<&CodeBlock> {
        debug_assert!(
            self.function_map.len() == 1 && self.function_map.is_materialized(0),
            "{} is not a lazy module",
            self.id
        );
        self.function_map.get(0)
    }

    /// Name symbol of the single lazy function.
    pub fn get_lazy_name(&self) -> SymbolId {
        let block = self.get_only_lazy_code_block();
        block.map_or(SymbolId::INVALID, |b| self.string_id_map.get(b.name()))
    }

    // Dependencies

    /// Keeps `module` alive for as long as this module is.
    pub fn add_dependency(&mut self, module: ModuleId) {
        debug_assert_ne!(module, self.id, "a module cannot depend on itself");
        self.dependent_modules.push(module);
    }

    /// Modules kept alive by this one.
    pub fn dependent_modules(&self) -> &[ModuleId] {
        &self.dependent_modules
    }

    // Caches

    /// Cached hidden class of an object literal layout.
    pub fn find_cached_literal_hidden_class(&self, key_buffer_index: u32, num_literals: u32) -> Option<Gc<HiddenClass>> {
        self.literal_shapes.find(key_buffer_index, num_literals)
    }

    /// Caches the hidden class of an object literal layout. Layouts that do
    /// not fit the packed key are silently not cached.
    pub fn try_cache_literal_hidden_class(&mut self, key_buffer_index: u32, num_literals: u32, class: Gc<HiddenClass>) {
        self.literal_shapes.try_insert(key_buffer_index, num_literals, class);
    }

    /// Cached template object for a template id.
    pub fn find_cached_template_object(&self, template_id: u32) -> Option<Gc<JSObject>> {
        self.template_objects.find(template_id)
    }

    /// Caches the template object for a template id. Each id may be cached
    /// only once; checked in debug builds.
    pub fn cache_template_object(&mut self, template_id: u32, object: Gc<JSObject>) {
        self.template_objects.insert(template_id, object);
    }

    // GC cooperation

    /// Reports cached GC objects as strong roots.
    ///
    /// Template objects are always reported. Literal shapes are long-lived
    /// and reported only when `mark_long_lived` is set; a full collection
    /// must set it.
    pub fn mark_roots(&mut self, acceptor: &mut dyn RootAcceptor, mark_long_lived: bool) {
        self.template_objects.mark(acceptor);
        if mark_long_lived {
            self.literal_shapes.mark(acceptor);
        }
    }

    /// Reports the weak reference to the owning domain.
    pub fn mark_weak_roots(&self, acceptor: &mut dyn WeakRootAcceptor) {
        acceptor.accept_weak_ref(&self.domain);
    }

    /// Refreshes the domain reference after compaction. Does not keep the
    /// domain alive.
    pub fn mark_domain_ref(&self, gc: &mut Collector<'_>) {
        gc.mark_weak_ref(&self.domain);
    }

    /// Malloc'd memory held by this module, for heap-size accounting.
    pub fn additional_memory_size(&self) -> usize {
        self.string_id_map.memory_size()
            + self.function_map.memory_size()
            + self.dependent_modules.capacity() * std::mem::size_of::<ModuleId>()
            + self.literal_shapes.memory_size()
            + self.template_objects.memory_size()
    }

    // Domain

    /// The owning domain, or `None` once it has been collected.
    pub fn domain(&self, heap: &Heap) -> Option<Gc<Domain>> {
        heap.weak_ref_target(&self.domain)
    }

    // CommonJS

    /// Returns true if the bytecode has CommonJS modules keyed by name.
    pub fn has_cjs_modules(&self) -> bool {
        self.bytecode.as_ref().is_some_and(|bc| !bc.cjs_module_table().is_empty())
    }

    /// Returns true if the bytecode has statically resolved CommonJS modules.
    pub fn has_cjs_modules_static(&self) -> bool {
        self.bytecode
            .as_ref()
            .is_some_and(|bc| !bc.cjs_module_table_static().is_empty())
    }

    // Epilogue

    /// Returns true if the epilogue is left out of the runtime's epilogue list.
    pub fn hides_epilogue(&self) -> bool {
        self.flags.hides_epilogue
    }

    /// Trailing bytes after the bytecode.
    pub fn get_epilogue(&self) -> &[u8] {
        match &self.bytecode {
            Some(bc) => bc.epilogue(),
            None => &[],
        }
    }

    // Lifetime

    pub(crate) fn retain(&mut self) {
        self.ref_count += 1;
    }

    /// Drops one reference and returns how many remain.
    pub(crate) fn release(&mut self) -> u32 {
        debug_assert!(self.ref_count > 0, "{} released too many times", self.id);
        self.ref_count = self.ref_count.saturating_sub(1);
        self.ref_count
    }

    /// Outstanding references.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Switches the module to unconditional teardown.
    ///
    /// Later releases are ignored and the dependency list is dropped, so the
    /// shutdown sweep can free modules in any order.
    pub fn prepare_for_shutdown(&mut self) {
        self.lifecycle = Lifecycle::ShuttingDown;
        self.dependent_modules.clear();
    }

    /// Returns true once [`prepare_for_shutdown`](Self::prepare_for_shutdown) was called.
    pub fn is_shutting_down(&self) -> bool {
        self.lifecycle == Lifecycle::ShuttingDown
    }
}
