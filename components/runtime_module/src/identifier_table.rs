//! The runtime-wide identifier table.
//!
//! Maps string content to interned [`SymbolId`]s. The first symbols are the
//! predefined names, in [`Predefined`] order, so a predefined name can be
//! registered by index without hashing.

use rustc_hash::FxHashMap;

use core_types::SymbolId;

/// The symbol-table interface runtime modules consume.
pub trait SymbolTable {
    /// Returns the symbol for `text`, creating it if needed. `hash` must be
    /// [`bytecode_system::hash_string`] of `text`.
    fn intern_or_create(&mut self, text: &str, hash: u32) -> SymbolId;

    /// Returns the symbol of a predefined name.
    fn register_predefined(&mut self, predefined: u32) -> SymbolId;

    /// Content of an interned symbol.
    fn symbol_name(&self, symbol: SymbolId) -> Option<&str>;
}

macro_rules! predefined_names {
    ($($variant:ident => $text:literal,)*) => {
        /// Names every runtime knows before any module is loaded.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum Predefined {
            $(
                #[doc = concat!("`\"", $text, "\"`")]
                $variant,
            )*
        }

        impl Predefined {
            /// All predefined names in symbol order.
            pub const ALL: &'static [Predefined] = &[$(Predefined::$variant,)*];

            /// The name's text.
            pub fn text(self) -> &'static str {
                match self {
                    $(Predefined::$variant => $text,)*
                }
            }
        }
    };
}

predefined_names! {
    EmptyString => "",
    Length => "length",
    Prototype => "prototype",
    Constructor => "constructor",
    Name => "name",
    Message => "message",
    Arguments => "arguments",
    Default => "default",
    Exports => "exports",
    Module => "module",
    Require => "require",
    ToString => "toString",
    ValueOf => "valueOf",
    Raw => "raw",
}

impl Predefined {
    /// Looks up a predefined name by index.
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// The symbol reserved for this name.
    pub fn symbol(self) -> SymbolId {
        SymbolId::from_raw(self as u32)
    }
}

/// Call counters, for checking that cached paths stay cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentifierStats {
    /// Calls to [`SymbolTable::intern_or_create`]
    pub intern_calls: usize,
    /// Symbols created by interning new content
    pub symbols_created: usize,
    /// Calls to [`SymbolTable::register_predefined`]
    pub predefined_lookups: usize,
}

/// Hash-bucketed identifier table.
///
/// # Example
///
/// ```
/// use runtime_module::{IdentifierTable, Predefined, SymbolTable};
///
/// let mut table = IdentifierTable::new();
/// let foo = table.intern("foo");
/// assert_eq!(table.intern("foo"), foo);
/// assert_eq!(table.intern("length"), Predefined::Length.symbol());
/// assert_eq!(table.symbol_name(foo), Some("foo"));
/// ```
#[derive(Debug)]
pub struct IdentifierTable {
    names: Vec<Box<str>>,
    buckets: FxHashMap<u32, Vec<SymbolId>>,
    stats: IdentifierStats,
}

impl IdentifierTable {
    /// Creates a table holding only the predefined names.
    pub fn new() -> Self {
        Self::with_capacity(Predefined::ALL.len())
    }

    /// Creates a table with room for `capacity` identifiers.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut table = IdentifierTable {
            names: Vec::with_capacity(capacity.max(Predefined::ALL.len())),
            buckets: FxHashMap::default(),
            stats: IdentifierStats::default(),
        };
        for predefined in Predefined::ALL {
            let text = predefined.text();
            table.insert(text, bytecode_system::hash_string(text));
        }
        table
    }

    /// Interns `text`, computing its hash.
    pub fn intern(&mut self, text: &str) -> SymbolId {
        self.intern_or_create(text, bytecode_system::hash_string(text))
    }

    /// Looks up `text` without creating a symbol.
    pub fn lookup(&self, text: &str) -> Option<SymbolId> {
        self.find(text, bytecode_system::hash_string(text))
    }

    /// Number of interned symbols, predefined ones included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false; the predefined names are present from creation.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Call counters since creation or the last [`reset_stats`](Self::reset_stats).
    pub fn stats(&self) -> IdentifierStats {
        self.stats
    }

    /// Clears the call counters.
    pub fn reset_stats(&mut self) {
        self.stats = IdentifierStats::default();
    }

    fn find(&self, text: &str, hash: u32) -> Option<SymbolId> {
        self.buckets.get(&hash).and_then(|bucket| {
            bucket
                .iter()
                .copied()
                .find(|sym| self.names.get(sym.raw() as usize).map(|n| &**n) == Some(text))
        })
    }

    fn insert(&mut self, text: &str, hash: u32) -> SymbolId {
        let sym = SymbolId::from_raw(self.names.len() as u32);
        self.names.push(text.into());
        self.buckets.entry(hash).or_default().push(sym);
        sym
    }
}

impl Default for IdentifierTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable for IdentifierTable {
    fn intern_or_create(&mut self, text: &str, hash: u32) -> SymbolId {
        debug_assert_eq!(hash, bytecode_system::hash_string(text), "hash mismatch for {:?}", text);
        self.stats.intern_calls += 1;
        if let Some(sym) = self.find(text, hash) {
            return sym;
        }
        self.stats.symbols_created += 1;
        self.insert(text, hash)
    }

    fn register_predefined(&mut self, predefined: u32) -> SymbolId {
        self.stats.predefined_lookups += 1;
        match Predefined::from_index(predefined) {
            Some(p) => p.symbol(),
            None => {
                debug_assert!(false, "unknown predefined name {}", predefined);
                SymbolId::INVALID
            }
        }
    }

    fn symbol_name(&self, symbol: SymbolId) -> Option<&str> {
        self.names.get(symbol.raw() as usize).map(|name| &**name)
    }
}
