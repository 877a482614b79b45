//! Per-module flags.

use serde::{Deserialize, Serialize};

/// Flags fixed when a runtime module is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeModuleFlags {
    /// Never destroyed by reference counting, only at shutdown.
    ///
    /// Lazily created symbols may point into the string storage of the
    /// persistent module, so only the first and largest module loaded into a
    /// runtime should set this.
    pub persistent: bool,
    /// Leave this module's epilogue out of [`Runtime::get_epilogues`](crate::Runtime::get_epilogues).
    pub hides_epilogue: bool,
}

impl RuntimeModuleFlags {
    /// Flags for the runtime's persistent module.
    pub fn persistent() -> Self {
        RuntimeModuleFlags {
            persistent: true,
            ..Self::default()
        }
    }
}
