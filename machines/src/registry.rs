//! Engine registry for automatic front-end discovery.
//!
//! Each engine self-registers via [`inventory::submit!`] with an
//! [`EngineEntry`] containing its CLI name and a factory function. The
//! front-end discovers available engines at runtime without any central list.

use nesplay_core::engine::{Engine, EngineFactory};
use nesplay_core::error::RomLoadError;

/// Factory signature: build an engine from a raw cartridge image.
pub type CreateEngine = fn(&[u8]) -> Result<Box<dyn Engine>, RomLoadError>;

/// Describes a front-end-capable engine.
pub struct EngineEntry {
    /// CLI name used to select this engine (e.g., "pattern-viewer").
    pub name: &'static str,
    /// One-line summary for `--list-engines`.
    pub description: &'static str,
    pub create: CreateEngine,
}

impl EngineEntry {
    pub const fn new(name: &'static str, description: &'static str, create: CreateEngine) -> Self {
        Self {
            name,
            description,
            create,
        }
    }

    /// A boxed factory suitable for handing to the playback controller.
    pub fn factory(&self) -> Box<dyn EngineFactory> {
        Box::new(self.create)
    }
}

inventory::collect!(EngineEntry);

/// Return all registered engines, sorted by name.
pub fn all() -> Vec<&'static EngineEntry> {
    let mut entries: Vec<_> = inventory::iter::<EngineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up an engine by its CLI name.
pub fn find(name: &str) -> Option<&'static EngineEntry> {
    inventory::iter::<EngineEntry>
        .into_iter()
        .find(|e| e.name == name)
}
