pub mod pattern_viewer;
pub mod registry;
pub mod rom_loader;

pub use pattern_viewer::PatternViewer;
pub use rom_loader::Cartridge;
