use std::path::PathBuf;

use nesplay_core::error::RomLoadError;

/// Failures that stop the front end before or while it starts up.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("unknown engine '{name}' (available: {available})")]
    UnknownEngine { name: String, available: String },
    #[error("SDL: {0}")]
    Sdl(String),
    #[error("reading {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("key binding: {0}")]
    Binding(String),
    #[error(transparent)]
    Rom(#[from] RomLoadError),
    #[error("audio capture: {0}")]
    Capture(#[from] hound::Error),
}

impl FrontendError {
    pub fn sdl(err: impl std::fmt::Display) -> Self {
        Self::Sdl(err.to_string())
    }
}
