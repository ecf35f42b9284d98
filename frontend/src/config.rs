//! Command line and config file settings.
//!
//! Precedence: command line, then `config.toml`, then built-in defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::FrontendError;

pub const DEFAULT_ENGINE: &str = "pattern-viewer";
pub const DEFAULT_SCALE: u32 = 3;

#[derive(Debug, Parser)]
#[command(name = "nesplay", version, about = "Real-time NES cartridge player")]
pub struct Cli {
    /// Cartridge image (.nes, or a .zip containing one). Files can also be
    /// dropped onto the window.
    pub rom: Option<PathBuf>,

    /// Engine to run the cartridge with.
    #[arg(long, default_value = DEFAULT_ENGINE)]
    pub engine: String,

    /// Integer window scale.
    #[arg(long)]
    pub scale: Option<u32>,

    /// Load the cartridge paused instead of running it.
    #[arg(long)]
    pub paused: bool,

    /// Draw the frame rate into the picture.
    #[arg(long)]
    pub show_fps: bool,

    /// Also write the audio timeline to a WAV file.
    #[arg(long, value_name = "FILE")]
    pub audio_output: Option<PathBuf>,

    /// Config file to use instead of the per-user one.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the available engines and exit.
    #[arg(long)]
    pub list_engines: bool,
}

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub scale: Option<u32>,
    pub auto_start: Option<bool>,
    pub show_fps: Option<bool>,
    /// Button name to SDL scancode name, e.g. `a = "Z"`.
    pub keys: BTreeMap<String, String>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read the config at `explicit`, or the per-user config if none was
    /// given. Only an explicitly named file has to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, FrontendError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(FrontendError::ConfigIo { path, source }),
        };

        let config =
            Self::parse(&text).map_err(|source| FrontendError::ConfigParse {
                path: path.clone(),
                source,
            })?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// `<config dir>/nesplay/config.toml`, where the platform has one.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nesplay").join("config.toml"))
}

/// Effective settings after layering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub engine: String,
    pub rom: Option<PathBuf>,
    pub scale: u32,
    pub auto_start: bool,
    pub show_fps: bool,
    pub audio_output: Option<PathBuf>,
    pub keys: BTreeMap<String, String>,
}

impl Settings {
    pub fn resolve(cli: Cli, file: FileConfig) -> Self {
        Self {
            engine: cli.engine,
            rom: cli.rom,
            scale: cli.scale.or(file.scale).unwrap_or(DEFAULT_SCALE).max(1),
            auto_start: !cli.paused && file.auto_start.unwrap_or(true),
            show_fps: cli.show_fps || file.show_fps.unwrap_or(false),
            audio_output: cli.audio_output,
            keys: file.keys,
        }
    }
}
