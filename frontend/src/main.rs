use std::process::ExitCode;

use clap::Parser;
use nesplay_machines::registry;

mod audio;
mod capture;
mod config;
mod emulator;
mod error;
mod input;
mod overlay;
mod rom_path;
mod video;

use config::{Cli, FileConfig, Settings};
use error::FrontendError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.list_engines {
        for entry in registry::all() {
            println!("{:<16} {}", entry.name, entry.description);
        }
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FrontendError> {
    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(cli, file);

    let entry = registry::find(&settings.engine).ok_or_else(|| {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        FrontendError::UnknownEngine {
            name: settings.engine.clone(),
            available: names.join(", "),
        }
    })?;
    let key_map = input::key_map(&settings.keys)?;

    tracing::info!(
        "Engine {}, scale {}x, {}",
        entry.name,
        settings.scale,
        if settings.auto_start { "auto-start" } else { "start paused" }
    );
    emulator::run(&settings, entry, key_map)
}
