//! Cartridge path resolution: a bare `.nes` image, or a ZIP archive that
//! contains one.

use nesplay_core::error::RomLoadError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

fn has_extension(name: &Path, ext: &str) -> bool {
    name.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Read the cartridge image at `path`.
///
/// ZIP archives yield their first `.nes` entry (in archive order). Any other
/// file is returned as-is and left to the engine to validate.
pub fn load_rom(path: &Path) -> Result<Vec<u8>, RomLoadError> {
    if has_extension(path, "zip") {
        return load_from_zip(path);
    }
    Ok(std::fs::read(path)?)
}

fn invalid_zip(e: zip::result::ZipError) -> RomLoadError {
    RomLoadError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid ZIP: {e}"),
    ))
}

fn load_from_zip(path: &Path) -> Result<Vec<u8>, RomLoadError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(invalid_zip)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(invalid_zip)?;
        if entry.is_dir() || !has_extension(Path::new(entry.name()), "nes") {
            continue;
        }

        tracing::debug!("Using {} from {}", entry.name(), path.display());
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        return Ok(data);
    }

    Err(RomLoadError::UnsupportedFormat(format!(
        "no .nes file in {}",
        path.display()
    )))
}
