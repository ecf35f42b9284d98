//! iNES cartridge image parsing.
//!
//! Validates the 16-byte header and slices the image into PRG and CHR
//! data. Anything an engine could not run (bad magic, truncated banks,
//! mappers we do not implement) is rejected here, before an engine is
//! constructed, so a bad file never disturbs a running session.

use nesplay_core::error::RomLoadError;

/// iNES magic: "NES" followed by MS-DOS end-of-file.
pub const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];
pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
/// PRG ROM bank size (header byte 4 counts these).
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR ROM bank size (header byte 5 counts these).
pub const CHR_BANK_SIZE: usize = 8 * 1024;

/// Mappers the engines in this workspace know how to run.
pub const SUPPORTED_MAPPERS: [u8; 3] = [0, 1, 4];

// ---------------------------------------------------------------------------
// CRC-32 (private)
// ---------------------------------------------------------------------------

/// CRC-32 lookup table (reflected polynomial 0xEDB88320).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

/// Running CRC-32 over several slices, as if they were concatenated.
fn crc32_chain(parts: &[&[u8]]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for part in parts {
        for &byte in *part {
            let index = ((crc ^ byte as u32) & 0xFF) as usize;
            crc = (crc >> 8) ^ CRC32_TABLE[index];
        }
    }
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// Cartridge
// ---------------------------------------------------------------------------

/// Nametable arrangement wired on the cartridge board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// A validated cartridge image.
#[derive(Clone, Debug)]
pub struct Cartridge {
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    /// Battery-backed PRG RAM present (flags6 bit 1).
    pub battery: bool,
    /// Header uses the NES 2.0 layout. Extended fields are not interpreted.
    pub nes2: bool,
    pub prg_rom: Vec<u8>,
    /// CHR ROM, or 8 KiB of zeroed CHR RAM when the header declares none.
    pub chr: Vec<u8>,
    pub chr_is_ram: bool,
}

impl Cartridge {
    /// Parse and validate an iNES image.
    pub fn parse(data: &[u8]) -> Result<Self, RomLoadError> {
        if data.len() < HEADER_SIZE {
            return Err(RomLoadError::Truncated {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }
        if data[0..4] != INES_MAGIC {
            return Err(RomLoadError::BadMagic);
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];

        if prg_banks == 0 {
            return Err(RomLoadError::UnsupportedFormat(
                "header declares no PRG ROM".to_string(),
            ));
        }

        let mapper_id = (flags7 & 0xF0) | (flags6 >> 4);
        if !SUPPORTED_MAPPERS.contains(&mapper_id) {
            return Err(RomLoadError::UnsupportedMapper(mapper_id));
        }

        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let trainer = if flags6 & 0x04 != 0 { TRAINER_SIZE } else { 0 };
        let prg_start = HEADER_SIZE + trainer;
        let chr_start = prg_start + prg_banks * PRG_BANK_SIZE;
        let end = chr_start + chr_banks * CHR_BANK_SIZE;
        if data.len() < end {
            return Err(RomLoadError::Truncated {
                expected: end,
                actual: data.len(),
            });
        }

        let chr_is_ram = chr_banks == 0;
        let chr = if chr_is_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            data[chr_start..end].to_vec()
        };

        Ok(Self {
            mapper_id,
            mirroring,
            battery: flags6 & 0x02 != 0,
            nes2: flags7 & 0x0C == 0x08,
            prg_rom: data[prg_start..chr_start].to_vec(),
            chr,
            chr_is_ram,
        })
    }

    /// Conventional mapper name, for logs and window titles.
    pub fn mapper_name(&self) -> &'static str {
        match self.mapper_id {
            0 => "NROM",
            1 => "MMC1",
            4 => "MMC3",
            _ => "unknown",
        }
    }

    /// CRC-32 of PRG followed by CHR ROM; identifies the game regardless of
    /// header variations.
    pub fn crc32(&self) -> u32 {
        if self.chr_is_ram {
            crc32_chain(&[self.prg_rom.as_slice()])
        } else {
            crc32_chain(&[self.prg_rom.as_slice(), self.chr.as_slice()])
        }
    }

    /// Number of 8 KiB CHR banks (at least one, counting CHR RAM).
    pub fn chr_banks(&self) -> usize {
        self.chr.len() / CHR_BANK_SIZE
    }
}
