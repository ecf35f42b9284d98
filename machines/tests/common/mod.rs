#![allow(dead_code)]

use nesplay_machines::rom_loader::{CHR_BANK_SIZE, INES_MAGIC, PRG_BANK_SIZE};

/// Build an iNES image with the given bank counts and flag bytes.
///
/// PRG bytes are 0xEA (NOP); CHR bytes are filled by `chr_fill(offset)`.
pub fn ines_image(
    prg_banks: u8,
    chr_banks: u8,
    flags6: u8,
    flags7: u8,
    chr_fill: impl Fn(usize) -> u8,
) -> Vec<u8> {
    let mut data = INES_MAGIC.to_vec();
    data.extend_from_slice(&[prg_banks, chr_banks, flags6, flags7]);
    data.resize(16, 0);
    data.extend(std::iter::repeat_n(0xEA, prg_banks as usize * PRG_BANK_SIZE));
    data.extend((0..chr_banks as usize * CHR_BANK_SIZE).map(chr_fill));
    data
}

/// One PRG bank, `chr_banks` CHR banks of zeros, NROM, horizontal mirroring.
pub fn nrom(chr_banks: u8) -> Vec<u8> {
    ines_image(1, chr_banks, 0, 0, |_| 0)
}
