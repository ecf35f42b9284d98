//! Pattern-table viewer: a minimal engine that shows a cartridge's CHR tiles.
//!
//! Useful for checking a cartridge image and the whole playback path
//! (input, frame pacing, audio) without a full machine.
//!
//! Controls: Up/Down scroll, Left/Right jump one CHR bank, Select cycles
//! the palette, A holds a test tone.

use nesplay_core::audio::{SAMPLE_RATE, SAMPLES_PER_FRAME};
use nesplay_core::engine::Engine;
use nesplay_core::error::{EmulationFault, RomLoadError};
use nesplay_core::input::ControllerState;
use nesplay_core::video::{FRAME_BYTES, FRAME_DEPTH, FRAME_HEIGHT, FRAME_WIDTH};

use crate::registry::EngineEntry;
use crate::rom_loader::{CHR_BANK_SIZE, Cartridge};

const TILE_BYTES: usize = 16;
const TILES_PER_ROW: usize = 16;
/// One 4 KiB pattern table rendered as 16x16 tiles of 8x8 pixels.
const TABLE_SIZE_PX: usize = TILES_PER_ROW * 8;
/// Both pattern tables of a bank sit side by side, so a bank is this tall.
pub const BANK_HEIGHT_PX: usize = TABLE_SIZE_PX;
/// Rows scrolled per frame while Up or Down is held.
const SCROLL_SPEED: usize = 2;

const TONE_HZ: f32 = 440.0;
const TONE_AMPLITUDE: f32 = 0.1;

/// Four-colour palettes indexed by 2-bit pixel value.
const PALETTES: [[[u8; 3]; 4]; 3] = [
    // Greyscale
    [[0, 0, 0], [85, 85, 85], [170, 170, 170], [255, 255, 255]],
    // Green phosphor
    [[8, 24, 8], [48, 98, 48], [139, 172, 15], [200, 240, 120]],
    // Warm
    [[20, 12, 28], [133, 76, 48], [210, 125, 44], [255, 230, 170]],
];

pub struct PatternViewer {
    cart: Cartridge,
    input: ControllerState,
    previous: ControllerState,
    scroll: usize,
    palette: usize,
    phase: f32,
    frame: u64,
    pixels: Vec<u8>,
    audio: Vec<f32>,
}

impl PatternViewer {
    pub fn new(cart: Cartridge) -> Self {
        let mut viewer = Self {
            cart,
            input: ControllerState::default(),
            previous: ControllerState::default(),
            scroll: 0,
            palette: 0,
            phase: 0.0,
            frame: 0,
            pixels: vec![0; FRAME_BYTES],
            audio: vec![0.0; SAMPLES_PER_FRAME],
        };
        viewer.render();
        viewer
    }

    pub fn from_rom(rom: &[u8]) -> Result<Self, RomLoadError> {
        let cart = Cartridge::parse(rom)?;
        tracing::info!(
            "Pattern viewer: mapper {} ({}), {} CHR bank(s){}, crc32 {:08X}",
            cart.mapper_id,
            cart.mapper_name(),
            cart.chr_banks(),
            if cart.chr_is_ram { " of RAM" } else { "" },
            cart.crc32()
        );
        Ok(Self::new(cart))
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    /// Top row of the view within the stacked banks.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn palette(&self) -> usize {
        self.palette
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    fn max_scroll(&self) -> usize {
        (self.cart.chr_banks() * BANK_HEIGHT_PX).saturating_sub(FRAME_HEIGHT)
    }

    fn pressed(&self, f: fn(&ControllerState) -> bool) -> bool {
        f(&self.input) && !f(&self.previous)
    }

    fn apply_input(&mut self) {
        if self.input.down {
            self.scroll += SCROLL_SPEED;
        }
        if self.input.up {
            self.scroll = self.scroll.saturating_sub(SCROLL_SPEED);
        }
        if self.pressed(|s| s.right) {
            self.scroll += BANK_HEIGHT_PX;
        }
        if self.pressed(|s| s.left) {
            self.scroll = self.scroll.saturating_sub(BANK_HEIGHT_PX);
        }
        self.scroll = self.scroll.min(self.max_scroll());

        if self.pressed(|s| s.select) {
            self.palette = (self.palette + 1) % PALETTES.len();
        }
        self.previous = self.input;
    }

    /// 2-bit colour index of pixel (x, y) in the stacked bank view.
    fn tile_pixel(&self, x: usize, y: usize) -> Option<usize> {
        let bank = y / BANK_HEIGHT_PX;
        if bank >= self.cart.chr_banks() {
            return None;
        }
        let table = x / TABLE_SIZE_PX;
        let (tx, ty) = ((x % TABLE_SIZE_PX) / 8, (y % BANK_HEIGHT_PX) / 8);
        let tile = ty * TILES_PER_ROW + tx;
        let base = bank * CHR_BANK_SIZE + table * (CHR_BANK_SIZE / 2) + tile * TILE_BYTES;

        let row = y % 8;
        let bit = 7 - (x % 8);
        let lo = (self.cart.chr[base + row] >> bit) & 1;
        let hi = (self.cart.chr[base + row + 8] >> bit) & 1;
        Some(((hi << 1) | lo) as usize)
    }

    fn render(&mut self) {
        let palette = &PALETTES[self.palette];
        for y in 0..FRAME_HEIGHT {
            for x in 0..FRAME_WIDTH {
                let rgb = match self.tile_pixel(x, y + self.scroll) {
                    Some(index) => palette[index],
                    None => [0, 0, 0],
                };
                let offset = (y * FRAME_WIDTH + x) * FRAME_DEPTH;
                self.pixels[offset..offset + 3].copy_from_slice(&rgb);
                self.pixels[offset + 3] = 255;
            }
        }
    }

    fn synthesize(&mut self) {
        let step = TONE_HZ / SAMPLE_RATE as f32;
        let on = self.input.a;
        for sample in self.audio.iter_mut() {
            *sample = if !on {
                0.0
            } else if self.phase < 0.5 {
                TONE_AMPLITUDE
            } else {
                -TONE_AMPLITUDE
            };
            // Phase keeps running while silent so the tone resumes cleanly
            self.phase = (self.phase + step).fract();
        }
    }
}

impl Engine for PatternViewer {
    fn advance_frame(&mut self) -> Result<(), EmulationFault> {
        self.apply_input();
        self.render();
        self.synthesize();
        self.frame += 1;
        Ok(())
    }

    fn read_frame_buffer(&self, buffer: &mut [u8]) {
        buffer.copy_from_slice(&self.pixels);
    }

    fn read_audio_chunk(&self, samples: &mut [f32]) {
        samples.copy_from_slice(&self.audio);
    }

    fn set_controller_state(&mut self, buttons: [bool; 8]) {
        self.input = ControllerState::from_ordered(buttons);
    }
}

fn create_engine(rom: &[u8]) -> Result<Box<dyn Engine>, RomLoadError> {
    Ok(Box::new(PatternViewer::from_rom(rom)?))
}

inventory::submit! {
    EngineEntry::new(
        "pattern-viewer",
        "Browse a cartridge's CHR tiles (no CPU emulation)",
        create_engine,
    )
}
