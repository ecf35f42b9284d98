use crate::error::{EmulationFault, RomLoadError};

/// Frame-stepped emulation engine bound to one cartridge image.
///
/// The playback core never looks inside the machine: it only latches input,
/// advances whole frames, and copies out the resulting picture and sound.
/// Calls are strictly sequential; an engine is never shared between callers.
pub trait Engine {
    /// Advance exactly one frame of simulated time, using the input latched by
    /// the last [`set_controller_state`](Self::set_controller_state).
    ///
    /// An error is fatal to this engine instance.
    fn advance_frame(&mut self) -> Result<(), EmulationFault>;

    /// Copy the current picture into `buffer` as RGBA8888, row-major,
    /// top-left origin.
    ///
    /// `buffer` is exactly [`FRAME_BYTES`](crate::video::FRAME_BYTES) long.
    fn read_frame_buffer(&self, buffer: &mut [u8]);

    /// Copy the last frame's mono audio into `samples`.
    ///
    /// `samples` is exactly [`SAMPLES_PER_FRAME`](crate::audio::SAMPLES_PER_FRAME) long.
    fn read_audio_chunk(&self, samples: &mut [f32]);

    /// Latch controller input for the next `advance_frame`.
    ///
    /// Buttons are in wire order: A, B, Select, Start, Left, Right, Up, Down.
    fn set_controller_state(&mut self, buttons: [bool; 8]);
}

/// Builds engines from raw cartridge images.
pub trait EngineFactory {
    fn construct(&mut self, rom: &[u8]) -> Result<Box<dyn Engine>, RomLoadError>;
}

impl<F> EngineFactory for F
where
    F: FnMut(&[u8]) -> Result<Box<dyn Engine>, RomLoadError>,
{
    fn construct(&mut self, rom: &[u8]) -> Result<Box<dyn Engine>, RomLoadError> {
        self(rom)
    }
}
