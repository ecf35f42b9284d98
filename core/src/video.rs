/// Native display width in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Native display height in pixels.
pub const FRAME_HEIGHT: usize = 240;
/// Bytes per pixel (R, G, B, A).
pub const FRAME_DEPTH: usize = 4;
/// Total size of one frame in bytes.
pub const FRAME_BYTES: usize = FRAME_WIDTH * FRAME_HEIGHT * FRAME_DEPTH;

/// Fixed 256x240 RGBA8888 pixel buffer, row-major, top-left origin.
///
/// Allocated once and refilled in place by the engine every frame.
pub struct FrameBuffer {
    pixels: Box<[u8]>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0u8; FRAME_BYTES].into_boxed_slice(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// RGBA value of the pixel at (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * FRAME_WIDTH + x) * FRAME_DEPTH;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + FRAME_DEPTH]);
        rgba
    }

    /// Bytes per row, for texture uploads.
    pub const fn pitch() -> usize {
        FRAME_WIDTH * FRAME_DEPTH
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &FRAME_WIDTH)
            .field("height", &FRAME_HEIGHT)
            .finish()
    }
}

/// Destination for finished frames (a window surface, a test recorder...).
pub trait VideoSink {
    fn present(&mut self, frame: &FrameBuffer);
}

impl<S: VideoSink + ?Sized> VideoSink for Box<S> {
    fn present(&mut self, frame: &FrameBuffer) {
        (**self).present(frame);
    }
}
