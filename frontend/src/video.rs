use nesplay_core::video::{FRAME_HEIGHT, FRAME_WIDTH, FrameBuffer, VideoSink};
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};

use crate::error::FrontendError;
use crate::overlay;

/// Window surface for finished frames.
pub struct SdlVideo {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    /// Frame-rate readout, drawn into a copy of each frame when set.
    fps_text: Option<String>,
    scratch: FrameBuffer,
}

impl SdlVideo {
    /// Create a window at `scale` times the native resolution, with VSync.
    pub fn new(sdl_video: &sdl2::VideoSubsystem, title: &str, scale: u32) -> Result<Self, FrontendError> {
        let window = sdl_video
            .window(title, FRAME_WIDTH as u32 * scale, FRAME_HEIGHT as u32 * scale)
            .position_centered()
            .build()
            .map_err(FrontendError::sdl)?;

        let canvas = window
            .into_canvas()
            .accelerated()
            .present_vsync()
            .build()
            .map_err(FrontendError::sdl)?;

        let texture_creator = canvas.texture_creator();

        Ok(Self {
            canvas,
            texture_creator,
            fps_text: None,
            scratch: FrameBuffer::new(),
        })
    }

    pub fn set_title(&mut self, title: &str) {
        if let Err(e) = self.canvas.window_mut().set_title(title) {
            tracing::warn!("Failed to set window title: {}", e);
        }
    }

    pub fn set_fps_text(&mut self, text: Option<String>) {
        self.fps_text = text;
    }

    fn upload(&mut self, frame: &FrameBuffer) -> Result<(), String> {
        let pixels = match &self.fps_text {
            Some(text) => {
                self.scratch.as_bytes_mut().copy_from_slice(frame.as_bytes());
                overlay::draw_text(&mut self.scratch, text);
                self.scratch.as_bytes()
            }
            None => frame.as_bytes(),
        };

        // ABGR8888 is R, G, B, A in memory on little-endian hosts
        let mut texture = self
            .texture_creator
            .create_texture_streaming(
                PixelFormatEnum::ABGR8888,
                FRAME_WIDTH as u32,
                FRAME_HEIGHT as u32,
            )
            .map_err(|e| e.to_string())?;
        texture
            .update(None, pixels, FrameBuffer::pitch())
            .map_err(|e| e.to_string())?;

        self.canvas.clear();
        self.canvas.copy(&texture, None, None)?;
        self.canvas.present();
        Ok(())
    }
}

impl VideoSink for SdlVideo {
    fn present(&mut self, frame: &FrameBuffer) {
        if let Err(e) = self.upload(frame) {
            tracing::warn!("Dropped frame: {}", e);
        }
    }
}
