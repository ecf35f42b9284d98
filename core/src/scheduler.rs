use std::time::Duration;

use crate::audio::{AudioChunk, AudioPacer, AudioSink, ScheduledChunk};
use crate::engine::Engine;
use crate::error::EmulationFault;
use crate::input::ControllerState;
use crate::timing::Clock;
use crate::video::{FrameBuffer, VideoSink};

/// Result of one produced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Sequence number of this frame (1-based, counted over the scheduler's
    /// lifetime).
    pub frame: u64,
    /// Where the frame's audio chunk was placed.
    pub audio: ScheduledChunk,
    /// Wall-clock time spent on input, engine step, buffer copy and audio
    /// scheduling. Excludes `present_time`.
    pub tick_time: Duration,
    /// Time the video sink held the frame, e.g. waiting for vblank.
    pub present_time: Duration,
}

/// Cooperative frame driver.
///
/// The host owns the periodic callback (a vsync loop, a timer, an animation
/// frame request); the scheduler owns the decision of whether the next
/// callback is wanted. At most one callback registration is outstanding at a
/// time, so a frame can never be produced twice for one request.
pub struct FrameScheduler<V, A, C> {
    video: V,
    audio: A,
    clock: C,
    pacer: AudioPacer,
    frame: FrameBuffer,
    tick_requested: bool,
    frames: u64,
}

impl<V: VideoSink, A: AudioSink, C: Clock> FrameScheduler<V, A, C> {
    pub fn new(video: V, audio: A, clock: C) -> Self {
        Self {
            video,
            audio,
            clock,
            pacer: AudioPacer::new(),
            frame: FrameBuffer::new(),
            tick_requested: false,
            frames: 0,
        }
    }

    /// Register interest in the next host callback.
    ///
    /// Returns `false` if a callback was already requested; requests never
    /// stack.
    pub fn request_tick(&mut self) -> bool {
        !std::mem::replace(&mut self.tick_requested, true)
    }

    /// Drop an outstanding request, if any.
    pub fn cancel_tick(&mut self) {
        self.tick_requested = false;
    }

    /// Whether the host should invoke the next callback.
    pub fn is_tick_requested(&self) -> bool {
        self.tick_requested
    }

    /// Consume the outstanding request. Returns `false` for a spurious
    /// callback that nobody asked for.
    pub(crate) fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.tick_requested)
    }

    /// Produce exactly one frame from `engine`.
    ///
    /// Input is latched before the step; the picture and sound are read
    /// after it and handed to the sinks. A fault aborts the frame before
    /// anything reaches the sinks.
    pub fn run_frame(
        &mut self,
        engine: &mut dyn Engine,
        input: ControllerState,
    ) -> Result<FrameReport, EmulationFault> {
        let started = self.clock.now();

        engine.set_controller_state(input.to_ordered());
        engine.advance_frame()?;

        engine.read_frame_buffer(self.frame.as_bytes_mut());
        let mut chunk = AudioChunk::silent();
        engine.read_audio_chunk(chunk.samples_mut());

        // present() may block on vblank; that wait is not tick work
        let rendered = self.clock.now();
        self.video.present(&self.frame);
        let now = self.clock.now();
        let audio = self.pacer.schedule(now, chunk, &mut self.audio);
        let finished = self.clock.now();

        self.frames += 1;
        Ok(FrameReport {
            frame: self.frames,
            audio,
            tick_time: rendered.saturating_sub(started) + finished.saturating_sub(now),
            present_time: now.saturating_sub(rendered),
        })
    }

    /// Start a fresh audio timeline (new cartridge, new session).
    pub fn reset_audio(&mut self) {
        self.pacer.reset();
    }

    /// Total frames produced.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The most recently produced picture.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn pacer(&self) -> &AudioPacer {
        &self.pacer
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
