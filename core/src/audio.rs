//! Per-frame audio chunks and their contiguous scheduling.
//!
//! Every produced frame yields one [`AudioChunk`] of exactly
//! [`SAMPLES_PER_FRAME`] mono samples. The [`AudioPacer`] assigns each chunk
//! a start time on the output timeline so that consecutive chunks play
//! back-to-back: a chunk never starts before the previous one ends, and never
//! later either, unless production fell behind real time. In that case the
//! pacer jumps forward to "now" instead of accumulating latency.

use std::time::Duration;

use crate::timing::{FRAME_RATE, samples_to_duration};

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Mono samples produced per frame (800 at 48 kHz / 60 Hz).
pub const SAMPLES_PER_FRAME: usize = (SAMPLE_RATE / FRAME_RATE) as usize;

/// One frame's worth of mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    samples: Vec<f32>,
}

impl AudioChunk {
    pub fn silent() -> Self {
        Self {
            samples: vec![0.0; SAMPLES_PER_FRAME],
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Playback duration of a chunk at [`SAMPLE_RATE`].
    pub const fn duration() -> Duration {
        samples_to_duration(SAMPLES_PER_FRAME, SAMPLE_RATE)
    }
}

impl Default for AudioChunk {
    fn default() -> Self {
        Self::silent()
    }
}

/// Destination for scheduled audio chunks.
pub trait AudioSink {
    /// Play `chunk` starting at `start` on the playback timeline.
    ///
    /// Starts handed out by [`AudioPacer`] are non-decreasing and never
    /// overlap the previous chunk.
    fn schedule(&mut self, chunk: AudioChunk, start: Duration);
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn schedule(&mut self, chunk: AudioChunk, start: Duration) {
        (**self).schedule(chunk, start);
    }
}

/// Where a chunk landed on the output timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledChunk {
    pub start: Duration,
    pub end: Duration,
    /// How far behind real time production was when this chunk arrived.
    /// Non-zero means the pacer resynchronized and a gap will be audible.
    pub late_by: Duration,
}

impl ScheduledChunk {
    pub fn resynced(&self) -> bool {
        !self.late_by.is_zero()
    }
}

/// Chains audio chunks end-to-start.
#[derive(Debug, Clone, Default)]
pub struct AudioPacer {
    next_start: Option<Duration>,
    resyncs: u64,
}

impl AudioPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `chunk` on `sink` no earlier than `now` and no earlier than
    /// the end of the previous chunk.
    pub fn schedule<S: AudioSink + ?Sized>(
        &mut self,
        now: Duration,
        chunk: AudioChunk,
        sink: &mut S,
    ) -> ScheduledChunk {
        // First chunk of a session starts immediately
        let next_start = self.next_start.unwrap_or(now);

        let late_by = now.saturating_sub(next_start);
        if !late_by.is_zero() {
            self.resyncs += 1;
            tracing::debug!("Audio behind by {:?}, resynchronizing", late_by);
        }

        let start = next_start.max(now);
        let end = start + AudioChunk::duration();
        sink.schedule(chunk, start);
        self.next_start = Some(end);

        ScheduledChunk {
            start,
            end,
            late_by,
        }
    }

    /// Forget the timeline; the next chunk starts at "now".
    pub fn reset(&mut self) {
        self.next_start = None;
    }

    /// End of the last scheduled chunk, if any.
    pub fn next_start(&self) -> Option<Duration> {
        self.next_start
    }

    /// Number of times production fell behind and the timeline jumped.
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }
}
