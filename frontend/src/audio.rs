use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nesplay_core::audio::{AudioChunk, AudioSink, SAMPLE_RATE};
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

use crate::error::FrontendError;

/// Number of samples over which to fade in/out (~5.3 ms at 48 kHz).
const FADE_SAMPLES: u32 = 256;

/// Shared sample queue. The host loop pushes scheduled chunks in;
/// the SDL audio callback thread pops them out.
pub type AudioRing = Arc<Mutex<VecDeque<f32>>>;

/// Handle for signalling the audio callback to fade out before shutdown.
pub type FadeOut = Arc<AtomicBool>;

/// Silent samples the callback played because the ring ran dry, not yet
/// accounted for by the sink.
pub type Underrun = Arc<AtomicUsize>;

pub(crate) struct AudioPlayer {
    ring: AudioRing,
    underrun: Underrun,
    fade_in_pos: u32,
    fading_out: FadeOut,
    fade_out_pos: u32,
}

impl AudioCallback for AudioPlayer {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        // Poisoning leaves the queue intact
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        let mut starved = 0;
        for sample in out.iter_mut() {
            let raw = ring.pop_front().unwrap_or_else(|| {
                starved += 1;
                0.0
            });

            *sample = if self.fade_in_pos < FADE_SAMPLES {
                let gain = self.fade_in_pos as f32 / FADE_SAMPLES as f32;
                self.fade_in_pos += 1;
                raw * gain
            } else if self.fading_out.load(Ordering::Relaxed) {
                if self.fade_out_pos < FADE_SAMPLES {
                    let gain = 1.0 - (self.fade_out_pos as f32 / FADE_SAMPLES as f32);
                    self.fade_out_pos += 1;
                    raw * gain
                } else {
                    0.0
                }
            } else {
                raw
            };
        }
        if starved > 0 {
            self.underrun.fetch_add(starved, Ordering::Relaxed);
        }
    }
}

/// Sample-accurate bookkeeping of where the last queued chunk ends.
#[derive(Debug, Default)]
pub(crate) struct Timeline {
    queued_until: Option<Duration>,
}

impl Timeline {
    /// Record a chunk of `len` samples at `start` and return how many
    /// samples of silence must precede it.
    pub fn place(&mut self, start: Duration, len: usize) -> usize {
        let gap = match self.queued_until {
            Some(end) if start > end => duration_to_samples(start - end),
            _ => 0,
        };
        self.queued_until = Some(start + nesplay_core::timing::samples_to_duration(len, SAMPLE_RATE));
        gap
    }
}

fn duration_to_samples(d: Duration) -> usize {
    (d.as_nanos() * SAMPLE_RATE as u128 / 1_000_000_000) as usize
}

/// [`AudioSink`] feeding the SDL output queue.
///
/// A late chunk is preceded by silence for the part of its gap the device
/// has not already played out as underrun.
pub struct SdlAudioSink {
    ring: AudioRing,
    underrun: Underrun,
    timeline: Timeline,
}

impl SdlAudioSink {
    pub fn new(ring: AudioRing, underrun: Underrun) -> Self {
        Self {
            ring,
            underrun,
            timeline: Timeline::default(),
        }
    }
}

impl AudioSink for SdlAudioSink {
    fn schedule(&mut self, chunk: AudioChunk, start: Duration) {
        let samples = chunk.into_samples();
        let gap = self.timeline.place(start, samples.len());
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        // Read under the lock so the callback cannot starve in between
        let played = self.underrun.swap(0, Ordering::Relaxed);
        ring.extend(std::iter::repeat_n(0.0, gap.saturating_sub(played)));
        ring.extend(samples);
    }
}

/// Open SDL device plus its shutdown signal.
pub struct AudioOutput {
    device: AudioDevice<AudioPlayer>,
    fade_out: FadeOut,
}

impl AudioOutput {
    /// Open mono f32 playback at [`SAMPLE_RATE`]. The device starts paused;
    /// call [`resume`](Self::resume) once the first chunk is queued.
    pub fn open(sdl_audio: &sdl2::AudioSubsystem) -> Result<(Self, SdlAudioSink), FrontendError> {
        let ring: AudioRing = Arc::new(Mutex::new(VecDeque::with_capacity(4096)));
        let fade_out: FadeOut = Arc::new(AtomicBool::new(false));
        let underrun: Underrun = Arc::new(AtomicUsize::new(0));

        let desired_spec = AudioSpecDesired {
            freq: Some(SAMPLE_RATE as i32),
            channels: Some(1),
            samples: Some(512), // ~10.7 ms at 48 kHz
        };

        let device = sdl_audio
            .open_playback(None, &desired_spec, |spec| {
                tracing::info!(
                    "Audio: {} Hz, {} channel(s), {} sample buffer",
                    spec.freq,
                    spec.channels,
                    spec.samples
                );
                AudioPlayer {
                    ring: Arc::clone(&ring),
                    underrun: Arc::clone(&underrun),
                    fade_in_pos: 0,
                    fading_out: Arc::clone(&fade_out),
                    fade_out_pos: 0,
                }
            })
            .map_err(FrontendError::sdl)?;

        Ok((Self { device, fade_out }, SdlAudioSink::new(ring, underrun)))
    }

    pub fn resume(&self) {
        self.device.resume();
    }

    /// Ramp to silence, then stop the device.
    pub fn shutdown(self) {
        self.fade_out.store(true, Ordering::Relaxed);
        // FADE_SAMPLES at 48 kHz is ~5.3 ms
        std::thread::sleep(Duration::from_millis(10));
        self.device.pause();
    }
}
