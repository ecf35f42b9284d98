//! WAV capture of the scheduled audio timeline.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use nesplay_core::audio::{AudioChunk, AudioSink, SAMPLE_RATE};

use crate::audio::Timeline;

/// Tees every scheduled chunk into a mono 32-bit float WAV file, with the
/// same silence the live output pads in when the pacer resyncs. The file
/// is finalized on drop.
pub struct WavCapture<A> {
    inner: A,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    timeline: Timeline,
    samples_written: u64,
}

impl<A: AudioSink> WavCapture<A> {
    pub fn create(path: &Path, inner: A) -> Result<Self, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        tracing::info!("Capturing audio to {}", path.display());
        Ok(Self {
            inner,
            writer: Some(writer),
            timeline: Timeline::default(),
            samples_written: 0,
        })
    }

    fn write(&mut self, gap: usize, samples: &[f32]) -> Result<(), hound::Error> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for _ in 0..gap {
            writer.write_sample(0.0f32)?;
        }
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        self.samples_written += (gap + samples.len()) as u64;
        Ok(())
    }
}

impl<A: AudioSink> AudioSink for WavCapture<A> {
    fn schedule(&mut self, chunk: AudioChunk, start: Duration) {
        let gap = self.timeline.place(start, chunk.samples().len());
        if let Err(e) = self.write(gap, chunk.samples()) {
            tracing::warn!("Audio capture stopped: {}", e);
            self.writer = None;
        }
        self.inner.schedule(chunk, start);
    }
}

impl<A> Drop for WavCapture<A> {
    fn drop(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        match writer.finalize() {
            Ok(()) => tracing::info!("Audio capture closed ({} samples)", self.samples_written),
            Err(e) => tracing::warn!("Failed to finalize audio capture: {}", e),
        }
    }
}
