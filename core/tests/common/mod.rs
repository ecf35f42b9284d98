#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use nesplay_core::audio::{AudioChunk, AudioSink};
use nesplay_core::engine::{Engine, EngineFactory};
use nesplay_core::error::{EmulationFault, RomLoadError};
use nesplay_core::playback::{PlaybackConfig, PlaybackController};
use nesplay_core::scheduler::FrameScheduler;
use nesplay_core::timing::Clock;
use nesplay_core::video::{FrameBuffer, VideoSink};

/// Hand-driven clock shared between the scheduler and the fake engine.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<Duration>>);

impl ManualClock {
    pub fn set(&self, t: Duration) {
        self.0.set(t);
    }

    pub fn advance(&self, d: Duration) {
        self.0.set(self.0.get() + d);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Everything the fake engines observed, shared across instances.
#[derive(Default, Debug)]
pub struct EngineLog {
    pub constructed: usize,
    pub live: usize,
    pub advances: usize,
    pub advancing: bool,
    pub overlapped: bool,
    pub inputs: Vec<[bool; 8]>,
    /// Call sequence as (engine id, operation).
    pub calls: Vec<(usize, &'static str)>,
}

pub type SharedLog = Rc<RefCell<EngineLog>>;

/// Deterministic engine double.
///
/// Pixel (0,0) of every frame is `[id, frame, 0, 255]`; every audio sample
/// equals the frame number.
pub struct FakeEngine {
    id: usize,
    frame: u8,
    log: SharedLog,
    clock: ManualClock,
    work: Duration,
    fault_on_frame: Option<u8>,
}

impl Engine for FakeEngine {
    fn advance_frame(&mut self) -> Result<(), EmulationFault> {
        let mut log = self.log.borrow_mut();
        if log.advancing {
            log.overlapped = true;
        }
        log.advancing = true;
        log.calls.push((self.id, "advance"));

        self.frame = self.frame.wrapping_add(1);
        self.clock.advance(self.work);

        log.advancing = false;
        if self.fault_on_frame == Some(self.frame) {
            return Err(EmulationFault::InvalidInstruction {
                opcode: 0x02,
                pc: 0xC000,
            });
        }
        log.advances += 1;
        Ok(())
    }

    fn read_frame_buffer(&self, buffer: &mut [u8]) {
        for px in buffer.chunks_exact_mut(4) {
            px.copy_from_slice(&[self.id as u8, self.frame, 0, 255]);
        }
        self.log.borrow_mut().calls.push((self.id, "frame"));
    }

    fn read_audio_chunk(&self, samples: &mut [f32]) {
        samples.fill(self.frame as f32);
        self.log.borrow_mut().calls.push((self.id, "audio"));
    }

    fn set_controller_state(&mut self, buttons: [bool; 8]) {
        let mut log = self.log.borrow_mut();
        log.inputs.push(buttons);
        log.calls.push((self.id, "input"));
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.log.borrow_mut().live -= 1;
    }
}

/// Accepts any image starting with the iNES magic.
pub struct FakeFactory {
    log: SharedLog,
    clock: ManualClock,
    pub work: Rc<Cell<Duration>>,
    pub fault_on_frame: Rc<Cell<Option<u8>>>,
}

impl EngineFactory for FakeFactory {
    fn construct(&mut self, rom: &[u8]) -> Result<Box<dyn Engine>, RomLoadError> {
        if !rom.starts_with(b"NES\x1A") {
            return Err(RomLoadError::BadMagic);
        }
        let mut log = self.log.borrow_mut();
        log.constructed += 1;
        log.live += 1;
        Ok(Box::new(FakeEngine {
            id: log.constructed,
            frame: 0,
            log: Rc::clone(&self.log),
            clock: self.clock.clone(),
            work: self.work.get(),
            fault_on_frame: self.fault_on_frame.get(),
        }))
    }
}

#[derive(Default)]
pub struct RecordingVideo {
    /// Pixel (0,0) of every presented frame.
    pub presented: Vec<[u8; 4]>,
    /// When set, each present blocks for this long, like a vsynced swap.
    pub vblank: Option<(ManualClock, Duration)>,
}

impl VideoSink for RecordingVideo {
    fn present(&mut self, frame: &FrameBuffer) {
        self.presented.push(frame.pixel(0, 0));
        if let Some((clock, wait)) = &self.vblank {
            clock.advance(*wait);
        }
    }
}

#[derive(Default)]
pub struct RecordingAudio {
    /// (start, first sample) of every scheduled chunk.
    pub scheduled: Vec<(Duration, f32)>,
}

impl AudioSink for RecordingAudio {
    fn schedule(&mut self, chunk: AudioChunk, start: Duration) {
        self.scheduled.push((start, chunk.samples()[0]));
    }
}

pub type TestController = PlaybackController<RecordingVideo, RecordingAudio, ManualClock>;

pub struct Harness {
    pub controller: TestController,
    pub log: SharedLog,
    pub clock: ManualClock,
    pub work: Rc<Cell<Duration>>,
    pub fault_on_frame: Rc<Cell<Option<u8>>>,
}

impl Harness {
    pub fn new(config: PlaybackConfig) -> Self {
        let log = SharedLog::default();
        let clock = ManualClock::default();
        let work = Rc::new(Cell::new(Duration::ZERO));
        let fault_on_frame = Rc::new(Cell::new(None));
        let factory = FakeFactory {
            log: Rc::clone(&log),
            clock: clock.clone(),
            work: Rc::clone(&work),
            fault_on_frame: Rc::clone(&fault_on_frame),
        };
        let scheduler =
            FrameScheduler::new(RecordingVideo::default(), RecordingAudio::default(), clock.clone());
        Self {
            controller: PlaybackController::new(Box::new(factory), scheduler, config),
            log,
            clock,
            work,
            fault_on_frame,
        }
    }

    pub fn auto_start() -> Self {
        Self::new(PlaybackConfig::default())
    }

    pub fn manual_start() -> Self {
        Self::new(PlaybackConfig {
            auto_start: false,
            ..PlaybackConfig::default()
        })
    }

    /// Make every present take `wait` of clock time.
    pub fn wait_for_vblank(&mut self, wait: Duration) {
        self.controller.scheduler_mut().video_mut().vblank = Some((self.clock.clone(), wait));
    }

    pub fn advances(&self) -> usize {
        self.log.borrow().advances
    }

    pub fn live_engines(&self) -> usize {
        self.log.borrow().live
    }

    pub fn presented(&self) -> &[[u8; 4]] {
        &self.controller.scheduler().video().presented
    }

    pub fn scheduled(&self) -> &[(Duration, f32)] {
        &self.controller.scheduler().audio().scheduled
    }
}

/// Smallest image the fake factory accepts.
pub fn valid_rom() -> Vec<u8> {
    let mut rom = b"NES\x1A".to_vec();
    rom.resize(16, 0);
    rom
}

pub fn malformed_rom() -> Vec<u8> {
    b"not a cartridge".to_vec()
}
