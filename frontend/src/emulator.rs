use std::path::Path;
use std::time::{Duration, Instant};

use nesplay_core::audio::AudioSink;
use nesplay_core::input::{InputAggregator, KeyMap};
use nesplay_core::playback::{
    PlaybackConfig, PlaybackController, PlaybackEvent, PlaybackState, TickOutcome,
};
use nesplay_core::scheduler::{FrameReport, FrameScheduler};
use nesplay_core::timing::{MonotonicClock, frame_period};
use nesplay_machines::Cartridge;
use nesplay_machines::registry::EngineEntry;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Scancode;

use crate::audio::AudioOutput;
use crate::capture::WavCapture;
use crate::config::Settings;
use crate::error::FrontendError;
use crate::rom_path;
use crate::video::SdlVideo;

/// How long the loop sleeps when no frame is due.
const IDLE_SLEEP: Duration = Duration::from_millis(50);

type HostController = PlaybackController<SdlVideo, Box<dyn AudioSink>, MonotonicClock>;

/// Frames presented per wall-clock second.
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    pub fn frame(&mut self) {
        self.frames += 1;
    }

    /// Return the rate once at least a second has passed, then start a new
    /// measurement window.
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        let elapsed = now.duration_since(self.window_start);
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let fps = self.frames as f64 / elapsed.as_secs_f64();
        self.window_start = now;
        self.frames = 0;
        Some(fps)
    }
}

/// Sleep that holds the loop near the frame rate when `present` returned
/// without waiting for vblank (vsync ignored by the driver, or a minimised
/// window). `None` when the frame already took at least half a period.
fn vsync_fallback(report: &FrameReport) -> Option<Duration> {
    let period = frame_period();
    let spent = report.tick_time + report.present_time;
    (spent < period / 2).then(|| period - spent)
}

/// What the title bar shows about the current session.
struct Status {
    engine: &'static str,
    crc: Option<u32>,
    fps: f64,
}

impl Status {
    fn title(&self, state: PlaybackState) -> String {
        match (state, self.crc) {
            (PlaybackState::Empty, _) | (_, None) => {
                format!("nesplay - {} - no cartridge", self.engine)
            }
            (state, Some(crc)) => format!(
                "nesplay - {} [{:08X}] - {:?} - {:.1} fps",
                self.engine, crc, state, self.fps
            ),
        }
    }
}

/// Read a cartridge from disk and hand it to the controller. On failure the
/// current session is untouched.
fn load_path(controller: &mut HostController, path: &Path) -> Result<u32, FrontendError> {
    let rom = rom_path::load_rom(path)?;
    controller.load_rom(&rom)?;
    tracing::info!("Loaded {}", path.display());
    // Engines may accept images that are not iNES
    Ok(Cartridge::parse(&rom).map(|c| c.crc32()).unwrap_or(0))
}

pub fn run(
    settings: &Settings,
    entry: &'static EngineEntry,
    key_map: KeyMap<Scancode>,
) -> Result<(), FrontendError> {
    let sdl_context = sdl2::init().map_err(FrontendError::sdl)?;
    let sdl_video = sdl_context.video().map_err(FrontendError::sdl)?;
    let sdl_audio = sdl_context.audio().map_err(FrontendError::sdl)?;
    let mut event_pump = sdl_context.event_pump().map_err(FrontendError::sdl)?;

    let video = SdlVideo::new(&sdl_video, "nesplay", settings.scale)?;
    let (output, speaker) = AudioOutput::open(&sdl_audio)?;
    let audio: Box<dyn AudioSink> = match &settings.audio_output {
        Some(path) => Box::new(WavCapture::create(path, speaker)?),
        None => Box::new(speaker),
    };

    let scheduler = FrameScheduler::new(video, audio, MonotonicClock::new());
    let config = PlaybackConfig {
        auto_start: settings.auto_start,
        ..PlaybackConfig::default()
    };
    let mut controller: HostController =
        PlaybackController::new(entry.factory(), scheduler, config);
    let mut input = InputAggregator::new(key_map);

    let mut status = Status {
        engine: entry.name,
        crc: None,
        fps: 0.0,
    };
    if let Some(path) = &settings.rom {
        status.crc = Some(load_path(&mut controller, path)?);
    }
    let title = status.title(controller.state());
    controller.scheduler_mut().video_mut().set_title(&title);

    let mut fps = FpsCounter::new(Instant::now());
    let mut audio_started = false;

    'main: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    scancode: Some(Scancode::Escape),
                    ..
                } => break 'main,

                Event::KeyDown {
                    scancode: Some(Scancode::Space),
                    repeat: false,
                    ..
                } => controller.toggle_pause(),

                Event::KeyDown {
                    scancode: Some(Scancode::Tab),
                    ..
                } => {
                    controller.pause();
                    controller.step();
                }

                Event::DropFile { filename, .. } => {
                    match load_path(&mut controller, Path::new(&filename)) {
                        Ok(crc) => status.crc = Some(crc),
                        Err(e) => tracing::warn!("Ignoring {}: {}", filename, e),
                    }
                }

                Event::KeyDown {
                    scancode: Some(sc),
                    repeat: false,
                    ..
                } => {
                    input.key_down(&sc);
                }

                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    input.key_up(&sc);
                }

                Event::Window {
                    win_event: WindowEvent::FocusLost,
                    ..
                } => input.release_all(),

                _ => {}
            }
        }

        if controller.is_tick_requested() {
            // VSync in present() normally paces this branch to the display
            if let TickOutcome::Produced(report) = controller.tick(input.state()) {
                if let Some(wait) = vsync_fallback(&report) {
                    std::thread::sleep(wait);
                }
                fps.frame();
                if !audio_started {
                    output.resume();
                    audio_started = true;
                }
            }
        } else {
            std::thread::sleep(IDLE_SLEEP);
        }

        let mut title_dirty = false;
        for event in controller.drain_events() {
            match event {
                PlaybackEvent::StateChanged { .. } => title_dirty = true,
                PlaybackEvent::RomLoaded { size } => {
                    tracing::debug!("Session started ({} bytes)", size);
                    title_dirty = true;
                }
                PlaybackEvent::Fault(fault) => {
                    tracing::error!("Session closed: {}", fault);
                    status.crc = None;
                    title_dirty = true;
                }
                // Already logged by the controller
                PlaybackEvent::Overrun(_) => {}
            }
        }

        if let Some(rate) = fps.poll(Instant::now()) {
            status.fps = rate;
            title_dirty = true;
            if settings.show_fps {
                controller
                    .scheduler_mut()
                    .video_mut()
                    .set_fps_text(Some(format!("{rate:.1}")));
            }
        }
        if title_dirty {
            let title = status.title(controller.state());
            controller.scheduler_mut().video_mut().set_title(&title);
        }
    }

    // Drop the controller first so a WAV capture is finalized before exit
    drop(controller);
    output.shutdown();
    Ok(())
}
