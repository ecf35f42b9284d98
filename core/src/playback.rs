//! Top-level playback state machine.
//!
//! [`PlaybackController`] owns everything about a session: the engine, the
//! run/pause state, a pending single-step request, and the
//! [`FrameScheduler`] that turns host callbacks into frames. All mutation
//! goes through its command methods and [`tick`](PlaybackController::tick);
//! nothing is shared.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::AudioSink;
use crate::engine::{Engine, EngineFactory};
use crate::error::{EmulationFault, RomLoadError};
use crate::input::ControllerState;
use crate::scheduler::{FrameReport, FrameScheduler};
use crate::timing::{Clock, frame_period};
use crate::video::VideoSink;

/// Coarse playback state. The pending step request is tracked separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// No cartridge loaded.
    Empty,
    Paused,
    Running,
}

/// User-facing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    LoadRom(Vec<u8>),
    Play,
    Pause,
    Step,
}

/// Outcome of Play, Pause or Step in a given state.
///
/// LoadRom is not covered here because its outcome depends on whether the
/// engine could be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Move to a new state.
    To(PlaybackState),
    /// Stay put and produce exactly one frame on the next tick.
    StepOnce,
    /// Command has no meaning in this state.
    Ignore,
}

impl PlaybackState {
    /// Transition table for the parameterless commands.
    pub fn on_command(self, command: &Command) -> Transition {
        use PlaybackState::*;
        match (self, command) {
            (Paused, Command::Play) => Transition::To(Running),
            (Running, Command::Pause) => Transition::To(Paused),
            (Paused, Command::Step) => Transition::StepOnce,
            (Empty, _) | (Running, Command::Play | Command::Step) | (Paused, Command::Pause) => {
                Transition::Ignore
            }
            (_, Command::LoadRom(_)) => Transition::Ignore,
        }
    }
}

/// A tick whose work (input, engine step, buffer copy, audio scheduling)
/// ran over budget. Time the video sink spends waiting for vblank does not
/// count.
///
/// Non-fatal: playback continues, with an audible gap if `audio_late_by`
/// is non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulingOverrun {
    pub frame: u64,
    pub tick_time: Duration,
    pub budget: Duration,
    pub audio_late_by: Duration,
}

/// Notifications drained by the host with
/// [`drain_events`](PlaybackController::drain_events).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    StateChanged {
        from: PlaybackState,
        to: PlaybackState,
    },
    /// A cartridge image was accepted and a new engine installed.
    RomLoaded { size: usize },
    /// The engine failed mid-frame and was dropped.
    Fault(EmulationFault),
    Overrun(SchedulingOverrun),
}

/// What a host callback did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No frame was due (spurious callback, or nothing requested it).
    Idle,
    Produced(FrameReport),
    /// The engine faulted; the session is gone. See the `Fault` event.
    Faulted,
}

/// Playback tuning.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Start running as soon as a cartridge loads.
    pub auto_start: bool,
    /// Per-tick work budget; ticks over it are reported as overruns.
    pub tick_budget: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            tick_budget: frame_period(),
        }
    }
}

pub struct PlaybackController<V, A, C> {
    config: PlaybackConfig,
    factory: Box<dyn EngineFactory>,
    engine: Option<Box<dyn Engine>>,
    state: PlaybackState,
    step_pending: bool,
    scheduler: FrameScheduler<V, A, C>,
    events: Vec<PlaybackEvent>,
}

impl<V: VideoSink, A: AudioSink, C: Clock> PlaybackController<V, A, C> {
    pub fn new(
        factory: Box<dyn EngineFactory>,
        scheduler: FrameScheduler<V, A, C>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            config,
            factory,
            engine: None,
            state: PlaybackState::Empty,
            step_pending: false,
            scheduler,
            events: Vec::new(),
        }
    }

    /// Apply any command. Only LoadRom can fail.
    pub fn apply(&mut self, command: Command) -> Result<(), RomLoadError> {
        match command {
            Command::LoadRom(rom) => self.load_rom(&rom),
            Command::Play => {
                self.play();
                Ok(())
            }
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Step => {
                self.step();
                Ok(())
            }
        }
    }

    /// Replace the current session with one built from `rom`.
    ///
    /// On failure nothing changes: the previous engine, state and pending
    /// tick survive untouched.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), RomLoadError> {
        let engine = self.factory.construct(rom).inspect_err(|e| {
            warn!("ROM rejected ({} bytes): {}", rom.len(), e);
        })?;

        // Dropping the old engine here keeps a single live instance
        if self.engine.replace(engine).is_some() {
            debug!("Released previous engine");
        }
        info!("Loaded ROM ({} bytes)", rom.len());
        self.events.push(PlaybackEvent::RomLoaded { size: rom.len() });

        self.step_pending = false;
        self.scheduler.cancel_tick();
        self.scheduler.reset_audio();
        self.set_state(PlaybackState::Paused);

        if self.config.auto_start {
            self.play();
        }
        Ok(())
    }

    pub fn play(&mut self) {
        self.dispatch(&Command::Play);
    }

    /// Takes effect at the next scheduling boundary: a tick that was already
    /// requested still fires and completes, but requests no successor.
    pub fn pause(&mut self) {
        self.dispatch(&Command::Pause);
    }

    /// Produce one frame while paused. Ignored in any other state.
    pub fn step(&mut self) {
        self.dispatch(&Command::Step);
    }

    /// Space-bar style toggle between Running and Paused.
    pub fn toggle_pause(&mut self) {
        match self.state {
            PlaybackState::Running => self.pause(),
            PlaybackState::Paused => self.play(),
            PlaybackState::Empty => {}
        }
    }

    fn dispatch(&mut self, command: &Command) {
        match self.state.on_command(command) {
            Transition::To(next) => {
                self.set_state(next);
                if next == PlaybackState::Running {
                    self.scheduler.request_tick();
                }
            }
            Transition::StepOnce => {
                self.step_pending = true;
                self.scheduler.request_tick();
            }
            Transition::Ignore => {
                debug!("Ignoring {:?} while {:?}", command, self.state);
            }
        }
    }

    fn set_state(&mut self, to: PlaybackState) {
        let from = std::mem::replace(&mut self.state, to);
        if from != to {
            debug!("Playback {:?} -> {:?}", from, to);
            self.events.push(PlaybackEvent::StateChanged { from, to });
        }
    }

    /// Host callback entry point.
    ///
    /// Produces a frame only if a tick was requested, then requests the next
    /// one if (and only if) playback is still running.
    pub fn tick(&mut self, input: ControllerState) -> TickOutcome {
        if !self.scheduler.take_request() {
            return TickOutcome::Idle;
        }
        let Some(engine) = self.engine.as_deref_mut() else {
            return TickOutcome::Idle;
        };

        self.step_pending = false;
        match self.scheduler.run_frame(engine, input) {
            Ok(report) => {
                self.check_overrun(&report);
                if self.state == PlaybackState::Running {
                    self.scheduler.request_tick();
                }
                TickOutcome::Produced(report)
            }
            Err(fault) => {
                warn!("Emulation fault, closing session: {}", fault);
                self.engine = None;
                self.scheduler.cancel_tick();
                self.set_state(PlaybackState::Empty);
                self.events.push(PlaybackEvent::Fault(fault));
                TickOutcome::Faulted
            }
        }
    }

    fn check_overrun(&mut self, report: &FrameReport) {
        let budget = self.config.tick_budget;
        if report.tick_time <= budget {
            return;
        }
        warn!(
            "Frame {} took {:?} (budget {:?}), audio late by {:?}",
            report.frame, report.tick_time, budget, report.audio.late_by
        );
        self.events.push(PlaybackEvent::Overrun(SchedulingOverrun {
            frame: report.frame,
            tick_time: report.tick_time,
            budget,
            audio_late_by: report.audio.late_by,
        }));
    }

    /// Take all events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_step_pending(&self) -> bool {
        self.step_pending
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Whether the host should deliver the next callback.
    pub fn is_tick_requested(&self) -> bool {
        self.scheduler.is_tick_requested()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &FrameScheduler<V, A, C> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut FrameScheduler<V, A, C> {
        &mut self.scheduler
    }
}
