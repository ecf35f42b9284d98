mod common;

use std::time::Duration;

use common::{Harness, malformed_rom, valid_rom};
use nesplay_core::audio::AudioChunk;
use nesplay_core::error::{EmulationFault, RomLoadError};
use nesplay_core::input::{Button, ControllerState};
use nesplay_core::playback::{Command, PlaybackEvent, PlaybackState, TickOutcome};
use nesplay_core::timing::frame_period;

fn no_input() -> ControllerState {
    ControllerState::default()
}

// =================================================================
// Loading
// =================================================================

#[test]
fn test_load_while_empty_auto_starts_and_first_tick_produces_frame() {
    let mut h = Harness::auto_start();
    h.clock.set(Duration::from_secs(5));

    h.controller.load_rom(&valid_rom()).unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Running);
    assert!(h.controller.has_engine());
    assert!(h.controller.is_tick_requested());

    let outcome = h.controller.tick(no_input());
    assert!(matches!(outcome, TickOutcome::Produced(_)));
    assert_eq!(h.advances(), 1);
    assert_eq!(h.presented(), &[[1, 1, 0, 255]]);
    // One chunk, starting "now"
    assert_eq!(h.scheduled(), &[(Duration::from_secs(5), 1.0)]);
}

#[test]
fn test_load_without_auto_start_stays_paused() {
    let mut h = Harness::manual_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    assert_eq!(h.controller.state(), PlaybackState::Paused);
    assert!(!h.controller.is_tick_requested());
    assert_eq!(h.controller.tick(no_input()), TickOutcome::Idle);
    assert_eq!(h.advances(), 0);
}

#[test]
fn test_load_events_report_transitions() {
    let mut h = Harness::auto_start();
    let rom = valid_rom();
    h.controller.load_rom(&rom).unwrap();

    assert_eq!(
        h.controller.drain_events(),
        vec![
            PlaybackEvent::RomLoaded { size: rom.len() },
            PlaybackEvent::StateChanged {
                from: PlaybackState::Empty,
                to: PlaybackState::Paused,
            },
            PlaybackEvent::StateChanged {
                from: PlaybackState::Paused,
                to: PlaybackState::Running,
            },
        ]
    );
    assert!(h.controller.drain_events().is_empty());
}

#[test]
fn test_malformed_load_while_empty_stays_empty() {
    let mut h = Harness::auto_start();
    let err = h.controller.load_rom(&malformed_rom()).unwrap_err();

    assert!(matches!(err, RomLoadError::BadMagic));
    assert_eq!(h.controller.state(), PlaybackState::Empty);
    assert!(!h.controller.has_engine());
    assert!(h.controller.drain_events().is_empty());
}

#[test]
fn test_malformed_load_while_running_preserves_session() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.tick(no_input());
    h.controller.drain_events();

    let err = h.controller.load_rom(&malformed_rom());
    assert!(err.is_err());
    assert_eq!(h.controller.state(), PlaybackState::Running);
    assert!(h.controller.is_tick_requested());
    assert_eq!(h.live_engines(), 1);
    assert!(h.controller.drain_events().is_empty());

    // Same engine keeps producing frames
    h.controller.tick(no_input());
    assert_eq!(h.presented().last(), Some(&[1, 2, 0, 255]));
}

#[test]
fn test_reload_replaces_engine_and_keeps_one_live() {
    let mut h = Harness::auto_start();
    for _ in 0..4 {
        h.controller.load_rom(&valid_rom()).unwrap();
        assert_eq!(h.live_engines(), 1);
        h.controller.tick(no_input());
    }
    assert_eq!(h.log.borrow().constructed, 4);
    // Each new engine starts its own frame count
    assert_eq!(h.presented().last(), Some(&[4, 1, 0, 255]));
}

#[test]
fn test_reload_while_running_does_not_double_schedule() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.load_rom(&valid_rom()).unwrap();

    assert!(matches!(h.controller.tick(no_input()), TickOutcome::Produced(_)));
    assert_eq!(h.advances(), 1);
    // Only the replacement engine ran
    assert!(h.log.borrow().calls.iter().all(|&(id, _)| id == 2));
}

#[test]
fn test_reload_restarts_audio_timeline() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();
    // Five frames delivered instantly queue audio well into the future
    for _ in 0..5 {
        h.controller.tick(no_input());
    }
    assert_eq!(h.scheduled()[4].0, AudioChunk::duration() * 4);

    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.tick(no_input());

    assert_eq!(h.scheduled()[5].0, Duration::ZERO);
}

#[test]
fn test_teardown_releases_engine() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();
    let log = std::rc::Rc::clone(&h.log);
    drop(h);
    assert_eq!(log.borrow().live, 0);
}

// =================================================================
// Play / Pause
// =================================================================

#[test]
fn test_running_ticks_reschedule_themselves() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    for _ in 0..10 {
        assert!(matches!(h.controller.tick(no_input()), TickOutcome::Produced(_)));
        assert!(h.controller.is_tick_requested());
    }
    assert_eq!(h.advances(), 10);
    assert!(!h.log.borrow().overlapped);
}

#[test]
fn test_pause_then_play_before_tick_does_not_duplicate_frame() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    h.controller.pause();
    h.controller.play();
    assert_eq!(h.controller.state(), PlaybackState::Running);

    assert!(matches!(h.controller.tick(no_input()), TickOutcome::Produced(_)));
    assert_eq!(h.advances(), 1);
    // A second, unrequested callback in the same slot would be caught here
    assert!(h.controller.is_tick_requested());
    h.controller.tick(no_input());
    assert_eq!(h.advances(), 2);
}

#[test]
fn test_pause_lets_requested_tick_complete_then_stops() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.tick(no_input());

    // The next tick is already registered with the host
    h.controller.pause();
    assert!(h.controller.is_tick_requested());

    assert!(matches!(h.controller.tick(no_input()), TickOutcome::Produced(_)));
    assert_eq!(h.presented().len(), 2);
    assert_eq!(h.scheduled().len(), 2);
    assert!(!h.controller.is_tick_requested());

    assert_eq!(h.controller.tick(no_input()), TickOutcome::Idle);
    assert_eq!(h.advances(), 2);
    assert_eq!(h.controller.state(), PlaybackState::Paused);
}

#[test]
fn test_play_from_paused_requests_single_tick() {
    let mut h = Harness::manual_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    h.controller.play();
    h.controller.play();
    assert!(h.controller.is_tick_requested());
    h.controller.tick(no_input());
    assert_eq!(h.advances(), 1);
}

#[test]
fn test_transport_commands_ignored_while_empty() {
    let mut h = Harness::auto_start();
    for command in [Command::Play, Command::Pause, Command::Step] {
        h.controller.apply(command).unwrap();
        assert_eq!(h.controller.state(), PlaybackState::Empty);
        assert!(!h.controller.is_tick_requested());
    }
    assert_eq!(h.controller.tick(no_input()), TickOutcome::Idle);
}

#[test]
fn test_toggle_pause() {
    let mut h = Harness::auto_start();
    h.controller.toggle_pause();
    assert_eq!(h.controller.state(), PlaybackState::Empty);

    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.toggle_pause();
    assert_eq!(h.controller.state(), PlaybackState::Paused);
    h.controller.toggle_pause();
    assert_eq!(h.controller.state(), PlaybackState::Running);
}

#[test]
fn test_apply_load_command() {
    let mut h = Harness::auto_start();
    h.controller.apply(Command::LoadRom(valid_rom())).unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Running);
    assert!(h.controller.apply(Command::LoadRom(malformed_rom())).is_err());
}

// =================================================================
// Step
// =================================================================

#[test]
fn test_three_steps_while_paused() {
    let mut h = Harness::manual_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    for n in 1..=3 {
        h.controller.step();
        assert_eq!(h.controller.state(), PlaybackState::Paused);
        assert!(h.controller.is_step_pending());

        assert!(matches!(h.controller.tick(no_input()), TickOutcome::Produced(_)));
        assert_eq!(h.controller.state(), PlaybackState::Paused);
        assert!(!h.controller.is_step_pending());
        assert!(!h.controller.is_tick_requested());
        assert_eq!(h.advances(), n);
    }
    assert_eq!(h.presented().len(), 3);
    assert_eq!(h.controller.tick(no_input()), TickOutcome::Idle);
}

#[test]
fn test_repeated_step_before_tick_yields_one_frame() {
    let mut h = Harness::manual_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    h.controller.step();
    h.controller.step();
    h.controller.tick(no_input());
    h.controller.tick(no_input());
    assert_eq!(h.advances(), 1);
}

#[test]
fn test_step_while_running_is_ignored() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    h.controller.step();
    assert!(!h.controller.is_step_pending());
    assert_eq!(h.controller.state(), PlaybackState::Running);

    h.controller.tick(no_input());
    assert_eq!(h.advances(), 1);
}

#[test]
fn test_pause_then_step_with_stale_tick_produces_one_frame() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    h.controller.pause();
    h.controller.step();
    h.controller.tick(no_input());
    h.controller.tick(no_input());

    assert_eq!(h.advances(), 1);
    assert_eq!(h.controller.state(), PlaybackState::Paused);
}

// =================================================================
// Faults
// =================================================================

#[test]
fn test_fault_closes_session() {
    let mut h = Harness::auto_start();
    h.fault_on_frame.set(Some(3));
    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.drain_events();

    h.controller.tick(no_input());
    h.controller.tick(no_input());
    assert_eq!(h.controller.tick(no_input()), TickOutcome::Faulted);

    assert_eq!(h.controller.state(), PlaybackState::Empty);
    assert!(!h.controller.has_engine());
    assert!(!h.controller.is_tick_requested());
    assert_eq!(h.live_engines(), 0);
    // Faulted frame never reached the sinks
    assert_eq!(h.presented().len(), 2);
    assert_eq!(h.scheduled().len(), 2);

    assert_eq!(
        h.controller.drain_events(),
        vec![
            PlaybackEvent::StateChanged {
                from: PlaybackState::Running,
                to: PlaybackState::Empty,
            },
            PlaybackEvent::Fault(EmulationFault::InvalidInstruction {
                opcode: 0x02,
                pc: 0xC000,
            }),
        ]
    );
    assert_eq!(h.controller.tick(no_input()), TickOutcome::Idle);
}

#[test]
fn test_load_after_fault_starts_new_session() {
    let mut h = Harness::auto_start();
    h.fault_on_frame.set(Some(1));
    h.controller.load_rom(&valid_rom()).unwrap();
    assert_eq!(h.controller.tick(no_input()), TickOutcome::Faulted);

    h.fault_on_frame.set(None);
    h.controller.load_rom(&valid_rom()).unwrap();
    assert!(matches!(h.controller.tick(no_input()), TickOutcome::Produced(_)));
    assert_eq!(h.controller.state(), PlaybackState::Running);
}

// =================================================================
// Frame ordering and input
// =================================================================

#[test]
fn test_each_frame_latches_input_steps_then_reads() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.tick(no_input());
    h.controller.tick(no_input());

    let ops: Vec<_> = h.log.borrow().calls.iter().map(|&(_, op)| op).collect();
    assert_eq!(
        ops,
        vec![
            "input", "advance", "frame", "audio", "input", "advance", "frame", "audio"
        ]
    );
}

#[test]
fn test_input_read_at_tick_time() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    let mut input = ControllerState::default();
    input.set(Button::Start, true);
    input.set(Button::Left, true);
    h.controller.tick(input);

    let latched = h.log.borrow().inputs[0];
    assert_eq!(latched, [false, false, false, true, true, false, false, false]);
}

// =================================================================
// Timing
// =================================================================

#[test]
fn test_audio_contiguous_when_keeping_pace() {
    let mut h = Harness::auto_start();
    h.controller.load_rom(&valid_rom()).unwrap();

    for _ in 0..30 {
        h.controller.tick(no_input());
        h.clock.advance(frame_period());
    }

    let starts: Vec<_> = h.scheduled().iter().map(|&(s, _)| s).collect();
    for pair in starts.windows(2) {
        assert_eq!(pair[1], pair[0] + AudioChunk::duration());
    }
    assert!(
        h.controller
            .drain_events()
            .iter()
            .all(|e| !matches!(e, PlaybackEvent::Overrun(_)))
    );
}

#[test]
fn test_slow_frame_reports_overrun_and_resyncs() {
    let mut h = Harness::auto_start();
    h.work.set(frame_period() * 3);
    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.drain_events();

    h.controller.tick(no_input());
    let TickOutcome::Produced(report) = h.controller.tick(no_input()) else {
        panic!("expected a frame");
    };
    assert!(report.audio.resynced());

    let overruns: Vec<_> = h
        .controller
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            PlaybackEvent::Overrun(o) => Some(o),
            _ => None,
        })
        .collect();
    assert_eq!(overruns.len(), 2);
    assert_eq!(overruns[0].tick_time, frame_period() * 3);
    assert!(overruns[0].audio_late_by.is_zero());
    assert!(!overruns[1].audio_late_by.is_zero());

    // Chunks never overlap even when production falls behind
    let starts: Vec<_> = h.scheduled().iter().map(|&(s, _)| s).collect();
    assert!(starts[1] >= starts[0] + AudioChunk::duration());
}

#[test]
fn test_vblank_wait_is_not_an_overrun() {
    // 59.94 Hz display: every swap blocks slightly longer than a 60 Hz frame
    let vblank = Duration::from_nanos(16_683_350);
    let mut h = Harness::auto_start();
    h.wait_for_vblank(vblank);
    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.drain_events();

    for _ in 0..60 {
        let TickOutcome::Produced(report) = h.controller.tick(no_input()) else {
            panic!("expected a frame");
        };
        assert!(report.tick_time.is_zero());
        assert_eq!(report.present_time, vblank);
    }

    assert_eq!(h.presented().len(), 60);
    assert!(
        h.controller
            .drain_events()
            .iter()
            .all(|e| !matches!(e, PlaybackEvent::Overrun(_)))
    );
}

#[test]
fn test_slow_work_still_overruns_behind_vblank() {
    let mut h = Harness::auto_start();
    h.wait_for_vblank(frame_period());
    h.work.set(frame_period() * 2);
    h.controller.load_rom(&valid_rom()).unwrap();
    h.controller.drain_events();

    h.controller.tick(no_input());
    let overruns: Vec<_> = h
        .controller
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            PlaybackEvent::Overrun(o) => Some(o),
            _ => None,
        })
        .collect();
    assert_eq!(overruns.len(), 1);
    assert_eq!(overruns[0].tick_time, frame_period() * 2);
}
