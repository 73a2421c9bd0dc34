//! End-to-end sequencer scenarios against the recording mock board.
//!
//! Each test boots a fresh sequencer, then drives it tick by tick while
//! moving the mock clock by hand.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use powerloop::drivers::button::ButtonLine;
use powerloop::{
    FnModule, Module, ModuleSequencer, RebootCause, SequencerConfig, SequencerEvent, Shutdown,
    SleepMode, SleepPolicy,
};

use crate::mock_board::{Call, MockBoard};

type Log = Rc<RefCell<Vec<&'static str>>>;

fn recorder(log: &Log, name: &'static str) -> Box<dyn Module> {
    let log = log.clone();
    Box::new(FnModule::new(name, move || log.borrow_mut().push(name)))
}

fn abc(log: &Log) -> Vec<Box<dyn Module>> {
    vec![recorder(log, "A"), recorder(log, "B"), recorder(log, "C")]
}

// ── Round-robin ───────────────────────────────────────────────

#[test]
fn three_modules_one_step_per_tick_then_pulse() {
    let log: Log = Rc::default();
    let mut seq = ModuleSequencer::default();
    let mut board = MockBoard::new();
    seq.setup(abc(&log), &mut board);

    seq.tick(&mut board);
    seq.tick(&mut board);
    seq.tick(&mut board);
    assert_eq!(*log.borrow(), vec!["A", "B", "C"]);

    // Still inside the short interval: no observable action.
    board.advance(1_000);
    board.calls.clear();
    seq.tick(&mut board);
    assert!(board.calls.is_empty());
    assert_eq!(log.borrow().len(), 3);

    board.advance(1);
    seq.tick(&mut board);
    assert_eq!(board.pulses(), 1);
    assert_eq!(log.borrow().len(), 3, "pulse tick must not step a module");
    assert_eq!(
        board.events(),
        vec![SequencerEvent::PassStarted { pass: 2 }]
    );

    seq.tick(&mut board);
    assert_eq!(*log.borrow(), vec!["A", "B", "C", "A"]);
}

#[test]
fn setup_reports_boot_and_first_pass() {
    let log: Log = Rc::default();
    let mut seq = ModuleSequencer::default();
    let mut board = MockBoard::new();
    let kind = seq.setup(abc(&log), &mut board);

    assert_eq!(kind, powerloop::BootKind::ColdBoot);
    assert_eq!(seq.pass_count(), 1);
    assert_eq!(seq.module_count(), 3);
    assert_eq!(
        board.events(),
        vec![
            SequencerEvent::WakeStateChanged { awake: true },
            SequencerEvent::Booted {
                kind: powerloop::BootKind::ColdBoot,
                modules: 3
            },
            SequencerEvent::PassStarted { pass: 1 },
        ]
    );
    assert!(log.borrow().is_empty(), "setup must not step modules");
}

#[test]
fn empty_module_list_stays_between_passes() {
    let mut seq = ModuleSequencer::default();
    let mut board = MockBoard::new();
    seq.setup(Vec::new(), &mut board);
    assert_eq!(seq.cursor(), None);

    for t in [500, 1_001, 1_500, 2_002] {
        board.now_ms = t;
        seq.tick(&mut board);
        assert_eq!(seq.cursor(), None, "at {} ms", t);
    }
    assert_eq!(board.pulses(), 2);
    assert_eq!(seq.pass_count(), 3);
}

// ── Deep sleep ────────────────────────────────────────────────

#[test]
fn eligible_idle_decision_sleeps_exactly_once() {
    let mut seq = ModuleSequencer::default();
    seq.set_sleep_policy(SleepPolicy::Custom(Box::new(|| true)));
    let mut board = MockBoard::new();
    seq.setup(Vec::new(), &mut board);
    seq.tick(&mut board);

    board.advance(1_001);
    board.calls.clear();
    seq.tick(&mut board);

    assert_eq!(
        board.calls,
        vec![
            Call::Event(SequencerEvent::EnteringDeepSleep {
                duration_ms: 3_600_000
            }),
            Call::CreateFlag("/deepsleep".into()),
            Call::Disconnect,
            Call::DeepSleep(3_600_000_000),
            Call::Delay(100),
        ]
    );
    assert_eq!(seq.shutdown(), Some(Shutdown::DeepSleep));

    for _ in 0..5 {
        board.advance(20_000);
        seq.tick(&mut board);
    }
    assert_eq!(board.deep_sleeps().len(), 1);
    assert_eq!(board.pulses(), 0);
}

#[test]
fn sleep_waits_for_the_pass_to_finish() {
    let log: Log = Rc::default();
    let mut seq = ModuleSequencer::default();
    seq.set_sleep_policy(SleepPolicy::Custom(Box::new(|| true)));
    let mut board = MockBoard::new();
    seq.setup(abc(&log), &mut board);

    seq.request_wake_up();
    seq.tick(&mut board);
    seq.tick(&mut board);
    assert!(board.deep_sleeps().is_empty());

    seq.tick(&mut board);
    assert_eq!(*log.borrow(), vec!["A", "B", "C"]);

    // The pending wake request authorizes the first idle decision.
    seq.tick(&mut board);
    assert_eq!(board.deep_sleeps().len(), 1);
}

#[test]
fn wifi_off_policy_follows_radio_state() {
    let mut seq = ModuleSequencer::default();
    seq.enter_deep_sleep_when_wifi_off();
    let mut board = MockBoard::new();
    seq.setup(Vec::new(), &mut board);
    seq.tick(&mut board);

    board.advance(1_001);
    seq.tick(&mut board);
    assert_eq!(board.pulses(), 1);
    seq.tick(&mut board);

    board.online = false;
    board.advance(1_001);
    seq.tick(&mut board);
    assert_eq!(board.deep_sleeps(), vec![3_600_000_000]);
}

// ── Reboot ────────────────────────────────────────────────────

#[test]
fn clock_wrap_restarts_and_does_nothing_else() {
    let mut seq = ModuleSequencer::default();
    seq.set_sleep_policy(SleepPolicy::Custom(Box::new(|| true)));
    let mut board = MockBoard::new();
    board.now_ms = 5_000;
    seq.setup(Vec::new(), &mut board);
    seq.tick(&mut board);

    board.now_ms = 4_000;
    seq.request_wake_up();
    board.calls.clear();
    seq.tick(&mut board);

    assert_eq!(
        board.calls,
        vec![
            Call::Event(SequencerEvent::Rebooting(RebootCause::ClockWrapped)),
            Call::ReleaseHold,
            Call::Delay(2_000),
            Call::Restart,
        ]
    );
    assert_eq!(
        seq.shutdown(),
        Some(Shutdown::Reboot(RebootCause::ClockWrapped))
    );
}

#[test]
fn reboot_request_loses_to_authorized_pass() {
    let log: Log = Rc::default();
    let mut seq = ModuleSequencer::default();
    let mut board = MockBoard::new();
    seq.setup(vec![recorder(&log, "A")], &mut board);
    seq.tick(&mut board);

    let reboot = seq.reboot_handle();
    reboot.raise();
    seq.request_wake_up();
    board.advance(10);
    seq.tick(&mut board);
    assert_eq!(board.pulses(), 1);
    assert_eq!(board.restarts(), 0);

    seq.tick(&mut board);
    assert_eq!(*log.borrow(), vec!["A", "A"]);
    assert_eq!(board.restarts(), 0);

    seq.tick(&mut board);
    assert_eq!(board.restarts(), 1);
    assert!(
        board
            .events()
            .contains(&SequencerEvent::Rebooting(RebootCause::Requested))
    );
}

// ── Wake tracking ─────────────────────────────────────────────

#[test]
fn wake_edges_notify_once_each() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut seq = ModuleSequencer::default();
    let s = seen.clone();
    seq.wake_state_changed()
        .subscribe(move |awake| s.borrow_mut().push(*awake))
        .unwrap();

    let mut board = MockBoard::new();
    seq.setup(Vec::new(), &mut board);
    seq.tick(&mut board);

    // Window boundary is inclusive.
    board.now_ms = 60_000;
    seq.tick(&mut board);
    seq.tick(&mut board);
    assert!(seq.is_awake());

    board.now_ms = 60_001;
    seq.tick(&mut board);
    assert!(!seq.is_awake());
    seq.tick(&mut board);

    board.now_ms = 70_000;
    seq.request_wake_up();
    seq.tick(&mut board);
    assert!(seq.is_awake());

    assert_eq!(*seen.borrow(), vec![true, false, true]);
    assert_eq!(board.wake_edges(), vec![true, false, true]);
}

#[test]
fn button_edge_wakes_the_sequencer() {
    let mut seq = ModuleSequencer::new(SequencerConfig {
        wake_window_ms: 1_000,
        ..SequencerConfig::default()
    })
    .unwrap();
    let mut board = MockBoard::new();
    seq.setup(Vec::new(), &mut board);
    seq.tick(&mut board);

    board.now_ms = 1_001;
    seq.tick(&mut board);
    seq.tick(&mut board);
    assert!(!seq.is_awake());
    let pulses = board.pulses();

    let line = Arc::new(ButtonLine::new(seq.wake_handle()));
    board.now_ms = 2_000;
    line.on_edge(2_000);
    seq.tick(&mut board);

    assert!(seq.is_awake());
    assert_eq!(board.pulses(), pulses + 1);
}

// ── Sleep modes ───────────────────────────────────────────────

#[test]
fn light_sleep_applied_only_in_station_mode() {
    let config = SequencerConfig {
        sleep_mode: SleepMode::AutoLightSleep,
        ..SequencerConfig::default()
    };

    let mut board = MockBoard::new();
    ModuleSequencer::new(config.clone())
        .unwrap()
        .setup(Vec::new(), &mut board);
    assert_eq!(
        board.count(|c| *c == Call::PowerSave(SleepMode::AutoLightSleep)),
        1
    );

    let mut ap = MockBoard::new();
    ap.access_point = true;
    ModuleSequencer::new(config.clone())
        .unwrap()
        .setup(Vec::new(), &mut ap);
    assert_eq!(ap.count(|c| matches!(c, Call::PowerSave(_))), 0);

    let mut offline = MockBoard::new();
    offline.online = false;
    ModuleSequencer::new(config)
        .unwrap()
        .setup(Vec::new(), &mut offline);
    assert_eq!(offline.count(|c| matches!(c, Call::PowerSave(_))), 0);
}

#[test]
fn modem_sleep_needs_no_configuration() {
    let mut board = MockBoard::new();
    ModuleSequencer::default().setup(Vec::new(), &mut board);
    assert_eq!(board.count(|c| matches!(c, Call::PowerSave(_))), 0);
}
