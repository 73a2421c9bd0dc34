//! Deep-sleep marker lifecycle across simulated reboots.
//!
//! The mock board keeps its flag set across `reboot_into()`, standing in
//! for the flash filesystem that survives deep sleep.

use powerloop::app::ports::WakeCause;
use powerloop::power::PowerManager;
use powerloop::{BootKind, ModuleSequencer, SequencerConfig, SequencerEvent, Shutdown, SleepMode};

use crate::mock_board::{Call, MockBoard};

fn sleepy(config: SequencerConfig) -> ModuleSequencer {
    ModuleSequencer::new(SequencerConfig {
        sleep_mode: SleepMode::DeepSleep,
        ..config
    })
    .unwrap()
}

/// Boot, wait out the short interval and let the first idle decision sleep.
fn run_until_sleep(seq: &mut ModuleSequencer, board: &mut MockBoard) -> BootKind {
    let kind = seq.setup(Vec::new(), board);
    seq.tick(board);
    board.advance(1_001);
    seq.tick(board);
    assert_eq!(seq.shutdown(), Some(Shutdown::DeepSleep));
    kind
}

#[test]
fn marker_survives_sleep_and_is_cleared_on_wake() {
    let mut board = MockBoard::new();
    let kind = run_until_sleep(&mut sleepy(SequencerConfig::default()), &mut board);
    assert_eq!(kind, BootKind::ColdBoot);
    assert!(board.flags.contains("/deepsleep"));

    board.reboot_into(WakeCause::Timer);
    let mut seq = sleepy(SequencerConfig::default());
    assert_eq!(seq.setup(Vec::new(), &mut board), BootKind::DeepSleepWake);
    assert!(board.flags.is_empty());
    assert_eq!(board.count(|c| *c == Call::DeleteFlag("/deepsleep".into())), 1);

    // A later reset that still reports a timer cause is not confirmed.
    board.reboot_into(WakeCause::Timer);
    let mut seq = sleepy(SequencerConfig::default());
    assert_eq!(seq.setup(Vec::new(), &mut board), BootKind::UnconfirmedWake);
}

#[test]
fn repeated_cycles_keep_classifying_wakes() {
    let mut board = MockBoard::new();
    run_until_sleep(&mut sleepy(SequencerConfig::default()), &mut board);

    for _ in 0..3 {
        board.reboot_into(WakeCause::Timer);
        let kind = run_until_sleep(&mut sleepy(SequencerConfig::default()), &mut board);
        assert_eq!(kind, BootKind::DeepSleepWake);
        assert!(board.flags.contains("/deepsleep"));
    }
}

#[test]
fn boot_classification_table() {
    let cases = [
        (WakeCause::PowerOn, false, BootKind::ColdBoot),
        (WakeCause::PowerOn, true, BootKind::ColdBoot),
        (WakeCause::Gpio, true, BootKind::ColdBoot),
        (WakeCause::Other(42), true, BootKind::ColdBoot),
        (WakeCause::Timer, false, BootKind::UnconfirmedWake),
        (WakeCause::Ext1, false, BootKind::UnconfirmedWake),
        (WakeCause::Timer, true, BootKind::DeepSleepWake),
        (WakeCause::Ext0, true, BootKind::DeepSleepWake),
        (WakeCause::Ext1, true, BootKind::DeepSleepWake),
        (WakeCause::Touchpad, true, BootKind::DeepSleepWake),
        (WakeCause::Ulp, true, BootKind::DeepSleepWake),
    ];

    let power = PowerManager::new(&SequencerConfig::default());
    for (cause, marker, expected) in cases {
        let mut board = MockBoard::new();
        board.cause = cause;
        if marker {
            board.flags.insert("/deepsleep".into());
        }

        assert_eq!(
            power.is_woke_from_deep_sleep(&board),
            expected == BootKind::DeepSleepWake,
            "{:?} marker={}",
            cause,
            marker
        );
        assert_eq!(power.check_boot(&mut board), expected, "{:?}", cause);
        // Whatever the classification, the marker never outlives the boot.
        assert!(board.flags.is_empty(), "{:?} left the marker", cause);
    }
}

#[test]
fn failed_marker_write_still_sleeps() {
    let mut board = MockBoard::new();
    board.fail_writes = true;
    run_until_sleep(&mut sleepy(SequencerConfig::default()), &mut board);

    assert_eq!(board.deep_sleeps().len(), 1);
    assert!(board.flags.is_empty());

    board.reboot_into(WakeCause::Timer);
    let mut seq = ModuleSequencer::default();
    assert_eq!(seq.setup(Vec::new(), &mut board), BootKind::UnconfirmedWake);
}

#[test]
fn configured_marker_and_duration_are_used() {
    let mut config = SequencerConfig {
        deep_sleep_duration_ms: 90_000,
        ..SequencerConfig::default()
    };
    config.marker_path.clear();
    config.marker_path.push_str("/rtc/sleeping").unwrap();

    let mut board = MockBoard::new();
    run_until_sleep(&mut sleepy(config.clone()), &mut board);

    assert_eq!(board.deep_sleeps(), vec![90_000_000]);
    assert!(board.flags.contains("/rtc/sleeping"));
    assert!(
        board
            .events()
            .contains(&SequencerEvent::EnteringDeepSleep { duration_ms: 90_000 })
    );

    board.reboot_into(WakeCause::Timer);
    let mut seq = sleepy(config);
    assert_eq!(seq.setup(Vec::new(), &mut board), BootKind::DeepSleepWake);
}

#[test]
fn radios_are_shut_down_before_sleep() {
    let mut board = MockBoard::new();
    run_until_sleep(&mut sleepy(SequencerConfig::default()), &mut board);

    let disconnect = board.calls.iter().position(|c| *c == Call::Disconnect);
    let sleep = board
        .calls
        .iter()
        .position(|c| matches!(c, Call::DeepSleep(_)));
    assert!(disconnect.is_some());
    assert!(disconnect < sleep);
    assert!(!board.online);
}
