//! ISR-assisted push button with debounce and short/long press detection.
//!
//! ## Hardware
//!
//! Momentary switch, any-edge interrupt.  The ISR half ([`ButtonLine`])
//! records the raw edge timestamp, counts edges and raises the sequencer's
//! wake flag.  [`PushButton::poll`] (called from the main loop) runs the
//! debounce + gesture state machine on the sampled level.
//!
//! One component serves every button; pin, polarity and timings are
//! constructor arguments.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                        | Event        |
//! |-------------|----------------------------------|--------------|
//! | Short press | Released before the long-press   | `ShortPress` |
//! | Long press  | Held >= long-press threshold     | `LongPress`  |

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::wake::IrqFlag;

/// Interrupt-side state shared between the GPIO ISR and [`PushButton`].
#[derive(Debug)]
pub struct ButtonLine {
    last_edge_ms: AtomicU32,
    edges: AtomicU32,
    wake: IrqFlag,
}

impl ButtonLine {
    pub fn new(wake: IrqFlag) -> Self {
        Self {
            last_edge_ms: AtomicU32::new(0),
            edges: AtomicU32::new(0),
            wake,
        }
    }

    /// Call from interrupt context.  Lock-free, never blocks.
    pub fn on_edge(&self, now_ms: u32) {
        self.last_edge_ms.store(now_ms, Ordering::Release);
        self.edges.fetch_add(1, Ordering::AcqRel);
        self.wake.raise();
    }

    pub fn edges(&self) -> u32 {
        self.edges.load(Ordering::Acquire)
    }

    pub fn last_edge_ms(&self) -> u32 {
        self.last_edge_ms.load(Ordering::Acquire)
    }
}

/// Button events emitted after gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { since_ms: u32 },
    Pressed { since_ms: u32 },
    /// Long press reported; waiting for release.
    Held,
}

pub struct PushButton {
    gpio: i32,
    active_low: bool,
    debounce_ms: u32,
    long_press_ms: u32,
    line: Arc<ButtonLine>,
    seen_edges: u32,
    state: GestureState,
}

impl PushButton {
    pub fn new(
        gpio: i32,
        active_low: bool,
        debounce_ms: u32,
        long_press_ms: u32,
        line: Arc<ButtonLine>,
    ) -> Self {
        Self {
            gpio,
            active_low,
            debounce_ms,
            long_press_ms,
            line,
            seen_edges: 0,
            state: GestureState::Idle,
        }
    }

    /// Sample the pin and advance the gesture state machine.
    pub fn poll(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let high = crate::drivers::hw_init::gpio_read(self.gpio);
        self.poll_level(now_ms, high != self.active_low)
    }

    /// Advance the state machine with an already-sampled level.
    pub fn poll_level(&mut self, now_ms: u32, pressed: bool) -> Option<ButtonEvent> {
        let edges = self.line.edges();
        let new_edge = edges != self.seen_edges;
        self.seen_edges = edges;

        match self.state {
            GestureState::Idle => {
                if new_edge || pressed {
                    self.state = GestureState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            GestureState::DebounceWait { since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= self.debounce_ms {
                    self.state = if pressed {
                        GestureState::Pressed { since_ms }
                    } else {
                        GestureState::Idle
                    };
                }
                None
            }

            GestureState::Pressed { since_ms } => {
                if !pressed {
                    self.state = GestureState::Idle;
                    return Some(ButtonEvent::ShortPress);
                }
                if now_ms.wrapping_sub(since_ms) >= self.long_press_ms {
                    self.state = GestureState::Held;
                    return Some(ButtonEvent::LongPress);
                }
                None
            }

            GestureState::Held => {
                if !pressed {
                    self.state = GestureState::Idle;
                }
                None
            }
        }
    }
}
