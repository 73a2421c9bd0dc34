//! Wake/idle edge detection and interrupt-set flags.
//!
//! ```text
//!            request()                     now - last_request > window
//!   ┌──────┐ ───────────────────▶ ┌───────┐ ─────────────────────────┐
//!   │ Idle │                      │ Awake │                          │
//!   └──────┘ ◀─────────────────────────────────────────────────────────┘
//! ```
//!
//! Interrupt handlers never touch the sequencer.  They only raise an
//! [`IrqFlag`]; the sequencer consumes it at the start of its next tick.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════
//  Interrupt flag
// ═══════════════════════════════════════════════════════════════

/// Single-producer / single-consumer flag shared with an ISR.
///
/// Clones share the same underlying atomic.  `raise()` is lock-free and
/// safe from interrupt context.
#[derive(Debug, Clone, Default)]
pub struct IrqFlag(Arc<AtomicBool>);

impl IrqFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag.  Repeated raises before a `take()` coalesce.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming (sticky requests).
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Wake tracker
// ═══════════════════════════════════════════════════════════════

/// Debounced awake state derived from the time since the last wake request.
#[derive(Debug, Clone)]
pub struct WakeTracker {
    window_ms: u64,
    last_request_ms: Option<u64>,
    awake: bool,
}

impl WakeTracker {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms: u64::from(window_ms),
            last_request_ms: None,
            awake: false,
        }
    }

    /// Re-arm the wake window starting at `now_ms`.
    pub fn request(&mut self, now_ms: u64) {
        self.last_request_ms = Some(now_ms);
    }

    /// Recompute the awake state.  Returns the new state only on an edge.
    pub fn update(&mut self, now_ms: u64) -> Option<bool> {
        let awake = self
            .last_request_ms
            .is_some_and(|t| now_ms.saturating_sub(t) <= self.window_ms);
        if awake == self.awake {
            return None;
        }
        self.awake = awake;
        Some(awake)
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    pub fn set_window(&mut self, window_ms: u32) {
        self.window_ms = u64::from(window_ms);
    }
}
