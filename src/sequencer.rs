//! Cooperative module sequencer: the scheduling core.
//!
//! ```text
//!            setup()
//!               │
//!               ▼
//!   ┌──────────────────────┐  last module stepped   ┌──────────────────┐
//!   │ Running(i)           │ ──────────────────────▶│ Idle             │
//!   │ one step() per tick  │                        │ decide per tick  │
//!   └──────────────────────┘ ◀──────────────────────└──────────────────┘
//!                              pass authorized:           │
//!                              pulse, cursor = 0          │ eligible / reboot
//!                                                         ▼
//!                                                ┌──────────────────┐
//!                                                │ Halted(Shutdown) │
//!                                                └──────────────────┘
//! ```
//!
//! Exactly one module runs per [`tick()`](ModuleSequencer::tick), so the
//! worst-case tick latency is bounded by the slowest module.  The task
//! watchdog and the network stack are serviced by the same task between
//! ticks.
//!
//! ## Idle decision
//!
//! 1. Clock went backwards relative to the last completed pass → reboot.
//! 2. Consume any wake request, recompute the awake state, publish edges.
//! 3. Inter-pass delay = short interval while awake, long interval otherwise.
//! 4. Delay elapsed, wake requested, or wake-state edge → either deep sleep
//!    (if eligible) or pulse and start a new pass.
//! 5. Otherwise honour a pending reboot request.
//!
//! The sequencer owns no hardware.  Every collaborator is passed in as a
//! [`Board`] on each call, so host tests drive it tick by tick.

use core::fmt;

use log::{debug, info, trace, warn};

use crate::app::events::{BootKind, RebootCause, SequencerEvent};
use crate::app::ports::{Board, ConfigError, RadioPort};
use crate::config::{SequencerConfig, SleepMode};
use crate::module::Module;
use crate::power::PowerManager;
use crate::signal::Signal;
use crate::wake::{IrqFlag, WakeTracker};

// ═══════════════════════════════════════════════════════════════
//  Sleep policy
// ═══════════════════════════════════════════════════════════════

/// Decides whether an authorized idle decision may enter deep sleep.
///
/// `SleepMode::DeepSleep` in the config overrides the policy.
#[derive(Default)]
pub enum SleepPolicy {
    #[default]
    Never,
    /// Sleep whenever the station is not connected.
    WhenWifiOff,
    Custom(Box<dyn FnMut() -> bool>),
}

impl fmt::Debug for SleepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::WhenWifiOff => f.write_str("WhenWifiOff"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Terminal action after which the sequencer stops ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    DeepSleep,
    Reboot(RebootCause),
}

/// Raise-only view of the reboot request.  A pending reboot is cleared
/// only by the restart itself, so holders cannot withdraw it.
#[derive(Debug, Clone)]
pub struct RebootHandle(IrqFlag);

impl RebootHandle {
    pub fn raise(&self) {
        self.0.raise();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Advancing through a pass; the index is the next module to step.
    Running(usize),
    /// Between passes.
    Idle,
    /// A terminal action was issued (only observable in simulation).
    Halted(Shutdown),
}

// ═══════════════════════════════════════════════════════════════
//  Sequencer
// ═══════════════════════════════════════════════════════════════

pub struct ModuleSequencer {
    config: SequencerConfig,
    modules: Vec<Box<dyn Module>>,
    phase: Phase,
    last_pass_ms: u64,
    pass_count: u32,
    boot_kind: Option<BootKind>,

    wake: WakeTracker,
    wake_pending: bool,
    wake_flag: IrqFlag,
    reboot_flag: IrqFlag,

    sleep_policy: SleepPolicy,
    power: PowerManager,
    wake_state_changed: Signal<bool>,
}

impl Default for ModuleSequencer {
    fn default() -> Self {
        Self::build(SequencerConfig::default())
    }
}

impl ModuleSequencer {
    /// Create a sequencer from a validated config.  Nothing runs until
    /// [`setup()`](Self::setup).
    pub fn new(config: SequencerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SequencerConfig) -> Self {
        Self {
            wake: WakeTracker::new(config.wake_window_ms),
            power: PowerManager::new(&config),
            config,
            modules: Vec::new(),
            phase: Phase::Idle,
            last_pass_ms: 0,
            pass_count: 0,
            boot_kind: None,
            wake_pending: false,
            wake_flag: IrqFlag::new(),
            reboot_flag: IrqFlag::new(),
            sleep_policy: SleepPolicy::Never,
            wake_state_changed: Signal::new(),
        }
    }

    // ── Configuration ─────────────────────────────────────────

    /// Replace the running config.  Interval and window changes apply at
    /// the next idle decision; `sleep_mode` light-sleep settings apply at
    /// the next `setup()`.
    pub fn apply_config(&mut self, config: SequencerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.wake.set_window(config.wake_window_ms);
        self.power.reconfigure(&config);
        self.config = config;
        info!("Sequencer: config applied");
        Ok(())
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn set_sleep_policy(&mut self, policy: SleepPolicy) {
        debug!("Sequencer: sleep policy {:?}", policy);
        self.sleep_policy = policy;
    }

    /// Shorthand for [`SleepPolicy::WhenWifiOff`].
    pub fn enter_deep_sleep_when_wifi_off(&mut self) {
        self.set_sleep_policy(SleepPolicy::WhenWifiOff);
    }

    // ── Requests (safe to raise from ISRs through the handles) ─

    /// Re-arm the wake window and force an idle decision at the next
    /// idle point.
    pub fn request_wake_up(&self) {
        self.wake_flag.raise();
    }

    /// Reboot at the next idle point that does not start a pass.  Sticky.
    pub fn request_reboot(&self) {
        self.reboot_flag.raise();
    }

    /// Clone of the wake flag for interrupt handlers.
    pub fn wake_handle(&self) -> IrqFlag {
        self.wake_flag.clone()
    }

    /// Raise-only handle for other tasks.
    pub fn reboot_handle(&self) -> RebootHandle {
        RebootHandle(self.reboot_flag.clone())
    }

    /// Observers of the debounced awake state (rising and falling edges).
    pub fn wake_state_changed(&mut self) -> &mut Signal<bool> {
        &mut self.wake_state_changed
    }

    // ── Introspection ─────────────────────────────────────────

    pub fn is_awake(&self) -> bool {
        self.wake.is_awake()
    }

    /// Passes started since `setup()`, the initial one included.
    pub fn pass_count(&self) -> u32 {
        self.pass_count
    }

    pub fn boot_kind(&self) -> Option<BootKind> {
        self.boot_kind
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Index of the next module to step, `None` between passes.
    pub fn cursor(&self) -> Option<usize> {
        match self.phase {
            Phase::Running(i) => Some(i),
            _ => None,
        }
    }

    pub fn shutdown(&self) -> Option<Shutdown> {
        match self.phase {
            Phase::Halted(s) => Some(s),
            _ => None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Store the modules, classify the boot and start the first pass.
    ///
    /// The device is considered awake right after boot, so it is never
    /// judged idle-too-long before the first wake window has run out.
    pub fn setup<B>(&mut self, modules: Vec<Box<dyn Module>>, board: &mut B) -> BootKind
    where
        B: Board + ?Sized,
    {
        self.modules = modules;

        let kind = self.power.check_boot(board);
        self.power.configure_sleep_mode(board, self.config.sleep_mode);

        let now = board.now_ms();
        self.wake.request(now);
        self.wake_pending = false;
        if let Some(awake) = self.wake.update(now) {
            self.publish_wake_edge(awake, board);
        }
        self.last_pass_ms = now;
        self.boot_kind = Some(kind);

        info!(
            "Sequencer: {} module(s), boot={:?}, mode={:?}",
            self.modules.len(),
            kind,
            self.config.sleep_mode
        );
        board.emit(&SequencerEvent::Booted {
            kind,
            modules: self.modules.len(),
        });

        self.pass_count = 1;
        board.emit(&SequencerEvent::PassStarted { pass: 1 });
        self.begin_pass(now);
        kind
    }

    /// Rebuild the module list.  The next pass starts at the next
    /// authorized idle decision.
    pub fn set_modules(&mut self, modules: Vec<Box<dyn Module>>) {
        self.modules = modules;
        if !matches!(self.phase, Phase::Halted(_)) {
            self.phase = Phase::Idle;
        }
        debug!("Sequencer: module list rebuilt ({})", self.modules.len());
    }

    /// Advance by one module step or one idle decision.
    pub fn tick<B>(&mut self, board: &mut B)
    where
        B: Board + ?Sized,
    {
        if self.boot_kind.is_none() {
            trace!("Sequencer: tick before setup ignored");
            return;
        }
        if matches!(self.phase, Phase::Halted(_)) {
            return;
        }

        if self.wake_flag.take() {
            debug!("Sequencer: wake requested");
            self.wake_pending = true;
            self.wake.request(board.now_ms());
        }

        match self.phase {
            Phase::Running(index) => self.step_module(index, board),
            Phase::Idle => self.decide(board),
            Phase::Halted(_) => {}
        }
    }

    /// An empty module list completes its pass on the spot.
    fn begin_pass(&mut self, now_ms: u64) {
        if self.modules.is_empty() {
            self.last_pass_ms = now_ms;
            self.phase = Phase::Idle;
        } else {
            self.phase = Phase::Running(0);
        }
    }

    fn step_module<B>(&mut self, index: usize, board: &mut B)
    where
        B: Board + ?Sized,
    {
        if let Some(module) = self.modules.get_mut(index) {
            trace!("Sequencer: step {} '{}'", index, module.name());
            module.step();
        }

        let next = index + 1;
        if next >= self.modules.len() {
            self.last_pass_ms = board.now_ms();
            self.phase = Phase::Idle;
            trace!("Sequencer: pass {} complete", self.pass_count);
        } else {
            self.phase = Phase::Running(next);
        }
    }

    fn decide<B>(&mut self, board: &mut B)
    where
        B: Board + ?Sized,
    {
        let now = board.now_ms();

        if now < self.last_pass_ms {
            warn!(
                "Sequencer: clock went backwards ({} < {})",
                now, self.last_pass_ms
            );
            self.halt_with_reboot(board, RebootCause::ClockWrapped);
            return;
        }

        let wake_requested = core::mem::take(&mut self.wake_pending);
        let edge = self.wake.update(now);
        if let Some(awake) = edge {
            self.publish_wake_edge(awake, board);
        }

        let delay = if self.wake.is_awake() {
            self.config.short_interval_ms
        } else {
            self.config.long_interval_ms
        };
        let elapsed = now - self.last_pass_ms;

        if elapsed > u64::from(delay) || wake_requested || edge.is_some() {
            if self.sleep_eligible(&*board) {
                self.power.enter_deep_sleep(board);
                self.phase = Phase::Halted(Shutdown::DeepSleep);
                return;
            }

            board.pulse();
            self.pass_count = self.pass_count.wrapping_add(1);
            board.emit(&SequencerEvent::PassStarted {
                pass: self.pass_count,
            });
            self.begin_pass(board.now_ms());
        } else if self.reboot_flag.is_raised() {
            self.halt_with_reboot(board, RebootCause::Requested);
        }
    }

    fn sleep_eligible<R>(&mut self, radio: &R) -> bool
    where
        R: RadioPort + ?Sized,
    {
        if self.config.sleep_mode == SleepMode::DeepSleep {
            return true;
        }
        match &mut self.sleep_policy {
            SleepPolicy::Never => false,
            SleepPolicy::WhenWifiOff => !radio.is_available(),
            SleepPolicy::Custom(eligible) => eligible(),
        }
    }

    fn halt_with_reboot<B>(&mut self, board: &mut B, cause: RebootCause)
    where
        B: Board + ?Sized,
    {
        self.power.reboot(board, cause);
        self.phase = Phase::Halted(Shutdown::Reboot(cause));
    }

    fn publish_wake_edge<B>(&mut self, awake: bool, board: &mut B)
    where
        B: Board + ?Sized,
    {
        info!("Sequencer: {}", if awake { "awake" } else { "idle" });
        self.wake_state_changed.notify(&awake);
        board.emit(&SequencerEvent::WakeStateChanged { awake });
    }
}
