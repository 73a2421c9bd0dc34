//! Cooperative work units driven by the sequencer.

/// A unit of periodic work.
///
/// `step()` is called exactly once per pass, one module per tick.  It must
/// return quickly (no blocking waits, no busy loops) and must never decide
/// on sleep or reboot itself: faults are the module's own business.
pub trait Module {
    fn step(&mut self);

    /// Label used in logs.
    fn name(&self) -> &str {
        "module"
    }
}

impl<M: Module + ?Sized> Module for Box<M> {
    fn step(&mut self) {
        (**self).step();
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Closure-backed module for small pieces of work.
pub struct FnModule<F> {
    name: &'static str,
    f: F,
}

impl<F: FnMut()> FnModule<F> {
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F: FnMut()> Module for FnModule<F> {
    fn step(&mut self) {
        (self.f)();
    }

    fn name(&self) -> &str {
        self.name
    }
}
