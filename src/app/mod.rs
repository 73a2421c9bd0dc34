//! Application boundary: port traits and outbound events.
//!
//! The scheduling core ([`sequencer`](crate::sequencer),
//! [`power`](crate::power)) only ever talks to the board through the
//! **port traits** defined in [`ports`], keeping it fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
