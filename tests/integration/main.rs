//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives the sequencer tick by tick
//! against the recording mock board.  All tests run on the host with no
//! real hardware required.

mod deep_sleep_tests;
mod mock_board;
mod scenario_tests;
