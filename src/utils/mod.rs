//! Process-level helpers for the binary.

mod signal;

pub use signal::setup_ctrl_c_handler;
