//! Ctrl-C handling for graceful shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{DrishtiError, Result};

/// Install a Ctrl-C handler and return the running flag it clears.
///
/// The same flag is shared with the bridge receiver thread, so one signal
/// stops both loops.
pub fn setup_ctrl_c_handler() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| DrishtiError::Config(format!("Failed to install Ctrl-C handler: {}", e)))?;
    Ok(running)
}
