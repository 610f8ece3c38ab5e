use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Result};
use log::{debug, info};

/// Cooperative cancellation flag. The polling loop reads it once per cycle.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Routes SIGINT and SIGTERM to `cancel`. Further signals only set the flag again.
    pub fn install_signal_handler(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            if !token.is_cancelled() {
                info!("Termination signal received, stopping after the current cycle");
            }
            token.cancel();
        })
        .with_context(|| "Failed to set signal handler")?;

        debug!("Signal handler installed");
        Ok(())
    }
}
