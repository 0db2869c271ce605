//! Periodic control tick
//!
//! A [`ControlTimer`] drives the commit phase of the transport: every
//! interval it ticks whichever player and recorder are registered with the
//! coordinator, player first.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use log::{debug, warn};

use crate::coordinator::Coordinator;
use crate::error::Result;

/// Background thread calling `tick` on the registered objects
pub struct ControlTimer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ControlTimer {
    /// Start ticking
    ///
    /// # Arguments
    /// * `coordinator` - Registry the ticked objects are looked up in
    /// * `interval` - Period between ticks
    ///
    /// # Errors
    /// * `Io` - If the OS refuses to spawn the thread
    pub fn start(coordinator: &Arc<Coordinator>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let coordinator = Arc::clone(coordinator);

        let handle = thread::Builder::new()
            .name("CONTROL_TIMER".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => tick(&coordinator),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        debug!("[TIMER] Ticking every {} ms", interval.as_millis());
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

fn tick(coordinator: &Coordinator) {
    if let Some(player) = coordinator.player() {
        player.tick();
    }
    if let Some(recorder) = coordinator.recorder() {
        recorder.tick();
    }
}

impl Drop for ControlTimer {
    fn drop(&mut self) {
        // disconnecting the channel ends the loop
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("[TIMER] Control timer panicked");
            }
        }
    }
}
