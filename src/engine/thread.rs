//! Background I/O thread shared by buffered sources and writers
//!
//! A [`TimeSliceThread`] owns one OS thread that calls
//! [`TimeSliceClient::use_time_slice`] on each registered client in turn.
//! Clients are held weakly: dropping the last strong handle unregisters a
//! client on the next pass. When no client has work the thread sleeps until
//! woken or until the idle interval elapses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use crate::error::Result;

/// How long an idle thread sleeps before polling its clients again
const IDLE_WAIT: Duration = Duration::from_millis(5);

/// Work item serviced by a [`TimeSliceThread`]
pub trait TimeSliceClient: Send + Sync {
    /// Do one bounded unit of work
    ///
    /// # Returns
    /// `true` if more work is pending right away
    fn use_time_slice(&self) -> bool;
}

/// Cheap handle that nudges a sleeping [`TimeSliceThread`]
///
/// Safe to call from the audio thread: it never blocks or allocates.
#[derive(Clone)]
pub struct Waker {
    tx: Sender<()>,
}

impl Waker {
    /// Wake the thread if it is idle
    pub fn wake(&self) {
        // a full channel already holds a pending wake-up
        let _ = self.tx.try_send(());
    }
}

struct Shared {
    clients: Mutex<Vec<Weak<dyn TimeSliceClient>>>,
    running: AtomicBool,
}

/// One background thread servicing many clients
pub struct TimeSliceThread {
    name: String,
    shared: Arc<Shared>,
    waker: Waker,
    handle: Option<JoinHandle<()>>,
}

impl TimeSliceThread {
    /// Spawn the thread
    ///
    /// # Errors
    /// * `Io` - If the OS refuses to spawn the thread
    pub fn spawn(name: &str) -> Result<Self> {
        let shared = Arc::new(Shared {
            clients: Mutex::new(Vec::new()),
            running: AtomicBool::new(true),
        });
        let (tx, rx) = channel::bounded(1);

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(worker_shared, rx))?;

        debug!("[THREAD] Started '{}'", name);
        Ok(Self {
            name: name.to_string(),
            shared,
            waker: Waker { tx },
            handle: Some(handle),
        })
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a client; it stays registered while it is alive
    pub fn add_client(&self, client: Weak<dyn TimeSliceClient>) {
        if let Ok(mut clients) = self.shared.clients.lock() {
            clients.push(client);
        }
        self.waker.wake();
    }

    /// Number of live clients
    pub fn num_clients(&self) -> usize {
        self.shared
            .clients
            .lock()
            .map(|clients| clients.iter().filter(|c| c.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Handle for waking the thread from other threads
    pub fn waker(&self) -> Waker {
        self.waker.clone()
    }
}

impl Drop for TimeSliceThread {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.waker.wake();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("[THREAD] '{}' panicked", self.name);
            }
        }
        debug!("[THREAD] Stopped '{}'", self.name);
    }
}

fn run(shared: Arc<Shared>, wake_rx: Receiver<()>) {
    let mut live: Vec<Arc<dyn TimeSliceClient>> = Vec::new();

    while shared.running.load(Ordering::Acquire) {
        live.clear();
        if let Ok(mut clients) = shared.clients.lock() {
            clients.retain(|c| c.strong_count() > 0);
            live.extend(clients.iter().filter_map(Weak::upgrade));
        }

        let mut busy = false;
        for client in &live {
            busy |= client.use_time_slice();
        }
        // release our strong handles before sleeping so owners can drop them
        live.clear();

        if !busy {
            match wake_rx.recv_timeout(IDLE_WAIT) {
                Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}
