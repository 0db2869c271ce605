//! Transport State Machine for Tapedeck
//!
//! Transitions are two-phase. A request moves the visible state to an
//! intermediate value (`Starting`, `Pausing`, `Stopping`, `Unloading`) and
//! queues it; the control tick drains the queue under the owner's state
//! lock and commits every request that is still current.
//!
//! Legal requests are listed in explicit transition tables, one for the
//! player and one for the recorder. Callers test states through the named
//! predicates ([`TransportState::is_active`], [`TransportState::has_file`],
//! [`TransportState::is_ready`]) instead of comparing enum discriminants.

use std::collections::VecDeque;
use std::fmt;

use log::debug;

use crate::error::{Result, TransportError};

/// Maximum number of queued requests between two ticks
pub const PENDING_CAPACITY: usize = 32;

// ============================================================================
// Transport State
// ============================================================================

/// Transport states shared by players and recorders
///
/// The declaration order is the canonical ordering
/// `NoFile < Unloading < Stopped < Stopping < Paused < Pausing < Starting
/// < Playing < Recording`, exposed through [`TransportState::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    /// Nothing loaded (or, for a recorder, no writer armed)
    #[default]
    NoFile,
    /// Unload requested, writer teardown pending
    Unloading,
    /// Loaded, positioned at the start
    Stopped,
    /// Stop requested
    Stopping,
    /// Loaded, holding the current position
    Paused,
    /// Pause requested
    Pausing,
    /// Start requested
    Starting,
    /// Rendering audio
    Playing,
    /// Capturing input (recorder only)
    Recording,
}

impl TransportState {
    /// Position of this state in the canonical ordering
    pub const fn rank(self) -> u8 {
        match self {
            TransportState::NoFile => 0,
            TransportState::Unloading => 1,
            TransportState::Stopped => 2,
            TransportState::Stopping => 3,
            TransportState::Paused => 4,
            TransportState::Pausing => 5,
            TransportState::Starting => 6,
            TransportState::Playing => 7,
            TransportState::Recording => 8,
        }
    }

    /// True for every state ranked above `Paused`
    pub fn is_active(self) -> bool {
        matches!(
            self,
            TransportState::Pausing
                | TransportState::Starting
                | TransportState::Playing
                | TransportState::Recording
        )
    }

    /// True for every state ranked above `NoFile`
    pub fn has_file(self) -> bool {
        !matches!(self, TransportState::NoFile)
    }

    /// True for every state ranked at or above `Stopped`
    pub fn is_ready(self) -> bool {
        !matches!(self, TransportState::NoFile | TransportState::Unloading)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::NoFile => "NoFile",
            TransportState::Unloading => "Unloading",
            TransportState::Stopped => "Stopped",
            TransportState::Stopping => "Stopping",
            TransportState::Paused => "Paused",
            TransportState::Pausing => "Pausing",
            TransportState::Starting => "Starting",
            TransportState::Playing => "Playing",
            TransportState::Recording => "Recording",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Requests and Transition Tables
// ============================================================================

/// A control request, resolved against a transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportRequest {
    Start,
    Pause,
    Stop,
    Unload,
}

impl TransportRequest {
    /// The intermediate state this request moves to
    pub fn intermediate(self) -> TransportState {
        match self {
            TransportRequest::Start => TransportState::Starting,
            TransportRequest::Pause => TransportState::Pausing,
            TransportRequest::Stop => TransportState::Stopping,
            TransportRequest::Unload => TransportState::Unloading,
        }
    }
}

/// Who asked for a transition (kept for logging)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin {
    /// UI or host control call
    Control,
    /// End-of-file detection on the audio thread
    AudioThread,
    /// Side effect of another object's commit
    Cascade,
}

/// One row of a transition table
#[derive(Debug, PartialEq, Eq)]
pub struct Transition {
    pub request: TransportRequest,
    /// States from which the request is accepted
    pub from: &'static [TransportState],
    pub intermediate: TransportState,
    pub committed: TransportState,
}

impl Transition {
    fn accepts(&self, state: TransportState) -> bool {
        self.from.contains(&state)
    }
}

/// Legal transitions of a player
pub static PLAYER_TRANSITIONS: [Transition; 3] = [
    Transition {
        request: TransportRequest::Start,
        from: &[
            TransportState::Stopped,
            TransportState::Stopping,
            TransportState::Paused,
            TransportState::Pausing,
        ],
        intermediate: TransportState::Starting,
        committed: TransportState::Playing,
    },
    Transition {
        request: TransportRequest::Pause,
        from: &[TransportState::Starting, TransportState::Playing],
        intermediate: TransportState::Pausing,
        committed: TransportState::Paused,
    },
    Transition {
        request: TransportRequest::Stop,
        from: &[
            TransportState::Paused,
            TransportState::Pausing,
            TransportState::Starting,
            TransportState::Playing,
        ],
        intermediate: TransportState::Stopping,
        committed: TransportState::Stopped,
    },
];

/// Legal transitions of a recorder
pub static RECORDER_TRANSITIONS: [Transition; 4] = [
    Transition {
        request: TransportRequest::Start,
        from: &[TransportState::Stopped, TransportState::Paused],
        intermediate: TransportState::Starting,
        committed: TransportState::Recording,
    },
    Transition {
        request: TransportRequest::Pause,
        from: &[TransportState::Starting, TransportState::Recording],
        intermediate: TransportState::Pausing,
        committed: TransportState::Paused,
    },
    Transition {
        request: TransportRequest::Stop,
        from: &[
            TransportState::Paused,
            TransportState::Pausing,
            TransportState::Starting,
            TransportState::Recording,
        ],
        intermediate: TransportState::Stopping,
        committed: TransportState::Stopped,
    },
    Transition {
        request: TransportRequest::Unload,
        from: &[
            TransportState::Stopped,
            TransportState::Stopping,
            TransportState::Paused,
            TransportState::Pausing,
            TransportState::Starting,
            TransportState::Recording,
        ],
        intermediate: TransportState::Unloading,
        committed: TransportState::NoFile,
    },
];

// ============================================================================
// Transport Machine
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Pending {
    transition: &'static Transition,
    origin: RequestOrigin,
}

/// A request that the tick has committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub from: TransportState,
    pub to: TransportState,
    pub origin: RequestOrigin,
}

/// Current state plus the queue of requests awaiting the next tick
///
/// The machine is not synchronized itself; the owner keeps it under its
/// state lock together with whatever the commits touch.
#[derive(Debug)]
pub struct TransportMachine {
    table: &'static [Transition],
    state: TransportState,
    pending: VecDeque<Pending>,
}

impl TransportMachine {
    /// Create a machine in `NoFile` driven by the given table
    pub fn new(table: &'static [Transition]) -> Self {
        Self {
            table,
            state: TransportState::NoFile,
            pending: VecDeque::with_capacity(PENDING_CAPACITY),
        }
    }

    /// Machine using [`PLAYER_TRANSITIONS`]
    pub fn player() -> Self {
        Self::new(&PLAYER_TRANSITIONS)
    }

    /// Machine using [`RECORDER_TRANSITIONS`]
    pub fn recorder() -> Self {
        Self::new(&RECORDER_TRANSITIONS)
    }

    /// Get the current (possibly intermediate) state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Number of requests waiting for the next tick
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Request a transition
    ///
    /// Moves to the intermediate state and queues the commit. Never
    /// allocates: the queue is bounded and the oldest entry is dropped
    /// when it is full, since only the newest request can still be current.
    ///
    /// # Errors
    /// * `IllegalTransition` - The table has no row accepting the request
    ///   from the current state. Nothing changes.
    pub fn request(
        &mut self,
        request: TransportRequest,
        origin: RequestOrigin,
    ) -> Result<TransportState> {
        let state = self.state;
        let transition = self
            .table
            .iter()
            .find(|t| t.request == request && t.accepts(state))
            .ok_or(TransportError::IllegalTransition {
                from: state,
                requested: request.intermediate(),
            })?;

        self.state = transition.intermediate;

        let duplicate = self
            .pending
            .back()
            .map(|p| std::ptr::eq(p.transition, transition))
            .unwrap_or(false);
        if !duplicate {
            if self.pending.len() == PENDING_CAPACITY {
                self.pending.pop_front();
            }
            self.pending.push_back(Pending { transition, origin });
        }

        Ok(self.state)
    }

    /// Drain the queue, committing every request that is still current
    ///
    /// A request is current when the machine still sits in its
    /// intermediate state; requests overtaken by a later one are dropped.
    pub fn commit_pending(&mut self) -> Vec<Commit> {
        let mut commits = Vec::new();
        while let Some(pending) = self.pending.pop_front() {
            let t = pending.transition;
            if self.state != t.intermediate {
                continue;
            }
            self.state = t.committed;
            debug!(
                "[TRANSPORT] {} -> {} ({:?})",
                t.intermediate, t.committed, pending.origin
            );
            commits.push(Commit {
                from: t.intermediate,
                to: t.committed,
                origin: pending.origin,
            });
        }
        commits
    }

    /// Put back a state saved earlier, keeping queued requests
    ///
    /// Used by seeking, which parks the transport in `Pausing` while it
    /// repositions and then returns to where it was.
    pub fn restore(&mut self, state: TransportState) {
        self.state = state;
    }

    /// Jump to a state outside the request/commit cycle, dropping the queue
    ///
    /// File loading (`NoFile -> Stopped`), recorder arming and renaming a
    /// take use this.
    pub fn reset(&mut self, state: TransportState) {
        self.pending.clear();
        self.state = state;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
