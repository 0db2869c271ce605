//! Player/recorder discovery
//!
//! A [`Coordinator`] is created once and handed to every player and
//! recorder. Each side registers itself on construction and deregisters on
//! drop; the coordinator pushes recorder (de)registrations into the
//! registered player, so the two can be created and destroyed in either
//! order without knowing about each other.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::debug;

use crate::player::AudioPlayer;
use crate::recorder::RecorderLine;

#[derive(Default)]
struct Registry {
    player: Option<Weak<AudioPlayer>>,
    recorder: Option<Weak<RecorderLine>>,
}

/// Registry holding at most one player and one recorder, both weakly
#[derive(Default)]
pub struct Coordinator {
    registry: Mutex<Registry>,
}

impl Coordinator {
    /// Create an empty registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a player, replacing any previous one
    ///
    /// The registered recorder, if any, is pushed into the new player.
    pub fn set_player(&self, player: &Arc<AudioPlayer>) {
        self.registry().player = Some(Arc::downgrade(player));
        debug!("[COORDINATOR] Player registered");
        self.notify_player();
    }

    /// Deregister `player` if it is the one registered
    pub fn player_killed(&self, player: &AudioPlayer) {
        let mut registry = self.registry();
        let registered = registry
            .player
            .as_ref()
            .map(|weak| std::ptr::eq(weak.as_ptr(), player))
            .unwrap_or(false);
        if registered {
            registry.player = None;
            debug!("[COORDINATOR] Player deregistered");
        }
    }

    /// Register a recorder, replacing any previous one, and tell the player
    pub fn set_recorder(&self, recorder: &Arc<RecorderLine>) {
        self.registry().recorder = Some(Arc::downgrade(recorder));
        debug!("[COORDINATOR] Recorder registered");
        self.notify_player();
    }

    /// Deregister `recorder` if it is the one registered, and tell the player
    pub fn recorder_killed(&self, recorder: &RecorderLine) {
        let registered = {
            let mut registry = self.registry();
            let registered = registry
                .recorder
                .as_ref()
                .map(|weak| std::ptr::eq(weak.as_ptr(), recorder))
                .unwrap_or(false);
            if registered {
                registry.recorder = None;
            }
            registered
        };
        if registered {
            debug!("[COORDINATOR] Recorder deregistered");
            self.notify_player();
        }
    }

    /// Registered player, if still alive
    pub fn player(&self) -> Option<Arc<AudioPlayer>> {
        self.registry().player.as_ref().and_then(Weak::upgrade)
    }

    /// Registered recorder, if still alive
    pub fn recorder(&self) -> Option<Arc<RecorderLine>> {
        self.registry().recorder.as_ref().and_then(Weak::upgrade)
    }

    /// Push the current recorder (or its absence) into the player
    ///
    /// Runs without the registry lock held.
    fn notify_player(&self) {
        let (player, recorder) = {
            let registry = self.registry();
            (
                registry.player.as_ref().and_then(Weak::upgrade),
                registry.recorder.as_ref().and_then(Weak::upgrade),
            )
        };
        let Some(player) = player else {
            return;
        };
        match recorder {
            Some(recorder) => player.set_recorder(&recorder),
            None => player.recorder_killed(),
        }
    }
}
