//! Tapedeck - multi-file audio player and recorder engine
//!
//! Tapedeck plays several audio files in sample-accurate lockstep, each on
//! its own output bus, and records a take alongside them.
//!
//! # Architecture
//!
//! - [`engine`]: buffers, decoders, read-ahead and write-behind I/O, and the
//!   two-phase transport state machine
//! - [`player`]: the multi-file player
//! - [`recorder`]: the recorder line
//! - [`coordinator`]: registry pairing one player with one recorder
//!
//! Control calls request transitions; a periodic tick (see
//! [`engine::ControlTimer`]) commits them. The audio callback never blocks
//! on disk.

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod player;
pub mod recorder;

pub use config::{EngineConfig, PlayerConfig, RecorderConfig, MAX_LINES};
pub use coordinator::Coordinator;
pub use engine::{AudioBuffer, TransportState};
pub use error::{Result, TransportError};
pub use player::AudioPlayer;
pub use recorder::RecorderLine;
