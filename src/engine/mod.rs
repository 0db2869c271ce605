//! Audio Engine Module
//!
//! Building blocks shared by the player and the recorder:
//! - Audio buffers and the decoder/encoder layer
//! - Background I/O thread, read-ahead and write-behind
//! - Transport state machine and the control timer

pub mod buffer;
pub mod buffering;
pub mod io;
pub mod source;
pub mod thread;
pub mod timer;
pub mod transport;
pub mod writer;

pub use buffer::AudioBuffer;
pub use buffering::BufferingReader;
pub use io::{write_wav, AudioFormatReader, FormatManager, MemoryReader, WavFileReader};
pub use source::ReaderSource;
pub use thread::{TimeSliceClient, TimeSliceThread, Waker};
pub use timer::ControlTimer;
pub use transport::{
    Commit, RequestOrigin, TransportMachine, TransportRequest, TransportState,
    PLAYER_TRANSITIONS, RECORDER_TRANSITIONS,
};
pub use writer::ThreadedWriter;
