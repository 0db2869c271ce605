//! Write-behind WAV writer for the recorder
//!
//! The audio thread pushes interleaved samples into a wait-free `rtrb`
//! ring; a [`TimeSliceThread`] drains the ring into a `hound` WAV writer.
//! A block that does not fit into the ring is dropped and counted as an
//! overrun instead of blocking the audio thread.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use hound::WavWriter;
use log::{debug, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::engine::buffer::AudioBuffer;
use crate::engine::io::{wav_spec, write_sample};
use crate::engine::thread::{TimeSliceClient, TimeSliceThread, Waker};
use crate::error::{Result, TransportError};

/// Largest number of values written to disk per time slice
const DRAIN_CHUNK: usize = 16384;

struct Drain {
    consumer: Consumer<f32>,
    writer: WavWriter<BufWriter<File>>,
    bit_depth: u16,
    values_written: u64,
    failed: bool,
}

impl Drain {
    /// Move up to `limit` values from the ring to the file
    fn drain(&mut self, limit: usize) -> Result<usize> {
        let n = self.consumer.slots().min(limit);
        if n == 0 {
            return Ok(0);
        }
        let chunk = self
            .consumer
            .read_chunk(n)
            .map_err(|e| TransportError::Io(std::io::Error::other(e.to_string())))?;
        let mut result = Ok(n);
        {
            let (first, second) = chunk.as_slices();
            for &sample in first.iter().chain(second) {
                if let Err(e) = write_sample(&mut self.writer, sample, self.bit_depth) {
                    result = Err(e);
                    break;
                }
            }
        }
        chunk.commit_all();
        self.values_written += n as u64;
        result
    }
}

struct WriteBehind {
    drain: Mutex<Option<Drain>>,
}

impl TimeSliceClient for WriteBehind {
    fn use_time_slice(&self) -> bool {
        let Ok(mut guard) = self.drain.lock() else {
            return false;
        };
        let Some(drain) = guard.as_mut() else {
            return false;
        };
        if drain.failed {
            return false;
        }
        match drain.drain(DRAIN_CHUNK) {
            Ok(n) => n == DRAIN_CHUNK,
            Err(e) => {
                warn!("[WRITER] Write failed, dropping further input: {}", e);
                drain.failed = true;
                false
            }
        }
    }
}

/// WAV file writer fed from the audio thread
pub struct ThreadedWriter {
    producer: Producer<f32>,
    shared: Arc<WriteBehind>,
    waker: Waker,
    num_channels: usize,
    overruns: u64,
    path: PathBuf,
}

impl ThreadedWriter {
    /// Create the file and register the drain on `thread`
    ///
    /// # Arguments
    /// * `path` - File to create (truncated if it exists)
    /// * `num_channels` - Channels written per sample frame
    /// * `sample_rate` - Rate stored in the header
    /// * `bit_depth` - 16, 24 or 32
    /// * `buffer_samples` - Ring size in samples per channel
    /// * `thread` - Thread that drains the ring
    pub fn create(
        path: &Path,
        num_channels: usize,
        sample_rate: u32,
        bit_depth: u16,
        buffer_samples: usize,
        thread: &TimeSliceThread,
    ) -> Result<Self> {
        let spec = wav_spec(num_channels as u16, sample_rate, bit_depth)?;
        let writer = WavWriter::create(path, spec)?;
        let (producer, consumer) = RingBuffer::new(buffer_samples.max(1) * num_channels.max(1));

        let shared = Arc::new(WriteBehind {
            drain: Mutex::new(Some(Drain {
                consumer,
                writer,
                bit_depth,
                values_written: 0,
                failed: false,
            })),
        });
        let weak: Weak<WriteBehind> = Arc::downgrade(&shared);
        let client: Weak<dyn TimeSliceClient> = weak;
        thread.add_client(client);

        debug!("[WRITER] Opened {} for writing", path.display());
        Ok(Self {
            producer,
            shared,
            waker: thread.waker(),
            num_channels,
            overruns: 0,
            path: path.to_path_buf(),
        })
    }

    /// File being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of blocks dropped because the ring was full
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Queue `num` samples of every channel of `input`
    ///
    /// Missing input channels are written as silence. Wait-free.
    ///
    /// # Returns
    /// `false` if the ring had no room and the block was dropped
    pub fn write(&mut self, input: &AudioBuffer, num: usize) -> bool {
        let channels = self.num_channels;
        let values = num * channels;
        if values == 0 {
            return true;
        }

        let Ok(chunk) = self.producer.write_chunk_uninit(values) else {
            self.overruns += 1;
            return false;
        };
        chunk.fill_from_iter((0..values).map(|k| {
            input
                .samples
                .get(k % channels)
                .and_then(|channel| channel.get(k / channels))
                .copied()
                .unwrap_or(0.0)
        }));
        self.waker.wake();
        true
    }

    /// Flush everything queued, finalize the header and close the file
    ///
    /// # Returns
    /// Number of sample frames in the file
    pub fn finalize(self) -> Result<u64> {
        let mut guard = self
            .shared
            .drain
            .lock()
            .map_err(|_| TransportError::Io(std::io::Error::other("writer lock poisoned")))?;
        let Some(mut drain) = guard.take() else {
            return Ok(0);
        };
        drop(guard);

        while drain.drain(usize::MAX)? > 0 {}
        let frames = drain.values_written / self.num_channels.max(1) as u64;
        drain.writer.finalize()?;

        debug!(
            "[WRITER] Closed {} ({} frames, {} overruns)",
            self.path.display(),
            frames,
            self.overruns
        );
        Ok(frames)
    }
}
