//! Read-ahead buffering for decoders
//!
//! A [`BufferingReader`] keeps a window of decoded samples just ahead of
//! the last read position. The window is refilled by a
//! [`TimeSliceThread`]; the audio thread only copies out of it. A read the
//! window cannot serve moves the window and, after waiting at most the
//! configured timeout, is answered with silence.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

use log::warn;

use crate::engine::io::AudioFormatReader;
use crate::engine::thread::{TimeSliceClient, TimeSliceThread, Waker};

/// Largest number of samples decoded per time slice
const READ_CHUNK: usize = 8192;

/// Poll interval while a read waits for the background thread
const READ_POLL: Duration = Duration::from_micros(500);

// ============================================================================
// Window
// ============================================================================

struct Window {
    channels: Vec<VecDeque<f32>>,
    /// Stream position of the first held sample
    start: u64,
    capacity: usize,
    /// Position the consumer will read next
    hint: u64,
    /// Bumped whenever the window jumps, so stale fills are discarded
    generation: u64,
    length: u64,
    failed: bool,
}

impl Window {
    fn filled(&self) -> usize {
        self.channels.first().map(VecDeque::len).unwrap_or(0)
    }

    fn end(&self) -> u64 {
        self.start + self.filled() as u64
    }

    fn covers(&self, start: u64, end: u64) -> bool {
        start >= self.start && end <= self.end()
    }

    fn jump_to(&mut self, position: u64) {
        for channel in &mut self.channels {
            channel.clear();
        }
        self.start = position;
        self.generation += 1;
    }

    fn discard_before(&mut self, position: u64) {
        let behind = (position - self.start) as usize;
        for channel in &mut self.channels {
            channel.drain(..behind.min(channel.len()));
        }
        self.start = position;
    }
}

struct Decoder {
    reader: Box<dyn AudioFormatReader>,
    scratch: Vec<Vec<f32>>,
}

struct ReadAhead {
    window: Mutex<Window>,
    decoder: Mutex<Decoder>,
}

impl TimeSliceClient for ReadAhead {
    fn use_time_slice(&self) -> bool {
        let (fetch_start, count, generation) = {
            let Ok(mut window) = self.window.lock() else {
                return false;
            };
            if window.failed {
                return false;
            }

            let hint = window.hint;
            if hint < window.start || hint > window.end() {
                window.jump_to(hint);
            } else {
                window.discard_before(hint);
            }

            let end = window.end();
            let room = window.capacity - window.filled();
            if end >= window.length || room == 0 {
                return false;
            }
            let count = READ_CHUNK.min(room).min((window.length - end) as usize);
            (end, count, window.generation)
        };

        // decode without holding the window lock
        let Ok(mut decoder) = self.decoder.lock() else {
            return false;
        };
        let Decoder { reader, scratch } = &mut *decoder;
        for channel in scratch.iter_mut() {
            channel.resize(count, 0.0);
        }
        let result = reader.read_samples(scratch, 0, fetch_start, count);

        let Ok(mut window) = self.window.lock() else {
            return false;
        };
        if let Err(e) = result {
            warn!("[BUFFER] Read-ahead failed at sample {}: {}", fetch_start, e);
            window.failed = true;
            return false;
        }
        if window.generation != generation || window.end() != fetch_start {
            return true;
        }
        for (held, fresh) in window.channels.iter_mut().zip(scratch.iter()) {
            held.extend(&fresh[..count]);
        }
        true
    }
}

// ============================================================================
// Buffering Reader
// ============================================================================

/// Decoder wrapped in a background-filled read-ahead window
pub struct BufferingReader {
    state: Arc<ReadAhead>,
    waker: Waker,
    timeout: Duration,
    length: u64,
    num_channels: usize,
    sample_rate: u32,
    format_name: String,
}

impl BufferingReader {
    /// Wrap a decoder and register it on a background thread
    ///
    /// # Arguments
    /// * `reader` - The decoder; only the background thread touches it
    /// * `thread` - Thread that refills the window
    /// * `look_ahead` - Window size in samples per channel
    /// * `timeout` - Longest time a read waits for missing samples
    pub fn new(
        reader: Box<dyn AudioFormatReader>,
        thread: &TimeSliceThread,
        look_ahead: usize,
        timeout: Duration,
    ) -> Self {
        let num_channels = reader.num_channels();
        let length = reader.length_in_samples();
        let sample_rate = reader.sample_rate();
        let format_name = reader.format_name().to_string();
        let capacity = look_ahead.max(1);

        let state = Arc::new(ReadAhead {
            window: Mutex::new(Window {
                channels: (0..num_channels)
                    .map(|_| VecDeque::with_capacity(capacity))
                    .collect(),
                start: 0,
                capacity,
                hint: 0,
                generation: 0,
                length,
                failed: false,
            }),
            decoder: Mutex::new(Decoder {
                reader,
                scratch: vec![Vec::with_capacity(READ_CHUNK); num_channels],
            }),
        });

        let weak: Weak<ReadAhead> = Arc::downgrade(&state);
        let client: Weak<dyn TimeSliceClient> = weak;
        thread.add_client(client);

        Self {
            state,
            waker: thread.waker(),
            timeout,
            length,
            num_channels,
            sample_rate,
            format_name,
        }
    }

    /// Length of the underlying stream in samples
    pub fn length_in_samples(&self) -> u64 {
        self.length
    }

    /// Channel count of the underlying stream
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Native sample rate of the underlying stream
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Name of the decoder's format
    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    /// Copy `num` samples starting at `start` into `dest[..][dest_offset..]`
    ///
    /// Positions past the end of the stream read as silence. Channels the
    /// stream lacks are zero-filled.
    ///
    /// # Returns
    /// `false` if the window could not serve the read in time and silence
    /// was substituted
    pub fn read_samples(
        &self,
        dest: &mut [Vec<f32>],
        dest_offset: usize,
        start: u64,
        num: usize,
    ) -> bool {
        zero(dest, dest_offset, num);
        if num == 0 || start >= self.length {
            return true;
        }
        let available = ((self.length - start) as usize).min(num);
        let end = start + available as u64;

        let deadline = Instant::now() + self.timeout;
        loop {
            {
                let Ok(mut window) = self.state.window.lock() else {
                    return false;
                };
                if window.covers(start, end) {
                    let from = (start - window.start) as usize;
                    for (out, held) in dest.iter_mut().zip(window.channels.iter()) {
                        let slots = out.iter_mut().skip(dest_offset).take(available);
                        for (slot, &sample) in slots.zip(held.range(from..from + available)) {
                            *slot = sample;
                        }
                    }
                    window.hint = end;
                    drop(window);
                    self.waker.wake();
                    return true;
                }
                if window.failed {
                    return false;
                }
                window.hint = start;
            }
            self.waker.wake();

            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(READ_POLL);
        }
    }
}

fn zero(dest: &mut [Vec<f32>], offset: usize, num: usize) {
    for channel in dest.iter_mut() {
        let end = (offset + num).min(channel.len());
        if offset < end {
            channel[offset..end].fill(0.0);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
