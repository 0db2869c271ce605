//! Seekable, optionally looping source over a buffered reader

use log::debug;

use crate::engine::buffering::BufferingReader;

/// Positionable audio source feeding one playback line
///
/// The play cursor keeps counting past the end while looping; reads wrap
/// around the stream length.
pub struct ReaderSource {
    reader: BufferingReader,
    next_play_position: u64,
    looping: bool,
}

impl ReaderSource {
    /// Wrap a buffered reader, positioned at the start
    pub fn new(reader: BufferingReader) -> Self {
        Self {
            reader,
            next_play_position: 0,
            looping: false,
        }
    }

    /// Prime the source with the host's block size and rate
    ///
    /// No resampling happens; a file at another rate plays at the host's.
    pub fn prepare_to_play(&mut self, _block_size: usize, sample_rate: f64) {
        if sample_rate > 0.0 && (f64::from(self.reader.sample_rate()) - sample_rate).abs() > 0.5 {
            debug!(
                "[SOURCE] {} stream at {} Hz plays at host rate {} Hz",
                self.reader.format_name(),
                self.reader.sample_rate(),
                sample_rate
            );
        }
    }

    /// Total length in samples
    pub fn total_length(&self) -> u64 {
        self.reader.length_in_samples()
    }

    /// Position the next block will be read from
    ///
    /// Wrapped into `[0, total_length)` while looping.
    pub fn next_read_position(&self) -> u64 {
        let length = self.total_length();
        if self.looping && length > 0 {
            self.next_play_position % length
        } else {
            self.next_play_position
        }
    }

    /// Move the cursor
    pub fn set_next_read_position(&mut self, position: u64) {
        self.next_play_position = position;
    }

    /// Whether reads wrap at the end
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Enable or disable wrap-around
    pub fn set_looping(&mut self, looping: bool) {
        if self.looping && !looping {
            self.next_play_position = self.next_read_position();
        }
        self.looping = looping;
    }

    /// True while samples remain at the cursor
    pub fn has_unread_samples(&self) -> bool {
        let length = self.total_length();
        length > 0 && (self.looping || self.next_play_position < length)
    }

    /// Advance the cursor without reading
    pub fn skip(&mut self, num: usize) {
        self.next_play_position += num as u64;
    }

    /// Render the next `num` samples into `dest` and advance the cursor
    ///
    /// Mono streams are copied to every destination channel.
    ///
    /// # Returns
    /// `false` if any part had to be replaced by silence
    pub fn get_next_audio_block(&mut self, dest: &mut [Vec<f32>], num: usize) -> bool {
        let length = self.total_length();
        let mut served = true;

        if self.looping && length > 0 {
            let mut done = 0;
            while done < num {
                let position = (self.next_play_position + done as u64) % length;
                let chunk = ((length - position) as usize).min(num - done);
                served &= self.reader.read_samples(dest, done, position, chunk);
                done += chunk;
            }
        } else {
            served = self
                .reader
                .read_samples(dest, 0, self.next_play_position, num);
        }

        if self.reader.num_channels() == 1 {
            if let Some((first, rest)) = dest.split_first_mut() {
                for channel in rest {
                    let n = num.min(channel.len()).min(first.len());
                    channel[..n].copy_from_slice(&first[..n]);
                }
            }
        }

        self.next_play_position += num as u64;
        served
    }
}
