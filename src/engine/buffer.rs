//! Audio Buffer Management
//!
//! Provides the block type shared by the playback, recording and format
//! layers. Samples are stored non-interleaved as 32-bit floats.

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved block of `f32` samples
///
/// Each channel is a separate `Vec<f32>` of identical length. Buffers used
/// on the audio thread are sized once in `prepare_to_play` and then only
/// resized within their capacity.
///
/// # Example
/// ```
/// use tapedeck::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::new(2, 512);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.num_samples(), 512);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Create a zeroed buffer
    ///
    /// # Arguments
    /// * `num_channels` - Number of channels
    /// * `num_samples` - Number of samples per channel
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
        }
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.num_channels();
        let num_samples = self.num_samples();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Fill every channel with silence
    pub fn clear(&mut self) {
        for channel in &mut self.samples {
            channel.fill(0.0);
        }
    }

    /// Change the shape of the buffer, zeroing the contents
    ///
    /// Does not allocate as long as the new shape fits in the capacity
    /// reserved earlier.
    pub fn set_size(&mut self, num_channels: usize, num_samples: usize) {
        if self.samples.len() != num_channels {
            self.samples.resize_with(num_channels, Vec::new);
        }
        for channel in &mut self.samples {
            channel.clear();
            channel.resize(num_samples, 0.0);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
