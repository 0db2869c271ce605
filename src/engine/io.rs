//! Audio format layer for Tapedeck
//!
//! Decoders sit behind the [`AudioFormatReader`] trait and are created by
//! a [`FormatManager`]. The basic formats are WAV files read with `hound`.
//! Every opener runs under `catch_unwind`, so a misbehaving decoder turns
//! into an `InvalidAudio` error at the open boundary.

use std::fs::File;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::engine::buffer::AudioBuffer;
use crate::error::{Result, TransportError};

// ============================================================================
// Reader Trait
// ============================================================================

/// A random-access decoder producing `f32` samples
pub trait AudioFormatReader: Send {
    /// Short name of the format ("WAV", "memory", ...)
    fn format_name(&self) -> &str;

    /// Native sample rate of the stream
    fn sample_rate(&self) -> u32;

    /// Number of channels in the stream
    fn num_channels(&self) -> usize;

    /// Length of the stream in samples per channel
    fn length_in_samples(&self) -> u64;

    /// Read `num` samples per channel starting at `start`
    ///
    /// Samples land in `dest[ch][dest_offset..dest_offset + num]`. Channels
    /// the stream does not have and positions past the end are zero-filled.
    fn read_samples(
        &mut self,
        dest: &mut [Vec<f32>],
        dest_offset: usize,
        start: u64,
        num: usize,
    ) -> Result<()>;
}

// ============================================================================
// WAV Reader
// ============================================================================

/// WAV decoder backed by `hound`
pub struct WavFileReader {
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
    length: u64,
    position: u64,
    scratch: Vec<f32>,
}

impl WavFileReader {
    /// Open a WAV file for random-access reading
    ///
    /// # Errors
    /// * `FileNotFound` - If the file does not exist
    /// * `InvalidAudio` - If the file is not a readable WAV file
    /// * `UnsupportedFormat` - If the integer bit depth exceeds 32
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TransportError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let reader = WavReader::open(path).map_err(|e| TransportError::InvalidAudio {
            reason: format!("Failed to open WAV file {}: {}", path.display(), e),
            source: Some(Box::new(e)),
        })?;

        let spec = reader.spec();
        if spec.sample_format == SampleFormat::Int && spec.bits_per_sample > 32 {
            return Err(TransportError::UnsupportedFormat {
                format: format!("{}-bit integer audio", spec.bits_per_sample),
            });
        }
        if spec.channels == 0 {
            return Err(TransportError::InvalidAudio {
                reason: "WAV file declares zero channels".to_string(),
                source: None,
            });
        }

        let length = u64::from(reader.duration());

        Ok(Self {
            reader,
            spec,
            length,
            position: 0,
            scratch: Vec::new(),
        })
    }

    fn fill_scratch(&mut self, num_values: usize) -> Result<()> {
        self.scratch.clear();
        match self.spec.sample_format {
            SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(num_values) {
                    self.scratch.push(sample?);
                }
            }
            SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (self.spec.bits_per_sample - 1)) as f32;
                for sample in self.reader.samples::<i32>().take(num_values) {
                    self.scratch.push(sample? as f32 * scale);
                }
            }
        }
        Ok(())
    }
}

impl AudioFormatReader for WavFileReader {
    fn format_name(&self) -> &str {
        "WAV"
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn num_channels(&self) -> usize {
        self.spec.channels as usize
    }

    fn length_in_samples(&self) -> u64 {
        self.length
    }

    fn read_samples(
        &mut self,
        dest: &mut [Vec<f32>],
        dest_offset: usize,
        start: u64,
        num: usize,
    ) -> Result<()> {
        for channel in dest.iter_mut() {
            let end = (dest_offset + num).min(channel.len());
            if dest_offset < end {
                channel[dest_offset..end].fill(0.0);
            }
        }

        if start >= self.length || num == 0 {
            return Ok(());
        }

        let available = ((self.length - start) as usize).min(num);
        if self.position != start {
            // hound positions are u32 frame indices; `length` came from a u32
            self.reader.seek(start as u32)?;
            self.position = start;
        }

        let channels = self.num_channels();
        self.fill_scratch(available * channels)?;
        let frames = self.scratch.len() / channels;
        self.position += frames as u64;

        for (ch, channel) in dest.iter_mut().enumerate().take(channels) {
            for (i, frame) in self.scratch.chunks_exact(channels).enumerate() {
                if let Some(slot) = channel.get_mut(dest_offset + i) {
                    *slot = frame[ch];
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Memory Reader
// ============================================================================

/// Reader over samples already in memory
pub struct MemoryReader {
    buffer: AudioBuffer,
    sample_rate: u32,
}

impl MemoryReader {
    /// Wrap a buffer as a stream at the given rate
    pub fn new(buffer: AudioBuffer, sample_rate: u32) -> Self {
        Self {
            buffer,
            sample_rate,
        }
    }
}

impl AudioFormatReader for MemoryReader {
    fn format_name(&self) -> &str {
        "memory"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn num_channels(&self) -> usize {
        self.buffer.num_channels()
    }

    fn length_in_samples(&self) -> u64 {
        self.buffer.num_samples() as u64
    }

    fn read_samples(
        &mut self,
        dest: &mut [Vec<f32>],
        dest_offset: usize,
        start: u64,
        num: usize,
    ) -> Result<()> {
        let length = self.buffer.num_samples();
        for (ch, channel) in dest.iter_mut().enumerate() {
            for i in 0..num {
                let Some(slot) = channel.get_mut(dest_offset + i) else {
                    break;
                };
                let src = start as usize + i;
                *slot = if ch < self.buffer.num_channels() && src < length {
                    self.buffer.samples[ch][src]
                } else {
                    0.0
                };
            }
        }
        Ok(())
    }
}

// ============================================================================
// Format Manager
// ============================================================================

/// Function opening a decoder for a path
pub type OpenReaderFn = fn(&Path) -> Result<Box<dyn AudioFormatReader>>;

struct RegisteredFormat {
    extensions: &'static [&'static str],
    open: OpenReaderFn,
}

/// Decoder factory keyed by file extension
#[derive(Default)]
pub struct FormatManager {
    formats: Vec<RegisteredFormat>,
}

impl FormatManager {
    /// Create a manager with no formats registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with the WAV format registered
    pub fn with_basic_formats() -> Self {
        let mut manager = Self::new();
        manager.register_basic_formats();
        manager
    }

    /// Register WAV
    pub fn register_basic_formats(&mut self) {
        self.register(&["wav", "wave"], |path| {
            Ok(Box::new(WavFileReader::open(path)?) as Box<dyn AudioFormatReader>)
        });
    }

    /// Register a decoder for the given lowercase extensions
    pub fn register(&mut self, extensions: &'static [&'static str], open: OpenReaderFn) {
        self.formats.push(RegisteredFormat { extensions, open });
    }

    /// Open a decoder for the file at `path`
    ///
    /// # Errors
    /// * `FileNotFound` - If the path does not exist
    /// * `UnsupportedFormat` - If no registered format claims the extension
    /// * `InvalidAudio` - If the decoder fails or panics while opening
    pub fn open_reader_for(&self, path: &Path) -> Result<Box<dyn AudioFormatReader>> {
        if !path.exists() {
            return Err(TransportError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let format = self
            .formats
            .iter()
            .find(|f| f.extensions.contains(&extension.as_str()))
            .ok_or_else(|| TransportError::UnsupportedFormat {
                format: format!("'.{}' ({})", extension, path.display()),
            })?;

        debug!("[FORMAT] Opening {} as .{}", path.display(), extension);
        match panic::catch_unwind(AssertUnwindSafe(|| (format.open)(path))) {
            Ok(result) => result,
            Err(_) => Err(TransportError::InvalidAudio {
                reason: format!("Decoder panicked while opening {}", path.display()),
                source: None,
            }),
        }
    }
}

// ============================================================================
// WAV Export
// ============================================================================

/// Write a buffer to a WAV file
///
/// # Arguments
/// * `buffer` - The audio to write
/// * `path` - Destination path
/// * `sample_rate` - Rate stored in the header
/// * `bit_depth` - 16, 24 (integer) or 32 (float)
pub fn write_wav(buffer: &AudioBuffer, path: &Path, sample_rate: u32, bit_depth: u16) -> Result<()> {
    let spec = wav_spec(buffer.num_channels() as u16, sample_rate, bit_depth)?;
    let mut writer = WavWriter::create(path, spec)?;
    for sample in buffer.to_interleaved() {
        write_sample(&mut writer, sample, bit_depth)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Build a WAV header description
///
/// # Errors
/// * `UnsupportedFormat` - For bit depths other than 16, 24 and 32
pub fn wav_spec(channels: u16, sample_rate: u32, bit_depth: u16) -> Result<WavSpec> {
    let sample_format = match bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        _ => {
            return Err(TransportError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
            })
        }
    };
    Ok(WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bit_depth,
        sample_format,
    })
}

/// Write one `f32` sample, converting to the requested depth
pub fn write_sample<W>(writer: &mut WavWriter<W>, sample: f32, bit_depth: u16) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    match bit_depth {
        16 => {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(scaled)?;
        }
        24 => {
            // 24-bit stored as i32 in hound
            let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
            writer.write_sample(scaled)?;
        }
        _ => writer.write_sample(sample)?,
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
