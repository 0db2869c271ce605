//! CLI Command Implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hound::WavWriter;
use log::{debug, info};

use crate::config::{EngineConfig, MAX_LINES};
use crate::coordinator::Coordinator;
use crate::engine::buffer::AudioBuffer;
use crate::engine::io::{wav_spec, write_sample, FormatManager};
use crate::engine::transport::TransportState;
use crate::player::AudioPlayer;

/// Read timeout used offline when the configuration asks for none
const OFFLINE_READ_TIMEOUT_MS: u64 = 1000;

/// Arguments of the `render` command
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub files: Vec<PathBuf>,
    pub output: PathBuf,
    pub block_size: usize,
    pub sample_rate: u32,
    pub seek: Option<f64>,
    pub looping: bool,
    pub max_seconds: Option<f64>,
    pub config: Option<PathBuf>,
}

/// Outcome of a render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames: u64,
    pub channels: usize,
    pub blocks: u64,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Render files through a player into a multichannel WAV file.
///
/// Each file gets its own bus. The control tick runs every
/// `tick_interval_ms` worth of blocks and rendering ends when the
/// transport leaves `Playing`.
pub fn render(options: &RenderOptions) -> Result<RenderSummary> {
    if options.files.is_empty() || options.files.len() > MAX_LINES {
        bail!("between 1 and {} input files are required", MAX_LINES);
    }
    if options.block_size == 0 || options.sample_rate == 0 {
        bail!("block size and sample rate must be positive");
    }
    if options.looping && options.max_seconds.is_none() {
        bail!("--loop needs --max-seconds");
    }

    let mut config = load_config(options.config.as_deref())?;
    if config.player.read_timeout_ms == 0 {
        config.player.read_timeout_ms = OFFLINE_READ_TIMEOUT_MS;
    }
    config.player.initial_files = options.files.len();

    let coordinator = Coordinator::new();
    let player = AudioPlayer::new(&coordinator, config.player.clone())?;
    let rate = f64::from(options.sample_rate);
    player.prepare_to_play(rate, options.block_size);

    for (line, file) in options.files.iter().enumerate() {
        player
            .open_file(file, line)
            .with_context(|| format!("opening {}", file.display()))?;
    }
    player.set_all_looping(options.looping);
    if let Some(seconds) = options.seek {
        player.set_position(seconds);
    }

    let channels = options.files.len() * config.player.channels_per_bus;
    let spec = wav_spec(channels as u16, options.sample_rate, config.recorder.bit_depth)?;
    let mut writer = WavWriter::create(&options.output, spec)
        .with_context(|| format!("creating {}", options.output.display()))?;

    let tick_samples = config.tick_interval_ms as f64 * rate / 1000.0;
    let blocks_per_tick = ((tick_samples / options.block_size as f64) as u64).max(1);
    let max_blocks = options
        .max_seconds
        .map(|s| (s.max(0.0) * rate / options.block_size as f64).ceil() as u64);

    player.start()?;
    player.tick();

    let mut block = AudioBuffer::new(channels, options.block_size);
    let mut blocks = 0u64;
    let mut frames = 0u64;
    while player.transport_state() == TransportState::Playing {
        if max_blocks.is_some_and(|max| blocks >= max) {
            break;
        }
        let remaining = if options.looping {
            u64::MAX
        } else {
            let position = player
                .longest_line()
                .and_then(|index| player.line_position(index))
                .unwrap_or(0);
            player.total_length_samples().saturating_sub(position)
        };

        player.process_block(&mut block);
        let num = (options.block_size as u64).min(remaining) as usize;
        for frame in 0..num {
            for channel in &block.samples {
                write_sample(&mut writer, channel[frame], config.recorder.bit_depth)?;
            }
        }
        frames += num as u64;
        blocks += 1;
        if blocks % blocks_per_tick == 0 {
            player.tick();
        }
    }

    if player.transport_state().is_active() {
        player.stop()?;
    }
    player.tick();
    writer.finalize()?;

    info!(
        "Rendered {} frames ({} channels) to {}",
        frames,
        channels,
        options.output.display()
    );
    Ok(RenderSummary {
        frames,
        channels,
        blocks,
    })
}

/// Per-file facts printed by `info`
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub num_channels: usize,
    pub sample_rate: u32,
    pub length_in_samples: u64,
}

impl FileInfo {
    pub fn seconds(&self) -> f64 {
        self.length_in_samples as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Inspect files and report the line a player would treat as longest.
pub fn info(files: &[PathBuf]) -> Result<(Vec<FileInfo>, Option<usize>)> {
    if files.is_empty() || files.len() > MAX_LINES {
        bail!("between 1 and {} input files are required", MAX_LINES);
    }

    let formats = FormatManager::with_basic_formats();
    let mut infos = Vec::with_capacity(files.len());
    for file in files {
        let reader = formats
            .open_reader_for(file)
            .with_context(|| format!("opening {}", file.display()))?;
        infos.push(FileInfo {
            path: file.clone(),
            num_channels: reader.num_channels(),
            sample_rate: reader.sample_rate(),
            length_in_samples: reader.length_in_samples(),
        });
    }

    let mut config = EngineConfig::default().player;
    config.initial_files = files.len();
    let player = AudioPlayer::new(&Coordinator::new(), config)?;
    for (line, file) in files.iter().enumerate() {
        player.open_file(file, line)?;
    }
    let longest = player.longest_line();
    debug!("Longest line: {:?}", longest);
    Ok((infos, longest))
}

/// Print the result of [`info`].
pub fn print_info(files: &[PathBuf]) -> Result<()> {
    let (infos, longest) = info(files)?;
    for (line, file) in infos.iter().enumerate() {
        println!(
            "{:>2}  {}  {} ch  {} Hz  {} samples  {:.3} s",
            line,
            file.path.display(),
            file.num_channels,
            file.sample_rate,
            file.length_in_samples,
            file.seconds()
        );
    }
    match longest {
        Some(line) => println!("Longest line: {}", line),
        None => println!("Longest line: none"),
    }
    Ok(())
}

/// Run `render` and print a one-line summary.
pub fn print_render(options: &RenderOptions) -> Result<()> {
    let summary = render(options)?;
    let seconds = summary.frames as f64 / f64::from(options.sample_rate);
    println!(
        "{}: {} frames, {} channels, {:.3} s",
        options.output.display(),
        summary.frames,
        summary.channels,
        seconds
    );
    Ok(())
}
