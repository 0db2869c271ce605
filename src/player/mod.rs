//! Multi-File Player
//!
//! Plays up to [`MAX_LINES`] files in lockstep, each on its own output bus
//! (`channels_per_bus` channels starting at `line * channels_per_bus`). A
//! registered recorder gets one extra line after the regular ones, used to
//! play its take back once it is finished.
//!
//! All state lives behind one mutex shared by the audio callback and the
//! control plane. The audio callback only copies from read-ahead windows;
//! decoding happens on the player's background read thread.

pub mod line;
pub mod state;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::{PlayerConfig, MAX_LINES};
use crate::coordinator::Coordinator;
use crate::engine::buffer::AudioBuffer;
use crate::engine::buffering::BufferingReader;
use crate::engine::io::FormatManager;
use crate::engine::source::ReaderSource;
use crate::engine::thread::TimeSliceThread;
use crate::engine::transport::{RequestOrigin, TransportMachine, TransportRequest, TransportState};
use crate::error::{Result, TransportError};
use crate::recorder::RecorderLine;

pub use line::Line;

struct PlayerInner {
    machine: TransportMachine,
    /// Regular lines followed by the recorder's line, if any
    lines: Vec<Line>,
    num_files: usize,
    has_recorder_line: bool,
    longest_line: Option<usize>,
    total_length: u64,
    looping: bool,
    sample_rate: f64,
    block_size: usize,
    /// Render target for muted lines and lines without a bus
    scratch: AudioBuffer,
    /// Take that failed to load, not retried until renamed
    rejected_take: Option<PathBuf>,
}

impl PlayerInner {
    fn recorder_line(&self) -> Option<usize> {
        self.has_recorder_line.then_some(self.num_files)
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line < self.lines.len() {
            Ok(())
        } else {
            Err(TransportError::LineOutOfRange {
                index: line,
                count: self.lines.len(),
            })
        }
    }

    /// Recompute the longest line; ties go to the lowest index
    ///
    /// With nothing loaded the transport drops back to `NoFile`.
    fn update_total_length(&mut self) {
        let mut longest = None;
        let mut total = 0;
        for (index, line) in self.lines.iter().enumerate() {
            let length = line.length();
            if length > total {
                total = length;
                longest = Some(index);
            }
        }
        self.longest_line = longest;
        self.total_length = total;

        if longest.is_none() && self.machine.state().has_file() {
            self.machine.reset(TransportState::NoFile);
        }
    }

    fn num_named_files(&self, include_recorder: bool) -> usize {
        let recorder_named = self
            .recorder_line()
            .map(|index| self.lines[index].filename.is_some())
            .unwrap_or(false);
        self.num_files + usize::from(include_recorder && recorder_named)
    }
}

/// Lockstep multi-file player registered with a [`Coordinator`]
pub struct AudioPlayer {
    config: PlayerConfig,
    coordinator: Arc<Coordinator>,
    formats: FormatManager,
    read_thread: TimeSliceThread,
    recorder: Mutex<Option<Weak<RecorderLine>>>,
    inner: Mutex<PlayerInner>,
}

impl AudioPlayer {
    /// Create a player reading WAV files
    ///
    /// # Errors
    /// * `InvalidFileCount` - If `initial_files` is outside `1..=MAX_LINES`
    /// * `Io` - If the read thread cannot be spawned
    pub fn new(coordinator: &Arc<Coordinator>, config: PlayerConfig) -> Result<Arc<Self>> {
        Self::with_formats(coordinator, config, FormatManager::with_basic_formats())
    }

    /// Create a player with a custom decoder factory
    ///
    /// Registers with the coordinator, which pushes an existing recorder
    /// into the new player.
    pub fn with_formats(
        coordinator: &Arc<Coordinator>,
        config: PlayerConfig,
        formats: FormatManager,
    ) -> Result<Arc<Self>> {
        check_file_count(config.initial_files)?;
        let lines = (0..config.initial_files).map(|_| Line::default()).collect();
        let scratch = AudioBuffer::new(config.channels_per_bus, 0);

        let player = Arc::new(Self {
            coordinator: Arc::clone(coordinator),
            formats,
            read_thread: TimeSliceThread::spawn("AUDIO_READER")?,
            recorder: Mutex::new(None),
            inner: Mutex::new(PlayerInner {
                machine: TransportMachine::player(),
                lines,
                num_files: config.initial_files,
                has_recorder_line: false,
                longest_line: None,
                total_length: 0,
                looping: false,
                sample_rate: 44100.0,
                block_size: 0,
                scratch,
                rejected_take: None,
            }),
            config,
        });
        coordinator.set_player(&player);
        Ok(player)
    }

    fn lock(&self) -> MutexGuard<'_, PlayerInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attached recorder, if still alive
    ///
    /// Callers obtain it before taking the state lock and keep it past
    /// releasing the lock, so the recorder is never dropped under it.
    fn recorder(&self) -> Option<Arc<RecorderLine>> {
        self.recorder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Settings the player was created with
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    // ========================================================================
    // Recorder Attachment
    // ========================================================================

    /// Attach a recorder and give it the line after the regular ones
    ///
    /// Called by the coordinator.
    pub fn set_recorder(&self, recorder: &Arc<RecorderLine>) {
        *self
            .recorder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::downgrade(recorder));
        {
            let mut inner = self.lock();
            if !inner.has_recorder_line {
                inner.lines.push(Line::default());
                inner.has_recorder_line = true;
            }
        }
        info!("[PLAYER] Recorder attached");
        if recorder.is_idle() {
            self.reload_take(recorder);
        }
    }

    /// Detach the recorder and remove its line
    ///
    /// Called by the coordinator.
    pub fn recorder_killed(&self) {
        *self
            .recorder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        let mut inner = self.lock();
        if inner.has_recorder_line {
            inner.lines.pop();
            inner.has_recorder_line = false;
            inner.rejected_take = None;
            inner.update_total_length();
            info!("[PLAYER] Recorder detached");
        }
    }

    /// True if a recorder is attached
    pub fn has_recorder(&self) -> bool {
        self.lock().has_recorder_line
    }

    /// Index of the recorder's line, if a recorder is attached
    pub fn recorder_line(&self) -> Option<usize> {
        self.lock().recorder_line()
    }

    /// Arm the attached recorder for a new take
    ///
    /// Releases the player's reader on the take file first. A take name
    /// that a regular line plays is refused, so arming never truncates a
    /// backing file.
    ///
    /// # Errors
    /// * `NoRecorder` - If no recorder is attached
    /// * `FileInUse` - If the take name is loaded on a regular line
    /// * anything [`RecorderLine::arm`] reports
    pub fn arm_recorder(&self) -> Result<PathBuf> {
        let recorder = self.recorder().ok_or(TransportError::NoRecorder)?;
        let in_use = {
            let mut inner = self.lock();
            let num_files = inner.num_files;
            let in_use: Vec<Option<PathBuf>> = inner.lines[..num_files]
                .iter()
                .map(|l| l.path().map(Path::to_path_buf))
                .collect();
            if let Some(index) = inner.recorder_line() {
                inner.lines[index].source = None;
                inner.rejected_take = None;
                inner.update_total_length();
            }
            in_use
        };
        let path = recorder.arm_avoiding(&in_use)?;
        let mut inner = self.lock();
        if let Some(index) = inner.recorder_line() {
            inner.lines[index].filename = Some(path.clone());
        }
        Ok(path)
    }

    /// Load the recorder's take into its line
    fn reload_take(&self, recorder: &RecorderLine) {
        let Some(path) = recorder.filename() else {
            return;
        };
        let Some(index) = self.recorder_line() else {
            return;
        };
        let result = self.open_file(&path, index);
        let mut inner = self.lock();
        match result {
            Ok(()) => inner.rejected_take = None,
            Err(e) => {
                warn!("[PLAYER] Could not load take {}: {}", path.display(), e);
                inner.rejected_take = Some(path);
            }
        }
    }

    // ========================================================================
    // Lines
    // ========================================================================

    /// Set the number of regular lines
    ///
    /// Stops the transport if it is active and unloads an active recorder.
    /// Lines beyond the new count are released, new lines start empty. The
    /// recorder's line stays last.
    ///
    /// # Errors
    /// * `InvalidFileCount` - If `num_files` is outside `1..=MAX_LINES`
    pub fn set_num_files(&self, num_files: usize) -> Result<()> {
        check_file_count(num_files)?;
        let recorder = self.recorder();
        let reload_now = {
            let mut inner = self.lock();
            if inner.machine.state().is_active() {
                inner
                    .machine
                    .request(TransportRequest::Stop, RequestOrigin::Control)?;
            }

            let mut reload_now = false;
            if let Some(recorder) = &recorder {
                if recorder.state().is_active() {
                    if let Err(e) = recorder.request(TransportRequest::Unload, RequestOrigin::Cascade)
                    {
                        debug!("[PLAYER] Recorder unload not accepted: {}", e);
                    }
                } else {
                    reload_now = recorder.is_idle();
                }
            }

            let recorder_line = if inner.has_recorder_line {
                inner.lines.pop()
            } else {
                None
            };
            inner.lines.truncate(num_files);
            inner.lines.resize_with(num_files, Line::default);
            if let Some(line) = recorder_line {
                inner.lines.push(line);
            }
            inner.num_files = num_files;
            inner.update_total_length();
            reload_now
        };

        debug!("[PLAYER] {} lines", num_files);
        if let (true, Some(recorder)) = (reload_now, &recorder) {
            self.reload_take(recorder);
        }
        Ok(())
    }

    /// Number of regular lines, plus the recorder's if asked and named
    pub fn get_num_files(&self, include_recorder: bool) -> usize {
        self.lock().num_named_files(include_recorder)
    }

    /// Number of lines including the recorder's
    pub fn num_lines(&self) -> usize {
        self.lock().lines.len()
    }

    /// Load a file into a line
    ///
    /// The line is emptied first, so on failure it is left unloaded. If
    /// the line is the recorder's, the path also becomes the recorder's
    /// take name, and a missing file is accepted: the line keeps the name
    /// without a source. The first successful load moves the transport
    /// from `NoFile` to `Stopped`.
    ///
    /// # Errors
    /// * `LineOutOfRange` - If `line` is not a valid line index
    /// * `FileNotFound` - If the file does not exist (regular lines only)
    /// * `UnsupportedFormat` / `InvalidAudio` - If no decoder accepts it
    /// * `LineReassigned` - If the recorder's line moved while the file opened
    pub fn open_file(&self, path: &Path, line: usize) -> Result<()> {
        let recorder = self.recorder();
        let is_recorder_line = {
            let mut inner = self.lock();
            inner.check_line(line)?;
            inner.lines[line].unload();
            inner.update_total_length();
            inner.recorder_line() == Some(line)
        };

        if is_recorder_line {
            if let Some(recorder) = &recorder {
                if recorder.filename().as_deref() != Some(path) {
                    recorder.set_filename(path);
                }
            }
            if !path.exists() {
                let mut inner = self.lock();
                inner.check_line(line)?;
                check_same_role(&inner, line, is_recorder_line)?;
                inner.lines[line].filename = Some(path.to_path_buf());
                debug!("[PLAYER] Take {} not recorded yet", path.display());
                return Ok(());
            }
        }

        let decoder = self.formats.open_reader_for(path)?;
        let timeout = Duration::from_millis(self.config.read_timeout_ms);
        let reader = BufferingReader::new(
            decoder,
            &self.read_thread,
            self.config.read_ahead_samples,
            timeout,
        );
        let mut source = ReaderSource::new(reader);

        let mut inner = self.lock();
        inner.check_line(line)?;
        check_same_role(&inner, line, is_recorder_line)?;
        source.prepare_to_play(inner.block_size, inner.sample_rate);
        source.set_looping(inner.looping);
        let length = source.total_length();
        inner.lines[line].source = Some(source);
        inner.lines[line].filename = Some(path.to_path_buf());
        inner.update_total_length();
        if inner.machine.state() == TransportState::NoFile {
            inner.machine.reset(TransportState::Stopped);
        }

        info!(
            "[PLAYER] Line {}: {} ({} samples)",
            line,
            path.display(),
            length
        );
        Ok(())
    }

    /// File name (without directories) of a line
    pub fn get_filename(&self, line: usize) -> Option<String> {
        self.lock().lines.get(line).and_then(Line::display_name)
    }

    /// Full path of a line's file
    pub fn get_full_path(&self, line: usize) -> Option<PathBuf> {
        self.lock()
            .lines
            .get(line)
            .and_then(|l| l.path().map(Path::to_path_buf))
    }

    /// Mute or unmute a line; a muted line keeps advancing
    ///
    /// # Errors
    /// * `LineOutOfRange` - If `line` is not a valid line index
    pub fn set_muted(&self, line: usize, muted: bool) -> Result<()> {
        let mut inner = self.lock();
        inner.check_line(line)?;
        inner.lines[line].muted = muted;
        Ok(())
    }

    /// Mute flag of a line; false for invalid indices
    pub fn is_muted(&self, line: usize) -> bool {
        self.lock().lines.get(line).map(|l| l.muted).unwrap_or(false)
    }

    /// Index of the longest loaded line
    pub fn longest_line(&self) -> Option<usize> {
        self.lock().longest_line
    }

    /// Length of the longest line in samples
    pub fn total_length_samples(&self) -> u64 {
        self.lock().total_length
    }

    /// Cursor of a line in samples
    pub fn line_position(&self, line: usize) -> Option<u64> {
        self.lock().lines.get(line).and_then(Line::position)
    }

    // ========================================================================
    // Position and Looping
    // ========================================================================

    /// Position of the longest line in seconds
    pub fn get_current_position(&self) -> f64 {
        let inner = self.lock();
        let position = inner
            .longest_line
            .and_then(|index| inner.lines[index].position())
            .unwrap_or(0);
        position as f64 / inner.sample_rate
    }

    /// Length of the longest line in seconds
    pub fn get_length_in_seconds(&self) -> f64 {
        let inner = self.lock();
        inner.total_length as f64 / inner.sample_rate
    }

    /// Move every line to `seconds`
    ///
    /// Each line is clamped to its last sample; negative positions clamp
    /// to 0. An active transport is parked in `Pausing` while the cursors
    /// move and afterwards goes back to where it was; a playing transport
    /// is asked to start again.
    pub fn set_position(&self, seconds: f64) {
        let mut inner = self.lock();
        let position = (seconds.max(0.0) * inner.sample_rate) as u64;
        let prior = inner.machine.state();

        if prior.is_active() {
            if let Err(e) = inner
                .machine
                .request(TransportRequest::Pause, RequestOrigin::Control)
            {
                debug!("[PLAYER] Seek without pausing: {}", e);
            }
        }

        for line in &mut inner.lines {
            if let Some(source) = line.source.as_mut() {
                let last = source.total_length().saturating_sub(1);
                source.set_next_read_position(position.min(last));
            }
        }

        if prior.is_active() {
            if prior == TransportState::Playing {
                if let Err(e) = inner
                    .machine
                    .request(TransportRequest::Start, RequestOrigin::Control)
                {
                    debug!("[PLAYER] Restart after seek not accepted: {}", e);
                    inner.machine.restore(prior);
                }
            } else {
                inner.machine.restore(prior);
            }
        }
        debug!("[PLAYER] Seek to {} samples", position);
    }

    /// Enable or disable looping on every line
    pub fn set_all_looping(&self, looping: bool) {
        let mut inner = self.lock();
        inner.looping = looping;
        for source in inner.lines.iter_mut().filter_map(|l| l.source.as_mut()) {
            source.set_looping(looping);
        }
    }

    /// Looping flag
    pub fn is_looping(&self) -> bool {
        self.lock().looping
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Current (possibly intermediate) transport state
    pub fn transport_state(&self) -> TransportState {
        self.lock().machine.state()
    }

    /// True in `Stopped` or above
    pub fn is_ready_to_play(&self) -> bool {
        self.transport_state().is_ready()
    }

    /// Request a transition
    ///
    /// # Errors
    /// * `IllegalTransition` - If the request is not legal in the current state
    pub fn request(&self, request: TransportRequest) -> Result<TransportState> {
        self.lock().machine.request(request, RequestOrigin::Control)
    }

    /// Request `Playing`
    pub fn start(&self) -> Result<TransportState> {
        self.request(TransportRequest::Start)
    }

    /// Request `Paused`
    pub fn pause(&self) -> Result<TransportState> {
        self.request(TransportRequest::Pause)
    }

    /// Request `Stopped`
    pub fn stop(&self) -> Result<TransportState> {
        self.request(TransportRequest::Stop)
    }

    /// Commit pending requests and cascade them into the recorder
    ///
    /// Starting playback starts a ready recorder, pausing pauses it and
    /// stopping rewinds every line and unloads the recorder. Once the
    /// recorder is idle with a finished take that its line does not hold
    /// yet, the take is loaded into the line.
    pub fn tick(&self) {
        let recorder = self.recorder();
        let take = {
            let mut inner = self.lock();
            for commit in inner.machine.commit_pending() {
                match commit.to {
                    TransportState::Playing => {
                        info!("[PLAYER] Playing");
                        cascade(&recorder, TransportRequest::Start);
                    }
                    TransportState::Paused => {
                        info!("[PLAYER] Paused");
                        cascade(&recorder, TransportRequest::Pause);
                    }
                    TransportState::Stopped => {
                        info!("[PLAYER] Stopped");
                        for source in inner.lines.iter_mut().filter_map(|l| l.source.as_mut()) {
                            source.set_next_read_position(0);
                        }
                        cascade(&recorder, TransportRequest::Unload);
                    }
                    other => debug!("[PLAYER] {}", other),
                }
            }

            let take = match &recorder {
                Some(recorder) if recorder.is_idle() => inner
                    .recorder_line()
                    .filter(|&index| !inner.lines[index].is_loaded())
                    .and_then(|_| recorder.filename())
                    .filter(|path| inner.rejected_take.as_ref() != Some(path)),
                _ => None,
            };
            take
        };

        if let (Some(path), Some(recorder)) = (take, &recorder) {
            if path.exists() {
                self.reload_take(recorder);
            }
        }
    }

    // ========================================================================
    // Audio
    // ========================================================================

    /// Prepare every line for the host's rate and block size
    pub fn prepare_to_play(&self, sample_rate: f64, block_size: usize) {
        let mut inner = self.lock();
        if sample_rate > 0.0 {
            inner.sample_rate = sample_rate;
        }
        inner.block_size = block_size;
        inner.scratch = AudioBuffer::new(self.config.channels_per_bus, block_size);
        let rate = inner.sample_rate;
        for source in inner.lines.iter_mut().filter_map(|l| l.source.as_mut()) {
            source.prepare_to_play(block_size, rate);
        }
        debug!("[PLAYER] Prepared at {} Hz, {} samples", rate, block_size);
    }

    /// Release render buffers; `prepare_to_play` must be called again
    pub fn release_resources(&self) {
        let mut inner = self.lock();
        inner.scratch = AudioBuffer::new(self.config.channels_per_bus, 0);
        inner.block_size = 0;
    }

    /// Render one block into `output`
    ///
    /// The output is cleared first and stays silent unless the transport
    /// is `Playing`. Every line with samples left advances by the block
    /// length, muted lines and lines without an output bus included. When
    /// the longest line reaches its end a stop is requested, and a
    /// recording recorder is asked to unload.
    pub fn process_block(&self, output: &mut AudioBuffer) {
        output.clear();
        let num = output.num_samples();
        let channels_per_bus = self.config.channels_per_bus;

        let reached_end = {
            let mut inner = self.lock();
            if inner.machine.state() != TransportState::Playing {
                return;
            }

            let PlayerInner { lines, scratch, .. } = &mut *inner;
            for (index, line) in lines.iter_mut().enumerate() {
                let muted = line.muted;
                let Some(source) = line.source.as_mut() else {
                    continue;
                };
                if !source.has_unread_samples() {
                    continue;
                }
                let bus = index * channels_per_bus..(index + 1) * channels_per_bus;
                if muted || bus.end > output.num_channels() {
                    // scratch holds one prepared block; longer host blocks go in pieces
                    let capacity = scratch.num_samples();
                    if capacity == 0 {
                        source.skip(num);
                        continue;
                    }
                    let mut done = 0;
                    while done < num {
                        let chunk = capacity.min(num - done);
                        source.get_next_audio_block(&mut scratch.samples, chunk);
                        done += chunk;
                    }
                } else {
                    source.get_next_audio_block(&mut output.samples[bus], num);
                }
            }

            let position = inner
                .longest_line
                .and_then(|index| inner.lines[index].position());
            match position {
                Some(position) if position >= inner.total_length => {
                    // only fails if a stop is already queued
                    let _ = inner
                        .machine
                        .request(TransportRequest::Stop, RequestOrigin::AudioThread);
                    true
                }
                _ => false,
            }
        };

        if reached_end {
            if let Some(recorder) = self.recorder() {
                if recorder.is_recording() {
                    let _ = recorder.request(TransportRequest::Unload, RequestOrigin::AudioThread);
                }
            }
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Serialize the loaded filenames
    ///
    /// Regular lines come first. With a recorder attached its slot always
    /// follows, empty while the recorder's line names no file.
    pub fn get_state_information(&self) -> Vec<u8> {
        let inner = self.lock();
        let names: Vec<String> = inner
            .lines
            .iter()
            .map(|l| {
                l.path()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        state::encode_filenames(&names)
    }

    /// Restore filenames saved by [`AudioPlayer::get_state_information`]
    ///
    /// With a recorder attached and more than one entry, the last entry is
    /// the recorder's take. Files that fail to load leave their line empty.
    ///
    /// # Errors
    /// * `CorruptState` - If the blob is malformed or lists no files
    pub fn set_state_information(&self, data: &[u8]) -> Result<()> {
        let mut names = state::decode_filenames(data)?;
        if names.is_empty() {
            return Err(TransportError::CorruptState {
                reason: "no files listed".to_string(),
            });
        }

        let take = if self.has_recorder() && names.len() > 1 {
            names.pop()
        } else {
            None
        };
        if names.len() > MAX_LINES {
            warn!(
                "[PLAYER] Restoring {} of {} saved lines",
                MAX_LINES,
                names.len()
            );
            names.truncate(MAX_LINES);
        }

        self.set_num_files(names.len())?;
        for (index, name) in names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            if let Err(e) = self.open_file(Path::new(name), index) {
                warn!("[PLAYER] Could not restore line {}: {}", index, e);
            }
        }

        if let (Some(take), Some(index)) = (take.filter(|t| !t.is_empty()), self.recorder_line()) {
            if let Err(e) = self.open_file(Path::new(&take), index) {
                warn!("[PLAYER] Could not restore take {}: {}", take, e);
            }
        }
        Ok(())
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.coordinator.player_killed(self);
    }
}

/// Forward a request to a ready recorder
///
/// # Returns
/// `true` if the recorder accepted it
fn cascade(recorder: &Option<Arc<RecorderLine>>, request: TransportRequest) -> bool {
    let Some(recorder) = recorder else {
        return false;
    };
    if !recorder.is_ready_to_record() {
        return false;
    }
    match recorder.request(request, RequestOrigin::Cascade) {
        Ok(_) => true,
        Err(e) => {
            debug!("[PLAYER] Recorder ignored {:?}: {}", request, e);
            false
        }
    }
}

/// Fails if `line` stopped or started being the recorder's line
fn check_same_role(inner: &PlayerInner, line: usize, was_recorder_line: bool) -> Result<()> {
    if (inner.recorder_line() == Some(line)) == was_recorder_line {
        Ok(())
    } else {
        Err(TransportError::LineReassigned { index: line })
    }
}

fn check_file_count(num_files: usize) -> Result<()> {
    if (1..=MAX_LINES).contains(&num_files) {
        Ok(())
    } else {
        Err(TransportError::InvalidFileCount {
            requested: num_files,
            max: MAX_LINES,
        })
    }
}
