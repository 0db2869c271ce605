//! Recorder Line
//!
//! Captures the host's input into a WAV take while the player plays. The
//! recorder's transport is driven mostly by the player: starting playback
//! starts recording, pausing pauses it, and stopping (or reaching the end)
//! unloads it, which finalizes the take so the player can load it back.
//!
//! Disk writes happen on a background [`TimeSliceThread`]; the audio
//! thread only pushes into the writer's ring.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;
use log::{debug, info, warn};

use crate::config::RecorderConfig;
use crate::coordinator::Coordinator;
use crate::engine::buffer::AudioBuffer;
use crate::engine::thread::TimeSliceThread;
use crate::engine::transport::{RequestOrigin, TransportMachine, TransportRequest, TransportState};
use crate::engine::writer::ThreadedWriter;
use crate::error::{Result, TransportError};
use crate::player::state::{read_string, write_string};

/// Summary of a finalized take
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeInfo {
    pub path: PathBuf,
    /// Sample frames in the file
    pub frames: u64,
    /// Blocks dropped because the write ring was full
    pub overruns: u64,
}

struct RecorderInner {
    machine: TransportMachine,
    filename: Option<PathBuf>,
    writer: Option<ThreadedWriter>,
    /// Set while a take is being finalized outside the lock
    closing: bool,
    sample_rate: f64,
    last_take: Option<TakeInfo>,
}

/// Input capture line registered with a [`Coordinator`]
pub struct RecorderLine {
    config: RecorderConfig,
    coordinator: Arc<Coordinator>,
    write_thread: TimeSliceThread,
    inner: Mutex<RecorderInner>,
}

impl RecorderLine {
    /// Create a recorder and register it with the coordinator
    ///
    /// A player already registered picks the recorder up immediately.
    ///
    /// # Errors
    /// * `Io` - If the writer thread cannot be spawned
    pub fn new(coordinator: &Arc<Coordinator>, config: RecorderConfig) -> Result<Arc<Self>> {
        let recorder = Arc::new(Self {
            config,
            coordinator: Arc::clone(coordinator),
            write_thread: TimeSliceThread::spawn("AUDIO_WRITER")?,
            inner: Mutex::new(RecorderInner {
                machine: TransportMachine::recorder(),
                filename: None,
                writer: None,
                closing: false,
                sample_rate: 44100.0,
                last_take: None,
            }),
        });
        coordinator.set_recorder(&recorder);
        Ok(recorder)
    }

    fn lock(&self) -> MutexGuard<'_, RecorderInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Settings the recorder was created with
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Current (possibly intermediate) transport state
    pub fn state(&self) -> TransportState {
        self.lock().machine.state()
    }

    /// True once armed, i.e. in `Stopped` or above
    pub fn is_ready_to_record(&self) -> bool {
        self.state().is_ready()
    }

    /// True while input is being captured
    pub fn is_recording(&self) -> bool {
        self.state() == TransportState::Recording
    }

    /// True in `NoFile` with no take still being finalized
    pub fn is_idle(&self) -> bool {
        let inner = self.lock();
        inner.machine.state() == TransportState::NoFile && !inner.closing
    }

    /// Path of the take
    pub fn filename(&self) -> Option<PathBuf> {
        self.lock().filename.clone()
    }

    /// The most recently finalized take
    pub fn last_take(&self) -> Option<TakeInfo> {
        self.lock().last_take.clone()
    }

    /// Overruns of the take currently being written
    pub fn overruns(&self) -> u64 {
        self.lock()
            .writer
            .as_ref()
            .map(ThreadedWriter::overruns)
            .unwrap_or(0)
    }

    /// Name the next take
    ///
    /// Closes any open take and returns the transport to `NoFile`.
    pub fn set_filename(&self, path: impl Into<PathBuf>) {
        self.rename(Some(path.into()));
    }

    /// Forget the take name; the next `arm` generates one
    pub fn clear_filename(&self) {
        self.rename(None);
    }

    fn rename(&self, filename: Option<PathBuf>) {
        let writer = {
            let mut inner = self.lock();
            inner.machine.reset(TransportState::NoFile);
            inner.filename = filename;
            let writer = inner.writer.take();
            inner.closing = writer.is_some();
            writer
        };
        if let Some(writer) = writer {
            self.finish(writer);
        }
    }

    /// Host sample rate for new takes
    pub fn prepare_to_play(&self, sample_rate: f64, _block_size: usize) {
        if sample_rate > 0.0 {
            self.lock().sample_rate = sample_rate;
        }
    }

    // ========================================================================
    // Arming
    // ========================================================================

    /// Open a writer for the take and move `NoFile -> Stopped`
    ///
    /// Without a filename a timestamped one is created in the configured
    /// take directory.
    ///
    /// # Returns
    /// The path of the armed take
    ///
    /// # Errors
    /// * `IllegalTransition` - If the recorder is not in `NoFile`
    /// * `Io` / `Wav` - If the file cannot be created
    pub fn arm(&self) -> Result<PathBuf> {
        self.arm_avoiding(&[])
    }

    /// [`RecorderLine::arm`], refusing a take name listed in `in_use`
    ///
    /// `in_use[i]` is the file playing on line `i`, if any.
    ///
    /// # Errors
    /// * `FileInUse` - If the take name appears in `in_use`
    /// * anything [`RecorderLine::arm`] reports
    pub fn arm_avoiding(&self, in_use: &[Option<PathBuf>]) -> Result<PathBuf> {
        let (path, sample_rate) = {
            let mut inner = self.lock();
            let state = inner.machine.state();
            if state != TransportState::NoFile || inner.closing {
                return Err(TransportError::IllegalTransition {
                    from: state,
                    requested: TransportState::Stopped,
                });
            }
            let take_directory = &self.config.take_directory;
            let path = inner
                .filename
                .get_or_insert_with(|| default_take_path(take_directory))
                .clone();
            (path, inner.sample_rate)
        };
        if let Some(line) = in_use.iter().position(|p| p.as_deref() == Some(path.as_path())) {
            return Err(TransportError::FileInUse { path, line });
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = ThreadedWriter::create(
            &path,
            self.config.num_channels,
            sample_rate.round() as u32,
            self.config.bit_depth,
            self.config.write_buffer_samples,
            &self.write_thread,
        )?;

        let mut inner = self.lock();
        let state = inner.machine.state();
        if state != TransportState::NoFile || inner.filename.as_deref() != Some(path.as_path()) {
            drop(inner);
            self.finish(writer);
            return Err(TransportError::IllegalTransition {
                from: state,
                requested: TransportState::Stopped,
            });
        }
        inner.writer = Some(writer);
        inner.machine.reset(TransportState::Stopped);
        info!("[RECORDER] Armed {}", path.display());
        Ok(path)
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Request a transition
    ///
    /// # Errors
    /// * `IllegalTransition` - If the request is not legal in the current state
    pub fn request(&self, request: TransportRequest, origin: RequestOrigin) -> Result<TransportState> {
        self.lock().machine.request(request, origin)
    }

    /// Request `Recording`
    pub fn record(&self) -> Result<TransportState> {
        self.request(TransportRequest::Start, RequestOrigin::Control)
    }

    /// Request `Paused`
    pub fn pause(&self) -> Result<TransportState> {
        self.request(TransportRequest::Pause, RequestOrigin::Control)
    }

    /// Request `Stopped`; the take stays open
    pub fn stop(&self) -> Result<TransportState> {
        self.request(TransportRequest::Stop, RequestOrigin::Control)
    }

    /// Request `NoFile`, finalizing the take
    pub fn unload(&self) -> Result<TransportState> {
        self.request(TransportRequest::Unload, RequestOrigin::Control)
    }

    /// Commit pending requests
    ///
    /// A committed unload finalizes the take after the lock is released;
    /// [`RecorderLine::is_idle`] turns true once the file is complete.
    pub fn tick(&self) {
        let finished = {
            let mut inner = self.lock();
            let mut finished = None;
            for commit in inner.machine.commit_pending() {
                match commit.to {
                    TransportState::Recording => info!("[RECORDER] Recording"),
                    TransportState::NoFile => finished = inner.writer.take().or(finished),
                    other => debug!("[RECORDER] {}", other),
                }
            }
            inner.closing |= finished.is_some();
            finished
        };
        if let Some(writer) = finished {
            self.finish(writer);
        }
    }

    fn finish(&self, writer: ThreadedWriter) {
        let path = writer.path().to_path_buf();
        let overruns = writer.overruns();
        let take = match writer.finalize() {
            Ok(frames) => {
                info!(
                    "[RECORDER] Take {} finished ({} frames)",
                    path.display(),
                    frames
                );
                if overruns > 0 {
                    warn!("[RECORDER] {} blocks dropped in {}", overruns, path.display());
                }
                Some(TakeInfo {
                    path,
                    frames,
                    overruns,
                })
            }
            Err(e) => {
                warn!("[RECORDER] Failed to finalize {}: {}", path.display(), e);
                None
            }
        };

        let mut inner = self.lock();
        inner.closing = false;
        if take.is_some() {
            inner.last_take = take;
        }
    }

    // ========================================================================
    // Audio
    // ========================================================================

    /// Capture one block of input
    ///
    /// Writes only while `Recording`. Never blocks on disk.
    pub fn process_block(&self, input: &AudioBuffer) {
        let mut inner = self.lock();
        if inner.machine.state() != TransportState::Recording {
            return;
        }
        if let Some(writer) = inner.writer.as_mut() {
            writer.write(input, input.num_samples());
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Serialize the take name
    pub fn get_state_information(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let name = self
            .filename()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        write_string(&mut out, &name);
        out
    }

    /// Restore the take name
    ///
    /// # Errors
    /// * `CorruptState` - If the blob is not a NUL-terminated UTF-8 string
    pub fn set_state_information(&self, data: &[u8]) -> Result<()> {
        let (name, _) = read_string(data)?;
        if name.is_empty() {
            self.clear_filename();
        } else {
            self.set_filename(name);
        }
        Ok(())
    }
}

impl Drop for RecorderLine {
    fn drop(&mut self) {
        self.coordinator.recorder_killed(self);
        let writer = match self.inner.get_mut() {
            Ok(inner) => inner.writer.take(),
            Err(poisoned) => poisoned.into_inner().writer.take(),
        };
        if let Some(writer) = writer {
            if let Err(e) = writer.finalize() {
                warn!("[RECORDER] Failed to finalize take on drop: {}", e);
            }
        }
    }
}

fn default_take_path(directory: &Path) -> PathBuf {
    directory.join(format!("take_{}.wav", Local::now().format("%Y%m%d_%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;
    use tempfile::tempdir;

    fn recorder_in(dir: &Path) -> Arc<RecorderLine> {
        let config = RecorderConfig {
            take_directory: dir.to_path_buf(),
            bit_depth: 32,
            ..RecorderConfig::default()
        };
        RecorderLine::new(&Coordinator::new(), config).unwrap()
    }

    #[test]
    fn test_arm_requires_no_file() {
        let dir = tempdir().unwrap();
        let recorder = recorder_in(dir.path());
        recorder.set_filename(dir.path().join("a.wav"));
        recorder.arm().unwrap();
        assert_eq!(recorder.state(), TransportState::Stopped);
        assert!(recorder.is_ready_to_record());
        assert!(recorder.arm().is_err());
    }

    #[test]
    fn test_arm_avoiding_refuses_file_in_use() {
        let dir = tempdir().unwrap();
        let recorder = recorder_in(dir.path());
        let path = dir.path().join("backing.wav");
        recorder.set_filename(&path);

        let in_use = vec![None, Some(path.clone())];
        let err = recorder.arm_avoiding(&in_use).unwrap_err();
        assert!(matches!(err, TransportError::FileInUse { line: 1, .. }));
        assert_eq!(recorder.state(), TransportState::NoFile);
        assert!(!path.exists());
    }

    #[test]
    fn test_arm_generates_take_name() {
        let dir = tempdir().unwrap();
        let recorder = recorder_in(&dir.path().join("takes"));
        let path = recorder.arm().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("take_"));
        assert!(name.ends_with(".wav"));
        assert!(path.exists());
        assert_eq!(recorder.filename(), Some(path));
    }

    #[test]
    fn test_records_only_while_recording() {
        let dir = tempdir().unwrap();
        let recorder = recorder_in(dir.path());
        let path = dir.path().join("take.wav");
        recorder.set_filename(&path);
        recorder.prepare_to_play(48000.0, 128);
        recorder.arm().unwrap();

        let mut block = AudioBuffer::new(2, 128);
        block.samples[0].fill(0.5);
        recorder.process_block(&block);

        recorder.record().unwrap();
        recorder.process_block(&block);
        recorder.tick();
        assert!(recorder.is_recording());
        recorder.process_block(&block);
        recorder.process_block(&block);

        recorder.unload().unwrap();
        recorder.tick();
        assert_eq!(recorder.state(), TransportState::NoFile);
        assert!(recorder.is_idle());

        let take = recorder.last_take().unwrap();
        assert_eq!(take.frames, 256);
        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 256);
        assert_eq!(reader.spec().sample_rate, 48000);
    }

    #[test]
    fn test_set_filename_closes_take() {
        let dir = tempdir().unwrap();
        let recorder = recorder_in(dir.path());
        recorder.set_filename(dir.path().join("first.wav"));
        recorder.arm().unwrap();

        recorder.set_filename(dir.path().join("second.wav"));
        assert_eq!(recorder.state(), TransportState::NoFile);
        assert_eq!(recorder.last_take().unwrap().frames, 0);
    }

    #[test]
    fn test_cannot_record_unarmed() {
        let dir = tempdir().unwrap();
        let recorder = recorder_in(dir.path());
        assert!(recorder.record().is_err());
        assert_eq!(recorder.state(), TransportState::NoFile);
    }

    #[test]
    fn test_state_information_restores_name() {
        let dir = tempdir().unwrap();
        let recorder = recorder_in(dir.path());
        recorder.set_filename("/takes/vocal.wav");
        let blob = recorder.get_state_information();
        assert_eq!(blob, b"/takes/vocal.wav\0".to_vec());

        let other = recorder_in(dir.path());
        other.set_state_information(&blob).unwrap();
        assert_eq!(other.filename(), Some(PathBuf::from("/takes/vocal.wav")));
        assert!(other.set_state_information(b"no terminator").is_err());
    }
}
