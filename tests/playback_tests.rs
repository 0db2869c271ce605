//! Playback Tests
//!
//! End-to-end behaviour of the multi-file player: line management,
//! lockstep rendering, end-of-file handling, seeking and persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use approx::assert_relative_eq;
use hound::{SampleFormat, WavSpec, WavWriter};
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};
use test_case::test_case;

use tapedeck::{AudioBuffer, AudioPlayer, Coordinator, PlayerConfig, RecorderConfig, RecorderLine};
use tapedeck::{TransportState, MAX_LINES};

const RATE: u32 = 48000;
const STEP: f32 = 1.0e-5;

/// Mono float WAV whose sample `i` is `i * STEP`
fn write_ramp(dir: &Path, name: &str, length: usize) -> PathBuf {
    let path = dir.join(name);
    let spec = WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for i in 0..length {
        writer.write_sample(i as f32 * STEP).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn player_config() -> PlayerConfig {
    PlayerConfig {
        read_timeout_ms: 2000,
        ..PlayerConfig::default()
    }
}

fn new_player(block_size: usize) -> Arc<AudioPlayer> {
    let player = AudioPlayer::new(&Coordinator::new(), player_config()).unwrap();
    player.prepare_to_play(f64::from(RATE), block_size);
    player
}

fn start_playing(player: &AudioPlayer) {
    assert_eq!(player.start().unwrap(), TransportState::Starting);
    player.tick();
    assert_eq!(player.transport_state(), TransportState::Playing);
}

fn three_files(dir: &TempDir, player: &AudioPlayer) {
    player.set_num_files(3).unwrap();
    player.open_file(&write_ramp(dir.path(), "a.wav", 1000), 0).unwrap();
    player.open_file(&write_ramp(dir.path(), "b.wav", 2500), 1).unwrap();
    player.open_file(&write_ramp(dir.path(), "c.wav", 1800), 2).unwrap();
}

// === Line Management ===

#[test_case(1 ; "one line")]
#[test_case(2 ; "two lines")]
#[test_case(9 ; "nine lines")]
#[test_case(MAX_LINES ; "max lines")]
fn test_num_files_without_recorder(n: usize) {
    let player = new_player(256);
    player.set_num_files(n).unwrap();
    assert_eq!(player.get_num_files(true), n);
    assert_eq!(player.get_num_files(false), n);
    assert_eq!(player.num_lines(), n);
}

#[test_case(1 ; "one line")]
#[test_case(4 ; "four lines")]
#[test_case(MAX_LINES ; "max lines")]
fn test_num_files_with_named_recorder(n: usize) {
    let dir = tempdir().unwrap();
    let coordinator = Coordinator::new();
    let recorder = RecorderLine::new(&coordinator, RecorderConfig::default()).unwrap();
    recorder.set_filename(dir.path().join("take.wav"));
    let player = AudioPlayer::new(&coordinator, player_config()).unwrap();

    player.set_num_files(n).unwrap();
    assert_eq!(player.get_num_files(true), n + 1);
    assert_eq!(player.get_num_files(false), n);
    assert_eq!(player.recorder_line(), Some(n));
}

#[test_case(0 ; "zero")]
#[test_case(MAX_LINES + 1 ; "one too many")]
fn test_num_files_out_of_range(n: usize) {
    let player = new_player(256);
    let err = player.set_num_files(n).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_FILE_COUNT");
    assert_eq!(player.get_num_files(false), 1);
}

#[test]
fn test_shrinking_releases_lines() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    three_files(&dir, &player);

    player.set_num_files(1).unwrap();
    assert_eq!(player.get_filename(0).as_deref(), Some("a.wav"));
    assert_eq!(player.get_filename(1), None);
    assert_eq!(player.total_length_samples(), 1000);
    assert_eq!(player.longest_line(), Some(0));
}

#[test]
fn test_missing_file_on_regular_line() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    let err = player
        .open_file(&dir.path().join("nope.wav"), 0)
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    assert_eq!(player.get_filename(0), None);
    assert_eq!(player.get_full_path(0), None);
    assert_eq!(player.transport_state(), TransportState::NoFile);
}

#[test]
fn test_missing_file_on_recorder_line() {
    let dir = tempdir().unwrap();
    let coordinator = Coordinator::new();
    let player = AudioPlayer::new(&coordinator, player_config()).unwrap();
    let recorder = RecorderLine::new(&coordinator, RecorderConfig::default()).unwrap();
    let take = dir.path().join("future_take.wav");

    let index = player.recorder_line().unwrap();
    player.open_file(&take, index).unwrap();
    assert_eq!(player.line_position(index), None);
    assert_eq!(player.get_full_path(index), Some(take.clone()));
    assert_eq!(recorder.filename(), Some(take));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not audio").unwrap();

    let player = new_player(256);
    let err = player.open_file(&path, 0).unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
}

#[test]
fn test_garbage_wav_is_invalid_audio() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"RIFF\x00\x00junk").unwrap();

    let player = new_player(256);
    assert!(player.open_file(&path, 0).is_err());
    assert_eq!(player.get_filename(0), None);
}

// === Lengths ===

#[test]
fn test_longest_line_defines_length() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    three_files(&dir, &player);

    assert_eq!(player.longest_line(), Some(1));
    assert_eq!(player.total_length_samples(), 2500);
    assert_relative_eq!(player.get_length_in_seconds(), 2500.0 / f64::from(RATE));
    assert!(player.is_ready_to_play());
}

#[test]
fn test_longest_line_tie_goes_to_first_line() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    player.set_num_files(3).unwrap();
    player.open_file(&write_ramp(dir.path(), "a.wav", 2500), 0).unwrap();
    player.open_file(&write_ramp(dir.path(), "b.wav", 1000), 1).unwrap();
    player.open_file(&write_ramp(dir.path(), "c.wav", 2500), 2).unwrap();
    assert_eq!(player.longest_line(), Some(0));

    player.open_file(&write_ramp(dir.path(), "short.wav", 800), 0).unwrap();
    assert_eq!(player.longest_line(), Some(2));
    assert_eq!(player.total_length_samples(), 2500);
}

// === Transport ===

#[test]
fn test_plays_to_end_and_rewinds() {
    let dir = tempdir().unwrap();
    let player = new_player(512);
    three_files(&dir, &player);
    start_playing(&player);

    let mut out = AudioBuffer::new(6, 512);
    for _ in 0..4 {
        player.process_block(&mut out);
        assert_eq!(player.transport_state(), TransportState::Playing);
    }
    // 5 * 512 passes the 2500 samples of the longest line
    player.process_block(&mut out);
    assert_eq!(player.transport_state(), TransportState::Stopping);

    player.process_block(&mut out);
    assert!(out.samples.iter().flatten().all(|&s| s == 0.0));

    player.tick();
    assert_eq!(player.transport_state(), TransportState::Stopped);
    for line in 0..3 {
        assert_eq!(player.line_position(line), Some(0));
    }
}

#[test]
fn test_losing_last_file_while_playing_returns_to_no_file() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    player.open_file(&write_ramp(dir.path(), "a.wav", 4800), 0).unwrap();
    start_playing(&player);

    assert!(player.open_file(&dir.path().join("missing.wav"), 0).is_err());
    assert_eq!(player.transport_state(), TransportState::NoFile);
    assert!(!player.is_ready_to_play());

    let mut out = AudioBuffer::new(2, 256);
    for _ in 0..10 {
        player.process_block(&mut out);
    }
    player.tick();
    assert_eq!(player.transport_state(), TransportState::NoFile);
    assert!(player.start().is_err());
}

#[test]
fn test_losing_last_file_while_paused_returns_to_no_file() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    player.open_file(&write_ramp(dir.path(), "a.wav", 4800), 0).unwrap();
    start_playing(&player);
    player.pause().unwrap();
    player.tick();
    assert_eq!(player.transport_state(), TransportState::Paused);

    assert!(player.open_file(&dir.path().join("missing.wav"), 0).is_err());
    assert_eq!(player.transport_state(), TransportState::NoFile);
}

#[test]
fn test_lines_render_on_their_buses() {
    let dir = tempdir().unwrap();
    let player = new_player(128);
    player.set_num_files(2).unwrap();
    player.open_file(&write_ramp(dir.path(), "a.wav", 1000), 0).unwrap();
    player.open_file(&write_ramp(dir.path(), "b.wav", 64), 1).unwrap();
    start_playing(&player);

    let mut out = AudioBuffer::new(4, 128);
    player.process_block(&mut out);

    assert_relative_eq!(out.samples[0][100], 100.0 * STEP);
    assert_relative_eq!(out.samples[1][100], 100.0 * STEP);
    assert_relative_eq!(out.samples[2][63], 63.0 * STEP);
    assert_eq!(out.samples[3][64], 0.0);
    assert_eq!(player.line_position(0), player.line_position(1));
}

#[test]
fn test_muted_line_advances_in_lockstep() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    let file = write_ramp(dir.path(), "a.wav", 5000);
    player.set_num_files(2).unwrap();
    player.open_file(&file, 0).unwrap();
    player.open_file(&file, 1).unwrap();
    player.set_muted(1, true).unwrap();
    start_playing(&player);

    let mut out = AudioBuffer::new(4, 256);
    for _ in 0..6 {
        player.process_block(&mut out);
        assert_eq!(player.line_position(0), player.line_position(1));
    }
    assert_eq!(player.line_position(1), Some(6 * 256));
    assert!(out.samples[0].iter().any(|&s| s != 0.0));
    assert!(out.samples[2].iter().all(|&s| s == 0.0));
    assert!(out.samples[3].iter().all(|&s| s == 0.0));
}

#[test]
fn test_line_without_bus_still_advances() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    let file = write_ramp(dir.path(), "a.wav", 5000);
    player.set_num_files(2).unwrap();
    player.open_file(&file, 0).unwrap();
    player.open_file(&file, 1).unwrap();
    start_playing(&player);

    // room for line 0 only
    let mut out = AudioBuffer::new(2, 256);
    player.process_block(&mut out);
    assert_eq!(player.line_position(1), Some(256));
}

#[test]
fn test_muted_line_handles_block_larger_than_prepared() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    let file = write_ramp(dir.path(), "a.wav", 5000);
    player.set_num_files(2).unwrap();
    player.open_file(&file, 0).unwrap();
    player.open_file(&file, 1).unwrap();
    player.set_muted(0, true).unwrap();
    start_playing(&player);

    let mut out = AudioBuffer::new(4, 1000);
    player.process_block(&mut out);
    assert_eq!(player.line_position(0), Some(1000));
    assert_eq!(player.line_position(1), Some(1000));
    assert!(out.samples[0].iter().all(|&s| s == 0.0));
    assert_relative_eq!(out.samples[2][999], 999.0 * STEP);
}

#[test]
fn test_muted_line_advances_without_prepare() {
    let dir = tempdir().unwrap();
    let player = AudioPlayer::new(&Coordinator::new(), player_config()).unwrap();
    player.open_file(&write_ramp(dir.path(), "a.wav", 5000), 0).unwrap();
    player.set_muted(0, true).unwrap();
    start_playing(&player);

    let mut out = AudioBuffer::new(2, 512);
    player.process_block(&mut out);
    player.process_block(&mut out);
    assert_eq!(player.line_position(0), Some(1024));
    assert!(out.samples.iter().flatten().all(|&s| s == 0.0));
}

#[test]
fn test_seek_while_playing() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    player.open_file(&write_ramp(dir.path(), "a.wav", 48000), 0).unwrap();
    start_playing(&player);

    let mut out = AudioBuffer::new(2, 256);
    player.process_block(&mut out);

    player.set_position(0.25);
    assert_eq!(player.transport_state(), TransportState::Starting);
    player.tick();
    assert_eq!(player.transport_state(), TransportState::Playing);

    player.process_block(&mut out);
    assert_relative_eq!(out.samples[0][0], 12000.0 * STEP);
    assert_relative_eq!(out.samples[0][255], 12255.0 * STEP);
    assert_relative_eq!(player.get_current_position(), 12256.0 / f64::from(RATE));
}

#[test]
fn test_seek_while_paused_stays_paused() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    player.open_file(&write_ramp(dir.path(), "a.wav", 48000), 0).unwrap();
    start_playing(&player);
    player.pause().unwrap();
    player.tick();

    player.set_position(0.5);
    player.tick();
    assert_eq!(player.transport_state(), TransportState::Paused);
    assert_eq!(player.line_position(0), Some(24000));
}

#[test]
fn test_seek_past_end_clamps_to_last_sample() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    three_files(&dir, &player);

    player.set_position(10.0);
    assert_eq!(player.line_position(0), Some(999));
    assert_eq!(player.line_position(1), Some(2499));
    assert_eq!(player.line_position(2), Some(1799));
}

#[test]
fn test_illegal_requests_are_rejected() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    assert!(player.pause().is_err());

    player.open_file(&write_ramp(dir.path(), "a.wav", 100), 0).unwrap();
    let err = player.pause().unwrap_err();
    assert_eq!(err.error_code(), "ILLEGAL_TRANSITION");
    assert_eq!(player.transport_state(), TransportState::Stopped);
}

#[test]
fn test_growing_while_playing_stops() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    player.open_file(&write_ramp(dir.path(), "a.wav", 4800), 0).unwrap();
    start_playing(&player);

    player.set_num_files(3).unwrap();
    assert_eq!(player.transport_state(), TransportState::Stopping);
    player.tick();
    assert_eq!(player.transport_state(), TransportState::Stopped);
    assert_eq!(player.get_filename(0).as_deref(), Some("a.wav"));
}

// === Persistence ===

#[test]
fn test_state_information_restores_lines() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    three_files(&dir, &player);
    let blob = player.get_state_information();

    let restored = new_player(256);
    restored.set_state_information(&blob).unwrap();
    assert_eq!(restored.get_num_files(false), 3);
    for line in 0..3 {
        assert_eq!(restored.get_full_path(line), player.get_full_path(line));
    }
    assert_eq!(restored.transport_state(), TransportState::Stopped);
    assert_eq!(restored.longest_line(), Some(1));
}

#[test]
fn test_state_information_skips_missing_files() {
    let dir = tempdir().unwrap();
    let player = new_player(256);
    player.set_num_files(2).unwrap();
    let kept = write_ramp(dir.path(), "kept.wav", 100);
    let gone = write_ramp(dir.path(), "gone.wav", 100);
    player.open_file(&kept, 0).unwrap();
    player.open_file(&gone, 1).unwrap();
    let blob = player.get_state_information();
    std::fs::remove_file(&gone).unwrap();

    let restored = new_player(256);
    restored.set_state_information(&blob).unwrap();
    assert_eq!(restored.get_num_files(false), 2);
    assert_eq!(restored.get_full_path(0), Some(kept));
    assert_eq!(restored.get_full_path(1), None);
}

#[test]
fn test_corrupt_state_information() {
    let player = new_player(256);
    let err = player.set_state_information(&[3, 0, 0, 0, b'a']).unwrap_err();
    assert_eq!(err.error_code(), "CORRUPT_STATE");
    assert!(player.set_state_information(&0i32.to_le_bytes()).is_err());
    assert_eq!(player.get_num_files(false), 1);
}
