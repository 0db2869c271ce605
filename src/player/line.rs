//! One playback line

use std::path::{Path, PathBuf};

use crate::engine::source::ReaderSource;

/// A playback line: an optional source, its file name and a mute flag
///
/// A line can carry a name without a source, which is how the recorder's
/// line looks while its take does not exist yet.
#[derive(Default)]
pub struct Line {
    pub source: Option<ReaderSource>,
    pub filename: Option<PathBuf>,
    pub muted: bool,
}

impl Line {
    /// True if a source is attached
    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Length of the attached source in samples, 0 when unloaded
    pub fn length(&self) -> u64 {
        self.source.as_ref().map(ReaderSource::total_length).unwrap_or(0)
    }

    /// Cursor of the attached source
    pub fn position(&self) -> Option<u64> {
        self.source.as_ref().map(ReaderSource::next_read_position)
    }

    /// Full path of the file, if named
    pub fn path(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// File name without directories, if named
    pub fn display_name(&self) -> Option<String> {
        self.filename
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Drop the source and the name; the mute flag survives
    pub fn unload(&mut self) {
        self.source = None;
        self.filename = None;
    }
}
