//! Audio-related small types and handles.
//!
//! This module defines common enums and type aliases used by the
//! audio subsystem (looping mode, commands, playback info and errors).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stop at the end of the current queue.
    NoLoop,
    /// Wrap around to the start of the current queue.
    #[default]
    LoopAll,
    /// Repeat the current track when it ends.
    LoopOne,
}

impl LoopMode {
    /// `NoLoop -> LoopAll -> LoopOne -> NoLoop`.
    pub fn cycled(self) -> Self {
        match self {
            LoopMode::NoLoop => LoopMode::LoopAll,
            LoopMode::LoopAll => LoopMode::LoopOne,
            LoopMode::LoopOne => LoopMode::NoLoop,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCmd {
    /// Start playing the track at the given library index.
    Play(usize),
    Pause,
    Resume,
    /// Stop playback immediately.
    Stop,
    /// Replace the queue that next/prev and auto-advance walk through.
    SetQueue(Vec<usize>),
    SetLoopMode(LoopMode),
    Next,
    Prev,
    /// Output volume, 0-100.
    SetVolume(u8),
    /// Jump to an absolute position in the current track.
    SeekTo(Duration),
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(i32),
    /// Fade the current track out, then stop. Used by the sleep timer.
    FadeOutAndStop { fade_out_ms: u64 },
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Runtime playback information shared with the UI.
pub struct PlaybackInfo {
    /// Currently loaded track index in the library (if any).
    pub index: Option<usize>,
    /// Elapsed playback time for the current track.
    pub elapsed: Duration,
    /// Whether playback is currently active.
    pub playing: bool,
    /// Output volume, 0-100.
    pub volume: u8,
}

impl Default for PlaybackInfo {
    fn default() -> Self {
        Self {
            index: None,
            elapsed: Duration::ZERO,
            playing: false,
            volume: 100,
        }
    }
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio thread is not running")]
    Disconnected,
    #[error("no audio output device: {0}")]
    NoDevice(String),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
}
