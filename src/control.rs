//! The playback shim: one owned object the UI drives playback through.
//!
//! `PlayerControl` pairs the library with an `AudioBackend` and keeps the
//! UI-side `PlaybackState` (what the user last asked for, refreshed from the
//! audio thread's snapshot on every `sync`). Nothing here panics: failures
//! come back as `false` and a log line.

use std::time::Duration;

use tracing::warn;

use crate::audio::{AudioBackend, AudioCmd, LoopMode};
use crate::library::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_track_index: Option<usize>,
    /// 0-100.
    pub volume: u8,
}

pub struct PlayerControl<B: AudioBackend> {
    backend: B,
    tracks: Vec<Track>,
    state: PlaybackState,
    elapsed: Duration,
    /// Track index sent with the last `Play` that the audio thread has not
    /// reported yet.
    pending_play: Option<usize>,
}

impl<B: AudioBackend> PlayerControl<B> {
    pub fn new(backend: B, tracks: Vec<Track>, volume: u8) -> Self {
        Self {
            backend,
            tracks,
            state: PlaybackState {
                is_playing: false,
                current_track_index: None,
                volume: volume.min(100),
            },
            elapsed: Duration::ZERO,
            pending_play: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Elapsed time of the current track as of the last `sync`.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current_track_index.and_then(|i| self.tracks.get(i))
    }

    fn dispatch(&self, cmd: AudioCmd) -> bool {
        match self.backend.send(cmd) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "audio command dropped");
                false
            }
        }
    }

    /// Linear scan for `file_name` inside `category`.
    pub fn find_track(&self, category: &str, file_name: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.matches(category, file_name))
    }

    /// Play `file_name` from `category`. Unknown tracks return `false` and
    /// leave the playback state untouched.
    pub fn play_track(&mut self, category: &str, file_name: &str) -> bool {
        match self.find_track(category, file_name) {
            Some(index) => self.play_index(index),
            None => {
                warn!(category, file_name, "no such track");
                false
            }
        }
    }

    pub fn play_index(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        if !self.dispatch(AudioCmd::Play(index)) {
            return false;
        }
        self.state.current_track_index = Some(index);
        self.state.is_playing = true;
        self.elapsed = Duration::ZERO;
        self.pending_play = Some(index);
        true
    }

    /// Resume the loaded track, or start `fallback` when nothing is loaded.
    pub fn play(&mut self, fallback: Option<usize>) -> bool {
        if self.state.current_track_index.is_some() {
            if self.state.is_playing {
                return true;
            }
            if !self.dispatch(AudioCmd::Resume) {
                return false;
            }
            self.state.is_playing = true;
            true
        } else {
            fallback.is_some_and(|i| self.play_index(i))
        }
    }

    pub fn pause(&mut self) -> bool {
        if !self.state.is_playing {
            return false;
        }
        if !self.dispatch(AudioCmd::Pause) {
            return false;
        }
        self.state.is_playing = false;
        true
    }

    /// Play/pause toggle. Returns the resulting `is_playing`.
    pub fn toggle(&mut self, fallback: Option<usize>) -> bool {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play(fallback);
        }
        self.state.is_playing
    }

    /// Pause when `index` is the playing track, otherwise switch to it.
    /// Returns the resulting `is_playing`.
    pub fn toggle_track(&mut self, index: usize) -> bool {
        if self.state.is_playing && self.state.current_track_index == Some(index) {
            self.pause();
            false
        } else {
            self.play_index(index)
        }
    }

    pub fn stop(&mut self) -> bool {
        if !self.dispatch(AudioCmd::Stop) {
            return false;
        }
        self.state.is_playing = false;
        self.state.current_track_index = None;
        self.elapsed = Duration::ZERO;
        self.pending_play = None;
        true
    }

    pub fn next(&mut self) -> bool {
        let sent = !self.tracks.is_empty() && self.dispatch(AudioCmd::Next);
        if sent {
            self.pending_play = None;
        }
        sent
    }

    pub fn previous(&mut self) -> bool {
        let sent = !self.tracks.is_empty() && self.dispatch(AudioCmd::Prev);
        if sent {
            self.pending_play = None;
        }
        sent
    }

    /// Set the volume, clamped to 0-100. Returns the applied value.
    pub fn set_volume(&mut self, volume: i32) -> u8 {
        let volume = volume.clamp(0, 100) as u8;
        if self.dispatch(AudioCmd::SetVolume(volume)) {
            self.state.volume = volume;
        }
        self.state.volume
    }

    pub fn adjust_volume(&mut self, delta: i32) -> u8 {
        self.set_volume(i32::from(self.state.volume) + delta)
    }

    /// Seek to `percent` (clamped to 0-100) of the current track.
    pub fn seek_to(&mut self, percent: f32) -> bool {
        let Some(total) = self.current_track().and_then(|t| t.duration) else {
            return false;
        };
        let fraction = percent.clamp(0.0, 100.0) / 100.0;
        let target = total.mul_f32(fraction);
        if !self.dispatch(AudioCmd::SeekTo(target)) {
            return false;
        }
        self.elapsed = target;
        true
    }

    pub fn seek_by(&mut self, secs: i32) -> bool {
        self.state.current_track_index.is_some() && self.dispatch(AudioCmd::SeekBy(secs))
    }

    pub fn set_queue(&mut self, indices: Vec<usize>) -> bool {
        self.dispatch(AudioCmd::SetQueue(indices))
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) -> bool {
        self.dispatch(AudioCmd::SetLoopMode(mode))
    }

    /// Sleep-timer completion: fade out, then stop.
    ///
    /// The local state is reset even when the backend is gone.
    pub fn fade_out_and_stop(&mut self, fade_out_ms: u64) -> bool {
        let sent = self.dispatch(AudioCmd::FadeOutAndStop { fade_out_ms });
        self.state.is_playing = false;
        self.state.current_track_index = None;
        self.elapsed = Duration::ZERO;
        self.pending_play = None;
        sent
    }

    /// The audio thread could not start `index`; stop waiting for it.
    pub fn playback_failed(&mut self, index: usize) {
        if self.pending_play == Some(index) {
            self.pending_play = None;
        }
    }

    /// Refresh from the audio thread's snapshot.
    ///
    /// After `play_index` the snapshot may still describe the previous
    /// track; the requested state is kept until the audio thread reports
    /// the new index.
    pub fn sync(&mut self) {
        if let Some(info) = self.backend.playback() {
            self.state.volume = info.volume;
            if let Some(pending) = self.pending_play {
                if info.index != Some(pending) {
                    return;
                }
                self.pending_play = None;
            }
            self.state.is_playing = info.playing;
            self.state.current_track_index = info.index;
            self.elapsed = info.elapsed;
        }
    }
}

#[cfg(test)]
mod tests;
