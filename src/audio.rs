//! Audio playback on a dedicated thread.
//!
//! `AudioPlayer` owns the channel to the rodio thread. The rest of the app
//! talks to it through the `AudioBackend` trait so the playback shim can be
//! exercised without an output device.

mod player;
mod sink;
mod steps;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use types::*;

/// The seam between the playback shim and whatever produces sound.
pub trait AudioBackend {
    /// Queue a command for the audio thread.
    fn send(&self, cmd: AudioCmd) -> Result<(), AudioError>;

    /// Latest snapshot published by the audio thread, if any.
    fn playback(&self) -> Option<PlaybackInfo>;
}

#[cfg(test)]
pub mod testing;
