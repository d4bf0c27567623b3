use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::AudioSettings;
use crate::events::EventSender;
use crate::library::Track;

use super::AudioBackend;
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, AudioError, PlaybackHandle, PlaybackInfo};

pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    pub fn new(tracks: Vec<Track>, audio_settings: AudioSettings, events: EventSender) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo {
            volume: audio_settings.initial_volume.min(100),
            ..PlaybackInfo::default()
        }));

        let audio_handle =
            spawn_audio_thread(tracks, rx, playback_info.clone(), events, audio_settings);

        Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
        }
    }

    /// Ask the audio thread to fade out and exit, then wait for it.
    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.tx.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl AudioBackend for AudioPlayer {
    fn send(&self, cmd: AudioCmd) -> Result<(), AudioError> {
        self.tx.send(cmd).map_err(|_| AudioError::Disconnected)
    }

    fn playback(&self) -> Option<PlaybackInfo> {
        self.playback.lock().ok().map(|info| info.clone())
    }
}
