//! In-memory `AudioBackend` for tests.

use std::cell::RefCell;

use super::{AudioBackend, AudioCmd, AudioError, PlaybackInfo};

/// Records every command; optionally refuses them all, as a dead audio
/// thread would.
#[derive(Default)]
pub struct RecordingBackend {
    pub sent: RefCell<Vec<AudioCmd>>,
    pub info: RefCell<Option<PlaybackInfo>>,
    pub disconnected: bool,
}

impl RecordingBackend {
    pub fn disconnected() -> Self {
        Self {
            disconnected: true,
            ..Self::default()
        }
    }

    pub fn take_sent(&self) -> Vec<AudioCmd> {
        self.sent.borrow_mut().drain(..).collect()
    }

    pub fn set_info(&self, info: PlaybackInfo) {
        *self.info.borrow_mut() = Some(info);
    }
}

impl AudioBackend for RecordingBackend {
    fn send(&self, cmd: AudioCmd) -> Result<(), AudioError> {
        if self.disconnected {
            return Err(AudioError::Disconnected);
        }
        self.sent.borrow_mut().push(cmd);
        Ok(())
    }

    fn playback(&self) -> Option<PlaybackInfo> {
        self.info.borrow().clone()
    }
}
