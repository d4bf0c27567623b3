//! Now-playing overlay visibility.
//!
//! A tiny observer: playback starting opens the overlay, `Esc` closes it.

use crossterm::event::KeyCode;

use crate::events::PlayerEvent;

#[derive(Debug, Default)]
pub struct PlayerModal {
    visible: bool,
    show_on_play: bool,
}

impl PlayerModal {
    pub fn new(show_on_play: bool) -> Self {
        Self {
            visible: false,
            show_on_play,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Inverse of `is_visible`; the renderer skips the overlay when set.
    pub fn aria_hidden(&self) -> bool {
        !self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// The user explicitly asked for a track. Reopens the overlay even when
    /// playback was already running.
    pub fn play_requested(&mut self) {
        if self.show_on_play {
            self.show();
        }
    }

    /// React to a playback event.
    pub fn observe(&mut self, event: &PlayerEvent) {
        if !self.show_on_play {
            return;
        }
        match event {
            PlayerEvent::AudioStarted { .. }
            | PlayerEvent::AudioStateChange { playing: true, .. } => self.show(),
            _ => {}
        }
    }

    /// Returns `true` when the key was consumed.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if code == KeyCode::Esc && self.visible {
            self.hide();
            return true;
        }
        false
    }
}
