//! Typed player events.
//!
//! The audio thread and the UI-side components publish `PlayerEvent`s on an
//! `EventBus`; the runtime drains the bus once per loop iteration and hands
//! each event to the modal controller, the history, the notification area
//! and the analytics forwarder.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::library::TrackId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Added,
    Removed,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback began from a stopped state.
    AudioStarted { index: usize },
    /// Play/pause flipped. `index` is `None` once playback is stopped.
    AudioStateChange { playing: bool, index: Option<usize> },
    /// A different track became current.
    TrackChanged { index: usize },
    /// The current track ran to its end.
    TrackEnded { index: usize },
    /// The audio thread could not open or decode a track.
    PlaybackFailed { index: usize, reason: String },
    /// First user gesture recorded; persisted so it is only emitted once.
    UserInteractionGranted,
    FavoritesUpdated {
        action: FavoriteAction,
        track_id: Option<TrackId>,
    },
    SleepTimerSet { minutes: u32 },
    SleepTimerCancelled,
    SleepTimerFired,
    /// The user rated the app, 1-5 stars.
    RatingSubmitted { stars: u8 },
}

pub type EventSender = Sender<PlayerEvent>;

pub struct EventBus {
    tx: Sender<PlayerEvent>,
    rx: Receiver<PlayerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// A sender for producers living on other threads.
    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    pub fn publish(&self, event: PlayerEvent) {
        // The receiver lives as long as `self`, so this cannot fail.
        let _ = self.tx.send(event);
    }

    /// Take every event queued so far, oldest first.
    pub fn drain(&self) -> Vec<PlayerEvent> {
        self.rx.try_iter().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn drain_returns_events_in_publish_order_across_threads() {
        let bus = EventBus::new();
        let tx = bus.sender();
        thread::spawn(move || {
            tx.send(PlayerEvent::AudioStarted { index: 2 }).unwrap();
            tx.send(PlayerEvent::TrackChanged { index: 2 }).unwrap();
        })
        .join()
        .unwrap();
        bus.publish(PlayerEvent::SleepTimerFired);

        assert_eq!(
            bus.drain(),
            vec![
                PlayerEvent::AudioStarted { index: 2 },
                PlayerEvent::TrackChanged { index: 2 },
                PlayerEvent::SleepTimerFired,
            ]
        );
        assert!(bus.drain().is_empty());
    }
}
