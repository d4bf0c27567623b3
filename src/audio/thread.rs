use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::config::AudioSettings;
use crate::events::{EventSender, PlayerEvent};
use crate::library::Track;

use super::sink::create_sink_at;
use super::steps::{Step, fade_levels, fade_step_delay, gain, seek_target, step};
use super::types::{AudioCmd, AudioError, LoopMode, PlaybackHandle};

/// Number of volume steps used by sleep-timer and quit fade-outs.
const FADE_OUT_STEPS: u64 = 20;

pub(super) fn spawn_audio_thread(
    tracks: Vec<Track>,
    rx: Receiver<AudioCmd>,
    playback_info: PlaybackHandle,
    events: EventSender,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                let err = AudioError::NoDevice(e.to_string());
                error!(error = %err, "playback disabled");
                run_without_device(&rx, &events, &err.to_string());
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped; that would garble the TUI.
        stream.log_on_drop(false);

        let mut deck = Deck::new(stream, tracks, playback_info, events, audio_settings);
        loop {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(AudioCmd::Quit { fade_out_ms }) => {
                    deck.quit(fade_out_ms);
                    break;
                }
                Ok(cmd) => deck.handle(cmd),
                Err(RecvTimeoutError::Timeout) => deck.on_idle(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("audio thread finished");
    })
}

/// Keep the channel alive so senders never error, and report every play
/// request as failed.
fn run_without_device(rx: &Receiver<AudioCmd>, events: &EventSender, reason: &str) {
    for cmd in rx.iter() {
        match cmd {
            AudioCmd::Quit { .. } => break,
            AudioCmd::Play(index) => {
                let _ = events.send(PlayerEvent::PlaybackFailed {
                    index,
                    reason: reason.to_string(),
                });
            }
            _ => {}
        }
    }
}

/// Everything the audio thread owns: the output stream, the current sink
/// and the queue cursor.
struct Deck {
    stream: OutputStream,
    tracks: Vec<Track>,
    info: PlaybackHandle,
    events: EventSender,
    settings: AudioSettings,

    sink: Option<Sink>,
    index: Option<usize>,
    paused: bool,
    // Track start time and accumulated elapsed when paused.
    started_at: Option<Instant>,
    accumulated: Duration,

    // Usually the visible list: the current category or the filter results.
    queue: Vec<usize>,
    queue_pos: Option<usize>,
    loop_mode: LoopMode,
    volume: u8,
}

impl Deck {
    fn new(
        stream: OutputStream,
        tracks: Vec<Track>,
        info: PlaybackHandle,
        events: EventSender,
        settings: AudioSettings,
    ) -> Self {
        let volume = info.lock().map(|i| i.volume).unwrap_or(100);
        let queue = (0..tracks.len()).collect();
        Self {
            stream,
            tracks,
            info,
            events,
            settings,
            sink: None,
            index: None,
            paused: true,
            started_at: None,
            accumulated: Duration::ZERO,
            queue,
            queue_pos: None,
            loop_mode: LoopMode::default(),
            volume,
        }
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    fn is_playing(&self) -> bool {
        self.sink.is_some() && !self.paused
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn publish(&self) {
        if let Ok(mut info) = self.info.lock() {
            info.index = self.index;
            info.elapsed = self.elapsed();
            info.playing = self.is_playing();
            info.volume = self.volume;
        }
    }

    fn handle(&mut self, cmd: AudioCmd) {
        match cmd {
            AudioCmd::Play(i) => {
                // Playing something outside the queue makes it a queue of one.
                if !self.queue.contains(&i) {
                    self.queue = vec![i];
                }
                self.play(i);
            }
            AudioCmd::Pause => self.set_paused(true),
            AudioCmd::Resume => self.set_paused(false),
            AudioCmd::Stop => self.stop(),
            AudioCmd::SetQueue(queue) => self.set_queue(queue),
            AudioCmd::SetLoopMode(m) => self.loop_mode = m,
            AudioCmd::Next => self.advance(true, true),
            AudioCmd::Prev => self.advance(false, true),
            AudioCmd::SetVolume(v) => {
                self.volume = v.min(100);
                if let Some(s) = self.sink.as_ref() {
                    s.set_volume(gain(self.volume));
                }
            }
            AudioCmd::SeekTo(pos) => self.seek(pos),
            AudioCmd::SeekBy(secs) => {
                let total = self
                    .index
                    .and_then(|i| self.tracks.get(i))
                    .and_then(|t| t.duration);
                self.seek(seek_target(self.elapsed(), secs, total));
            }
            AudioCmd::FadeOutAndStop { fade_out_ms } => {
                self.fade_out(fade_out_ms);
                self.stop();
            }
            AudioCmd::Quit { fade_out_ms } => self.quit(fade_out_ms),
        }
        self.publish();
    }

    fn play(&mut self, i: usize) {
        let Some(track) = self.tracks.get(i) else {
            warn!(index = i, "play request for unknown track index");
            return;
        };
        let new_sink = match create_sink_at(&self.stream, track, Duration::ZERO) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "cannot play track");
                self.emit(PlayerEvent::PlaybackFailed {
                    index: i,
                    reason: e.to_string(),
                });
                return;
            }
        };
        debug!(index = i, track = %track.display_name, "playing");

        let target = gain(self.volume);
        let was_playing = self.is_playing();
        if let Some(old_sink) = self.sink.take() {
            if was_playing && self.settings.crossfade_ms > 0 {
                // Short blocking fade; rodio's mixer keeps both sinks audible meanwhile.
                let steps = self.settings.crossfade_steps.max(1);
                let delay = fade_step_delay(self.settings.crossfade_ms, steps);
                new_sink.set_volume(0.0);
                new_sink.play();
                for level in fade_levels(0.0, 1.0, steps) {
                    old_sink.set_volume(target * (1.0 - level));
                    new_sink.set_volume(target * level);
                    thread::sleep(delay);
                }
            }
            old_sink.stop();
        }

        new_sink.set_volume(target);
        new_sink.play();
        self.sink = Some(new_sink);
        self.paused = false;
        self.started_at = Some(Instant::now());
        self.accumulated = Duration::ZERO;
        if let Some(pos) = self.queue.iter().position(|&x| x == i) {
            self.queue_pos = Some(pos);
        }

        let previous = self.index.replace(i);
        if !was_playing {
            self.emit(PlayerEvent::AudioStarted { index: i });
            self.emit(PlayerEvent::AudioStateChange {
                playing: true,
                index: Some(i),
            });
        }
        if previous != Some(i) {
            self.emit(PlayerEvent::TrackChanged { index: i });
        }
    }

    fn set_paused(&mut self, pause: bool) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if pause == self.paused {
            return;
        }
        if pause {
            sink.pause();
            if let Some(st) = self.started_at.take() {
                self.accumulated += st.elapsed();
            }
        } else {
            sink.play();
            self.started_at = Some(Instant::now());
        }
        self.paused = pause;
        self.emit(PlayerEvent::AudioStateChange {
            playing: !pause,
            index: self.index,
        });
    }

    fn stop(&mut self) {
        let was_loaded = self.sink.is_some();
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.index = None;
        self.paused = true;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.queue_pos = None;
        if was_loaded {
            self.emit(PlayerEvent::AudioStateChange {
                playing: false,
                index: None,
            });
        }
    }

    fn set_queue(&mut self, mut queue: Vec<usize>) {
        // An empty queue (e.g. filter with no matches) makes next/prev no-ops.
        queue.retain(|&i| i < self.tracks.len());
        self.queue_pos = self
            .index
            .and_then(|i| queue.iter().position(|&x| x == i));
        self.queue = queue;
    }

    fn advance(&mut self, forward: bool, manual: bool) {
        if !manual && self.loop_mode == LoopMode::LoopOne {
            if let Some(i) = self.index {
                self.play(i);
                return;
            }
        }
        match step(
            self.queue_pos,
            self.queue.len(),
            self.loop_mode,
            forward,
            manual,
        ) {
            Step::To(pos) => {
                self.queue_pos = Some(pos);
                self.play(self.queue[pos]);
            }
            // Manual steps past the end do nothing; auto-advance stops.
            Step::End if !manual => self.stop(),
            Step::End => {}
        }
    }

    fn seek(&mut self, target: Duration) {
        let Some(i) = self.index else {
            return;
        };
        if self.sink.is_none() {
            return;
        }
        let new_sink = match create_sink_at(&self.stream, &self.tracks[i], target) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "seek failed");
                return;
            }
        };
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        new_sink.set_volume(gain(self.volume));
        if self.paused {
            self.started_at = None;
        } else {
            new_sink.play();
            self.started_at = Some(Instant::now());
        }
        self.sink = Some(new_sink);
        self.accumulated = target;
    }

    fn fade_out(&self, fade_out_ms: u64) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if self.paused || fade_out_ms == 0 {
            sink.set_volume(0.0);
            return;
        }
        let delay = fade_step_delay(fade_out_ms, FADE_OUT_STEPS);
        for level in fade_levels(gain(self.volume), 0.0, FADE_OUT_STEPS) {
            sink.set_volume(level);
            thread::sleep(delay);
        }
    }

    /// Periodic check for auto-advance; also refreshes the elapsed time.
    fn on_idle(&mut self) {
        let finished = matches!(self.sink.as_ref(), Some(s) if !self.paused && s.empty());
        if finished {
            if let Some(i) = self.index {
                self.emit(PlayerEvent::TrackEnded { index: i });
            }
            self.advance(true, false);
        }
        self.publish();
    }

    fn quit(&mut self, fade_out_ms: u64) {
        self.fade_out(fade_out_ms);
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.paused = true;
        self.started_at = None;
        // Update shared state so the UI doesn't keep showing Playing.
        self.publish();
    }
}
