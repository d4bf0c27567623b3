//! Application model: `App`.
//!
//! `App` owns every piece of UI-side state (the playback shim, the sleep
//! timer, the overlay, user data, translations and the toast) and exposes
//! the operations the key handlers call. It never touches the terminal.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::audio::{AudioBackend, LoopMode};
use crate::config::{Settings, Theme};
use crate::control::PlayerControl;
use crate::events::{EventSender, PlayerEvent};
use crate::i18n::I18n;
use crate::library::{self, Track};
use crate::modal::PlayerModal;
use crate::notify::Notifier;
use crate::timer::{SleepTimer, TimerChange, TimerTick};
use crate::user_data::{UserData, UserDataError};

/// The main application model.
pub struct App<B: AudioBackend> {
    pub player: PlayerControl<B>,
    pub timer: SleepTimer,
    pub modal: PlayerModal,
    pub user_data: UserData,
    pub i18n: I18n,
    pub notifier: Notifier,
    events: EventSender,

    categories: Vec<String>,
    category_pos: usize,
    // Lowercased display names, indexed like the tracks.
    lower_titles: Vec<String>,
    pub selected: usize,
    pub library_root: String,

    pub follow_playback: bool,
    pub pending_follow_index: Option<usize>,

    pub loop_mode: LoopMode,
    pub queue_dirty: bool,

    pub filter_mode: bool,
    pub filter_query: String,

    pub theme: Theme,

    timer_presets: Vec<u32>,
    timer_fade_out_ms: u64,
}

impl<B: AudioBackend> App<B> {
    pub fn new(
        player: PlayerControl<B>,
        i18n: I18n,
        user_data: UserData,
        events: EventSender,
        settings: &Settings,
    ) -> Self {
        let categories = library::categories(player.tracks());
        let lower_titles = player
            .tracks()
            .iter()
            .map(|t| t.display_name.to_lowercase())
            .collect();
        let notification_ttl = std::time::Duration::from_secs(settings.ui.notification_secs);
        let refresh = std::time::Duration::from_millis(settings.timer.refresh_interval_ms);
        let theme = user_data
            .theme()
            .and_then(Theme::from_name)
            .unwrap_or(settings.ui.theme);

        let mut app = Self {
            player,
            timer: SleepTimer::new(refresh),
            modal: PlayerModal::new(settings.ui.show_modal_on_play),
            user_data,
            i18n,
            notifier: Notifier::new(notification_ttl),
            events,
            categories,
            category_pos: 0,
            lower_titles,
            selected: 0,
            library_root: String::new(),
            follow_playback: settings.ui.follow_playback,
            pending_follow_index: None,
            loop_mode: LoopMode::default(),
            queue_dirty: true,
            filter_mode: false,
            filter_query: String::new(),
            theme,
            timer_presets: settings.timer.presets_minutes.clone(),
            timer_fade_out_ms: settings.timer.fade_out_ms,
        };
        app.ensure_selected_visible();
        app
    }

    fn publish(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    pub fn tracks(&self) -> &[Track] {
        self.player.tracks()
    }

    /// Return true if the library contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.tracks().is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_pos(&self) -> usize {
        self.category_pos
    }

    pub fn current_category(&self) -> Option<&str> {
        self.categories.get(self.category_pos).map(String::as_str)
    }

    pub fn is_favorite(&self, index: usize) -> bool {
        self.tracks()
            .get(index)
            .is_some_and(|t| self.user_data.is_favorite(&t.id()))
    }

    // Queue and view.

    /// Mark the queue as needing regeneration (the visible list changed).
    pub fn mark_queue_dirty(&mut self) {
        self.queue_dirty = true;
    }

    /// Push the visible list to the audio thread as the playback queue.
    pub fn sync_queue(&mut self) {
        if self.queue_dirty {
            let queue = self.display_indices();
            self.player.set_queue(queue);
            self.queue_dirty = false;
        }
    }

    /// Indices of the visible tracks: the current category, or every match
    /// of the filter query across all categories.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return match self.current_category() {
                Some(category) => library::indices_in_category(self.tracks(), category),
                None => Vec::new(),
            };
        }
        let query_lower = query.to_lowercase();
        (0..self.lower_titles.len())
            .filter(|&i| fuzzy_match_positions_lower(&self.lower_titles[i], &query_lower).is_some())
            .collect()
    }

    /// Character positions of the filter match inside track `index`'s
    /// display name.
    pub fn match_positions(&self, index: usize) -> Option<Vec<usize>> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return Some(Vec::new());
        }
        fuzzy_match_positions_lower(self.lower_titles.get(index)?, &query.to_lowercase())
    }

    /// Fuzzy/subsequence match: the character positions in `title` that
    /// match `query` (case-insensitive), or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        fuzzy_match_positions_lower(&title.to_lowercase(), &query.to_lowercase())
    }

    // Cursor.

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    /// Disable follow-playback and clear any pending follow index.
    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
        self.pending_follow_index = None;
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    /// Move selection to the first visible track when it fell out of view.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }

    /// The visible index after `current`, wrapping around.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }
        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// The visible index before `current`, wrapping around.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        let last = *display.last()?;
        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(last),
            Some(p) => Some(display[p - 1]),
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    pub fn next_category(&mut self) {
        self.shift_category(1);
    }

    pub fn prev_category(&mut self) {
        self.shift_category(-1);
    }

    fn shift_category(&mut self, delta: isize) {
        if self.categories.is_empty() {
            return;
        }
        let n = self.categories.len() as isize;
        self.category_pos = (self.category_pos as isize + delta).rem_euclid(n) as usize;
        self.follow_playback_off();
        self.mark_queue_dirty();
        self.select_first();
    }

    /// Put the cursor on `idx`, switching to its category when no filter
    /// is active.
    fn follow_index(&mut self, idx: usize) {
        if self.filter_query.trim().is_empty() {
            let category = self.tracks().get(idx).map(|t| t.category.clone());
            let pos = category.and_then(|c| self.categories.iter().position(|x| *x == c));
            if let Some(pos) = pos {
                if pos != self.category_pos {
                    self.category_pos = pos;
                    self.mark_queue_dirty();
                }
            }
        }
        self.selected = idx;
    }

    /// Adopt the audio thread's snapshot and move the cursor along with
    /// playback when following.
    pub fn sync_playback(&mut self) {
        self.player.sync();
        let Some(idx) = self.player.state().current_track_index else {
            return;
        };
        if !self.follow_playback || self.filter_mode {
            return;
        }
        match self.pending_follow_index {
            Some(pending) if pending == idx => {
                self.pending_follow_index = None;
                self.follow_index(idx);
            }
            Some(_) => {}
            None if self.selected != idx => self.follow_index(idx),
            None => {}
        }
    }

    // Filter.

    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.mark_queue_dirty();
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
        self.mark_queue_dirty();
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.mark_queue_dirty();
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.mark_queue_dirty();
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.mark_queue_dirty();
        self.ensure_selected_visible();
    }

    // Playback.

    /// Play the selected track, or pause it when it is the one playing.
    /// Returns whether something is playing afterwards.
    pub fn activate_selected(&mut self) -> bool {
        if !self.display_indices().contains(&self.selected) {
            return false;
        }
        self.sync_queue();
        self.follow_playback_on();
        self.pending_follow_index = Some(self.selected);
        let playing = self.player.toggle_track(self.selected);
        if playing {
            self.modal.play_requested();
        }
        playing
    }

    /// Play the most recent history entry again. Entries whose file is no
    /// longer in the library are reported and leave playback untouched.
    pub fn resume_last_played(&mut self, now: Instant) -> bool {
        let Some(last) = self.user_data.history(Some(1)).first().cloned() else {
            self.notifier.push(self.i18n.t("errors.resume"), now);
            return false;
        };
        if !self.player.play_track(&last.category, &last.file_name) {
            let text = self
                .i18n
                .t_with("errors.playback", &[("name", &last.display_name)]);
            self.notifier.push(text, now);
            return false;
        }
        self.modal.play_requested();
        self.follow_playback_on();
        if let Some(idx) = self.player.state().current_track_index {
            self.follow_index(idx);
            self.sync_queue();
        }
        true
    }

    /// Play/pause; starts the selected track when nothing is loaded.
    pub fn toggle_playback(&mut self) -> bool {
        if !self.filter_mode {
            self.follow_playback_on();
        }
        self.sync_queue();
        let fallback = self.display_indices().contains(&self.selected).then_some(self.selected);
        self.player.toggle(fallback)
    }

    pub fn next_track(&mut self) -> bool {
        if !self.filter_mode {
            self.follow_playback_on();
        }
        self.sync_queue();
        self.player.next()
    }

    pub fn prev_track(&mut self) -> bool {
        if !self.filter_mode {
            self.follow_playback_on();
        }
        self.sync_queue();
        self.player.previous()
    }

    /// Cycle `loop_mode` through `NoLoop -> LoopAll -> LoopOne`.
    pub fn cycle_loop_mode(&mut self) {
        self.loop_mode = self.loop_mode.cycled();
        self.player.set_loop_mode(self.loop_mode);
    }

    // Favorites.

    /// Toggle the selected track's favorite state. Returns the new state,
    /// or `None` when nothing changed.
    pub fn toggle_favorite(&mut self, now: Instant) -> Option<bool> {
        if !self.display_indices().contains(&self.selected) {
            return None;
        }
        let track = self.tracks().get(self.selected)?.clone();
        match self.user_data.toggle_favorite(&track, Utc::now()) {
            Ok((favorite, event)) => {
                self.publish(event);
                let key = if favorite {
                    "favorites.added"
                } else {
                    "favorites.removed"
                };
                let text = self.i18n.t_with(key, &[("name", &track.display_name)]);
                self.notifier.push(text, now);
                Some(favorite)
            }
            Err(UserDataError::FavoritesFull(_)) => {
                self.notifier.push(self.i18n.t("favorites.full"), now);
                None
            }
            Err(e) => {
                warn!(error = %e, "favorite not toggled");
                None
            }
        }
    }

    // Sleep timer.

    /// Start a countdown of `minutes`, replacing any running one; `0` cancels.
    pub fn set_sleep_timer(&mut self, minutes: u32, now: Instant) {
        match self.timer.set_timer(minutes, now) {
            TimerChange::Started { minutes } => {
                info!(minutes, "sleep timer set");
                self.publish(PlayerEvent::SleepTimerSet { minutes });
                let text = self
                    .i18n
                    .t_with("timer.set", &[("minutes", &minutes.to_string())]);
                self.notifier.push(text, now);
            }
            TimerChange::Cancelled { was_active } => {
                if was_active {
                    info!("sleep timer cancelled");
                    self.publish(PlayerEvent::SleepTimerCancelled);
                }
                self.notifier.push(self.i18n.t("timer.disabled"), now);
            }
        }
    }

    /// Step to the next configured preset.
    pub fn cycle_sleep_timer(&mut self, now: Instant) {
        let minutes = self.timer.next_preset(&self.timer_presets);
        self.set_sleep_timer(minutes, now);
    }

    pub fn cancel_sleep_timer(&mut self, now: Instant) {
        self.set_sleep_timer(0, now);
    }

    /// Advance time-driven state: the sleep timer and the toast.
    pub fn tick(&mut self, now: Instant) {
        self.notifier.clear_expired(now);
        if let Some(TimerTick::Completed) = self.timer.tick(now) {
            info!(fade_out_ms = self.timer_fade_out_ms, "sleep timer fired");
            self.player.fade_out_and_stop(self.timer_fade_out_ms);
            self.publish(PlayerEvent::SleepTimerFired);
            self.notifier.push(self.i18n.t("timer.stopped"), now);
        }
    }

    // Events.

    /// Apply one event drained from the bus.
    pub fn observe(&mut self, event: &PlayerEvent, now: Instant) {
        self.modal.observe(event);
        match event {
            PlayerEvent::TrackChanged { index } => {
                if let Some(track) = self.tracks().get(*index).cloned() {
                    self.user_data.add_to_history(&track, Utc::now());
                }
            }
            PlayerEvent::TrackEnded { index } => {
                let played = self
                    .tracks()
                    .get(*index)
                    .and_then(|t| t.duration.map(|d| (t.category.clone(), d.as_secs())));
                if let Some((category, secs)) = played {
                    self.user_data.record_play_time(&category, secs, Utc::now());
                }
            }
            PlayerEvent::PlaybackFailed { index, reason } => {
                warn!(index, reason = %reason, "playback failed");
                self.player.playback_failed(*index);
                let name = self
                    .tracks()
                    .get(*index)
                    .map(|t| t.display_name.clone())
                    .unwrap_or_default();
                let text = self.i18n.t_with("errors.playback", &[("name", &name)]);
                self.notifier.push(text, now);
            }
            _ => {}
        }
    }

    /// Record the first user gesture.
    pub fn mark_interacted(&mut self) {
        if let Some(event) = self.user_data.mark_user_interacted() {
            self.publish(event);
        }
    }

    // Language.

    pub fn cycle_language(&mut self, now: Instant) {
        match self.i18n.cycle_locale() {
            Ok(code) => {
                let code = code.to_string();
                self.user_data.set_language(&code);
            }
            Err(e) => {
                warn!(error = %e, "language not switched");
                let text = self.i18n.t_with("errors.locale", &[("locale", "?")]);
                self.notifier.push(text, now);
            }
        }
    }

    /// Switch to the next color scheme and remember it.
    pub fn cycle_theme(&mut self, now: Instant) {
        self.theme = self.theme.next();
        self.user_data.set_theme(self.theme.name());
        let text = self.i18n.t_with("theme.changed", &[("name", self.theme.name())]);
        self.notifier.push(text, now);
    }

    /// Submit a 1-5 star rating. Returns whether it was recorded.
    pub fn rate(&mut self, stars: u8, now: Instant) -> bool {
        match self.user_data.rate(stars, Utc::now()) {
            Ok(stats) => {
                self.publish(PlayerEvent::RatingSubmitted { stars });
                let average = format!("{:.1}", stats.average);
                let count = stats.count.to_string();
                let text = self
                    .i18n
                    .t_with("rating.thanks", &[("average", &average), ("count", &count)]);
                self.notifier.push(text, now);
                true
            }
            Err(UserDataError::AlreadyRated) => {
                self.notifier.push(self.i18n.t("rating.already"), now);
                false
            }
            Err(e) => {
                warn!(error = %e, "rating not recorded");
                false
            }
        }
    }

    /// Re-read dictionaries from disk.
    pub fn reload_language(&mut self, now: Instant) {
        if let Err(e) = self.i18n.reload() {
            warn!(error = %e, "dictionaries not reloaded");
            let locale = self.i18n.locale().to_string();
            let text = self.i18n.t_with("errors.locale", &[("locale", &locale)]);
            self.notifier.push(text, now);
        }
    }
}

fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
    if query_lower.is_empty() {
        return Some(Vec::new());
    }

    let mut positions: Vec<usize> = Vec::new();
    let mut title_iter = title_lower.chars().enumerate();

    for qc in query_lower.chars() {
        loop {
            match title_iter.next() {
                Some((ti, tc)) if tc == qc => {
                    positions.push(ti);
                    break;
                }
                Some(_) => continue,
                None => return None,
            }
        }
    }

    Some(positions)
}
