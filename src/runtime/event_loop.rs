use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::analytics::{AnalyticsEvent, Forwarder};
use crate::app::App;
use crate::audio::{AudioBackend, AudioPlayer};
use crate::config;
use crate::events::EventBus;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// `*` was pressed; the next digit 1-5 is a star rating.
    pub pending_rate: bool,
}

/// Main terminal event loop: input, drawing, the audio-thread snapshot,
/// bus fan-out and the sleep timer. Returns once quit is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<AudioPlayer>,
    bus: &EventBus,
    forwarder: &Forwarder,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let now = Instant::now();
        app.sync_queue();
        app.sync_playback();
        dispatch_events(app, bus, forwarder, now);
        app.tick(now);

        let display = app.display_indices();
        terminal.draw(|f| ui::draw(f, app, &display, &settings.ui, &settings.controls, now))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, state, Instant::now()) {
                    app.player
                        .backend()
                        .quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Hand every queued player event to the app, then to analytics.
pub fn dispatch_events<B: AudioBackend>(
    app: &mut App<B>,
    bus: &EventBus,
    forwarder: &Forwarder,
    now: Instant,
) {
    for event in bus.drain() {
        app.observe(&event, now);
        if let Some(analytics) = AnalyticsEvent::from_player_event(&event, app.tracks(), Utc::now())
        {
            forwarder.track(analytics);
        }
    }
}

/// Apply one key press. Returns `true` when the user asked to quit.
pub fn handle_key_event<B: AudioBackend>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App<B>,
    state: &mut EventLoopState,
    now: Instant,
) -> bool {
    app.mark_interacted();

    if app.modal.handle_key(key.code) {
        state.pending_gg = false;
        state.pending_rate = false;
        return false;
    }

    if app.filter_mode {
        state.pending_gg = false;
        state.pending_rate = false;
        handle_filter_key(key, app);
        return false;
    }

    if state.pending_rate {
        state.pending_rate = false;
        if let KeyCode::Char(c @ '1'..='5') = key.code {
            app.rate(c as u8 - b'0', now);
            return false;
        }
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    let scrub = settings.controls.scrub_seconds.min(i32::MAX as u64) as i32;
    let volume_step = i32::from(settings.controls.volume_step);

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('r') => app.cycle_loop_mode(),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char(']') => app.next_category(),
        KeyCode::Char('[') => app.prev_category(),
        KeyCode::Enter => {
            app.activate_selected();
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            app.toggle_playback();
        }
        KeyCode::Char('l') => {
            app.next_track();
        }
        KeyCode::Char('h') => {
            app.prev_track();
        }
        KeyCode::Char('L') => {
            app.player.seek_by(scrub);
        }
        KeyCode::Char('H') => {
            app.player.seek_by(-scrub);
        }
        KeyCode::Char(c @ '0'..='9') => {
            let tenth = c.to_digit(10).unwrap_or(0);
            app.player.seek_to(tenth as f32 * 10.0);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.player.adjust_volume(volume_step);
        }
        KeyCode::Char('-') => {
            app.player.adjust_volume(-volume_step);
        }
        KeyCode::Char('s') => {
            app.player.stop();
        }
        KeyCode::Char('b') => {
            app.resume_last_played(now);
        }
        KeyCode::Char('f') => {
            app.toggle_favorite(now);
        }
        KeyCode::Char('t') => app.cycle_sleep_timer(now),
        KeyCode::Char('T') => app.cancel_sleep_timer(now),
        KeyCode::Char('m') => app.modal.toggle(),
        KeyCode::Char('i') => app.cycle_language(now),
        KeyCode::Char('I') => app.reload_language(now),
        KeyCode::Char('c') => app.cycle_theme(now),
        KeyCode::Char('*') => state.pending_rate = true,
        _ => {}
    }

    false
}

fn handle_filter_key<B: AudioBackend>(key: KeyEvent, app: &mut App<B>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j') | KeyCode::Char('n') if ctrl => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Char('p') if ctrl => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                return;
            }
            app.exit_filter_mode();
            app.activate_selected();
        }
        _ => {}
    }
}
