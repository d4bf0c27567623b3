use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::*;
use crate::audio::testing::RecordingBackend;
use crate::audio::{AudioCmd, PlaybackInfo};
use crate::config::{Settings, Theme};
use crate::control::PlayerControl;
use crate::events::{EventBus, FavoriteAction, PlayerEvent};
use crate::i18n::{I18n, I18nLoader};
use crate::library::Track;
use crate::user_data::UserData;

fn t(category: &str, file: &str) -> Track {
    let path = PathBuf::from("/sounds").join(category).join(file);
    Track::from_path(category, &path, Some(Duration::from_secs(120))).unwrap()
}

fn app() -> (App<RecordingBackend>, EventBus) {
    let tracks = vec![
        t("fire", "campfire.mp3"),
        t("rain", "drizzle.mp3"),
        t("rain", "storm.mp3"),
        t("waves", "shore.mp3"),
    ];
    let settings = Settings::default();
    let bus = EventBus::new();
    let player = PlayerControl::new(RecordingBackend::default(), tracks, 70);
    let i18n = I18n::new(I18nLoader::new(None), "en-US", "en-US").unwrap();
    let user_data = UserData::in_memory(&settings.user_data);
    let app = App::new(player, i18n, user_data, bus.sender(), &settings);
    (app, bus)
}

fn sent(app: &App<RecordingBackend>) -> Vec<AudioCmd> {
    app.player.backend().take_sent()
}

#[test]
fn view_shows_one_category_at_a_time() {
    let (mut app, _bus) = app();
    assert_eq!(app.current_category(), Some("fire"));
    assert_eq!(app.display_indices(), vec![0]);

    app.next_category();
    assert_eq!(app.display_indices(), vec![1, 2]);
    assert_eq!(app.selected, 1);
    assert!(!app.follow_playback);

    app.prev_category();
    app.prev_category();
    assert_eq!(app.current_category(), Some("waves"));
    assert_eq!(app.display_indices(), vec![3]);
}

#[test]
fn filter_searches_across_categories() {
    let (mut app, _bus) = app();
    app.enter_filter_mode();
    app.push_filter_char('o');
    app.push_filter_char('R');
    assert_eq!(app.display_indices(), vec![2, 3]);
    assert_eq!(app.selected, 2);
    assert_eq!(app.match_positions(2), Some(vec![2, 3]));

    app.clear_filter();
    assert_eq!(app.display_indices(), vec![0]);
    assert_eq!(app.selected, 0);
}

#[test]
fn fuzzy_match_is_case_insensitive_subsequence() {
    assert_eq!(
        App::<RecordingBackend>::fuzzy_match_positions("Heavy Rain", "hr"),
        Some(vec![0, 6])
    );
    assert!(App::<RecordingBackend>::fuzzy_match_positions("Heavy Rain", "rh").is_none());
}

#[test]
fn next_and_prev_wrap_inside_the_view() {
    let (mut app, _bus) = app();
    app.next_category();
    app.next();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 1);
    app.prev();
    assert_eq!(app.selected, 2);
    app.select_first();
    assert_eq!(app.selected, 1);
    app.select_last();
    assert_eq!(app.selected, 2);
}

#[test]
fn activate_selected_syncs_queue_then_toggles() {
    let (mut app, _bus) = app();
    app.next_category();
    assert!(app.activate_selected());
    assert!(!app.activate_selected());
    assert_eq!(
        sent(&app),
        vec![AudioCmd::SetQueue(vec![1, 2]), AudioCmd::Play(1), AudioCmd::Pause]
    );
    assert!(app.follow_playback);
}

#[test]
fn switching_tracks_reopens_closed_overlay() {
    let (mut app, _bus) = app();
    app.next_category();
    assert!(app.activate_selected());
    assert!(app.modal.is_visible());

    assert!(app.modal.handle_key(crossterm::event::KeyCode::Esc));
    assert!(app.modal.aria_hidden());

    // Already playing, so the audio thread only reports TrackChanged.
    app.next();
    assert!(app.activate_selected());
    assert_eq!(sent(&app).last(), Some(&AudioCmd::Play(2)));
    assert!(app.modal.is_visible());
}

#[test]
fn theme_comes_from_user_data_and_cycles() {
    let settings = Settings::default();
    let bus = EventBus::new();
    let mut user_data = UserData::in_memory(&settings.user_data);
    user_data.set_theme("ocean");
    let player = PlayerControl::new(RecordingBackend::default(), vec![t("fire", "campfire.mp3")], 70);
    let i18n = I18n::new(I18nLoader::new(None), "en-US", "en-US").unwrap();
    let mut app = App::new(player, i18n, user_data, bus.sender(), &settings);
    assert_eq!(app.theme, Theme::Ocean);

    let now = Instant::now();
    app.cycle_theme(now);
    assert_eq!(app.theme, Theme::Ember);
    assert_eq!(app.user_data.theme(), Some("ember"));
    assert_eq!(app.notifier.current(now), Some("Theme: ember"));
}

#[test]
fn unknown_stored_theme_uses_configured_one() {
    let (app, _bus) = app();
    assert_eq!(app.theme, Theme::Dusk);
}

#[test]
fn rating_is_taken_once() {
    let (mut app, bus) = app();
    let now = Instant::now();
    assert!(app.rate(5, now));
    assert_eq!(app.notifier.current(now), Some("Thanks! 5.0 / 5 from 1 rating(s)"));
    assert!(bus.drain().contains(&PlayerEvent::RatingSubmitted { stars: 5 }));

    assert!(!app.rate(3, now));
    assert_eq!(app.notifier.current(now), Some("You have already rated, thank you"));
    assert!(bus.drain().is_empty());
    assert_eq!(app.user_data.rating().average, 5.0);
}

#[test]
fn sleep_timer_fades_out_once_and_notifies() {
    let (mut app, bus) = app();
    let t0 = Instant::now();
    app.activate_selected();
    app.set_sleep_timer(15, t0);
    assert_eq!(bus.drain(), vec![PlayerEvent::SleepTimerSet { minutes: 15 }]);
    assert_eq!(app.notifier.current(t0), Some("Timer set: 15 minutes"));

    let done = t0 + Duration::from_secs(15 * 60);
    app.tick(done);
    assert_eq!(
        sent(&app).last(),
        Some(&AudioCmd::FadeOutAndStop { fade_out_ms: 3000 })
    );
    assert_eq!(bus.drain(), vec![PlayerEvent::SleepTimerFired]);
    assert_eq!(app.notifier.current(done), Some("Sleep timer stopped playback"));
    assert!(!app.player.is_playing());

    app.tick(done + Duration::from_secs(60));
    assert!(sent(&app).is_empty());
    assert!(bus.drain().is_empty());
}

#[test]
fn cycling_presets_then_cancelling() {
    let (mut app, bus) = app();
    let t0 = Instant::now();
    app.cycle_sleep_timer(t0);
    app.cycle_sleep_timer(t0);
    assert_eq!(app.timer.minutes(), Some(30));

    app.cancel_sleep_timer(t0);
    assert!(!app.timer.is_active());
    assert_eq!(
        bus.drain(),
        vec![
            PlayerEvent::SleepTimerSet { minutes: 15 },
            PlayerEvent::SleepTimerSet { minutes: 30 },
            PlayerEvent::SleepTimerCancelled,
        ]
    );
    assert_eq!(app.notifier.current(t0), Some("Timer disabled"));
}

#[test]
fn favorite_toggle_round_trips() {
    let (mut app, bus) = app();
    let now = Instant::now();
    assert_eq!(app.toggle_favorite(now), Some(true));
    assert!(app.is_favorite(0));
    assert_eq!(app.notifier.current(now), Some("Added \"campfire\" to favorites"));

    assert_eq!(app.toggle_favorite(now), Some(false));
    assert!(!app.is_favorite(0));
    let actions: Vec<FavoriteAction> = bus
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            PlayerEvent::FavoritesUpdated { action, .. } => Some(action),
            _ => None,
        })
        .collect();
    assert_eq!(actions, vec![FavoriteAction::Added, FavoriteAction::Removed]);
}

#[test]
fn observed_events_feed_history_modal_and_toasts() {
    let (mut app, _bus) = app();
    let now = Instant::now();

    app.observe(&PlayerEvent::AudioStarted { index: 2 }, now);
    assert!(app.modal.is_visible());

    app.observe(&PlayerEvent::TrackChanged { index: 2 }, now);
    assert_eq!(app.user_data.history(None)[0].file_name, "storm.mp3");

    app.observe(&PlayerEvent::TrackEnded { index: 2 }, now);
    assert_eq!(app.user_data.doc().statistics.total_play_secs, 120);

    app.observe(
        &PlayerEvent::PlaybackFailed {
            index: 2,
            reason: "decode".into(),
        },
        now,
    );
    assert_eq!(app.notifier.current(now), Some("Could not play storm"));
}

#[test]
fn following_playback_switches_category() {
    let (mut app, _bus) = app();
    app.follow_playback = true;
    app.queue_dirty = false;
    app.player.backend().set_info(PlaybackInfo {
        index: Some(3),
        elapsed: Duration::from_secs(1),
        playing: true,
        volume: 70,
    });
    app.sync_playback();
    assert_eq!(app.current_category(), Some("waves"));
    assert_eq!(app.selected, 3);
    assert!(app.queue_dirty);
}

#[test]
fn resume_last_played_uses_history() {
    let (mut app, _bus) = app();
    let now = Instant::now();
    assert!(!app.resume_last_played(now));
    assert_eq!(app.notifier.current(now), Some("Nothing played yet"));

    app.observe(&PlayerEvent::TrackChanged { index: 2 }, now);
    assert!(app.resume_last_played(now));
    assert_eq!(app.player.state().current_track_index, Some(2));
    assert_eq!(app.current_category(), Some("rain"));
    let cmds = sent(&app);
    assert_eq!(cmds[0], AudioCmd::Play(2));
    assert_eq!(cmds.last(), Some(&AudioCmd::SetQueue(vec![1, 2])));
}

#[test]
fn first_interaction_is_published_once() {
    let (mut app, bus) = app();
    app.mark_interacted();
    app.mark_interacted();
    assert_eq!(bus.drain(), vec![PlayerEvent::UserInteractionGranted]);
}

#[test]
fn cycling_language_persists_choice() {
    let (mut app, _bus) = app();
    app.cycle_language(Instant::now());
    assert_eq!(app.i18n.locale(), "zh-CN");
    assert_eq!(app.user_data.language(), Some("zh-CN"));
    assert_eq!(app.i18n.t("player.paused"), "已暂停");
}
