use std::path::PathBuf;
use std::time::Duration;

use super::*;
use crate::audio::PlaybackInfo;
use crate::audio::testing::RecordingBackend;

fn t(category: &str, file: &str) -> Track {
    let path = PathBuf::from("/music").join(category).join(file);
    Track::from_path(category, &path, Some(Duration::from_secs(200))).unwrap()
}

fn control() -> PlayerControl<RecordingBackend> {
    let tracks = vec![
        t("Fire", "campfire.mp3"),
        t("Rain", "drizzle.mp3"),
        t("Rain", "storm.mp3"),
    ];
    PlayerControl::new(RecordingBackend::default(), tracks, 70)
}

#[test]
fn play_track_finds_by_category_and_file_name() {
    let mut c = control();
    assert!(c.play_track("Rain", "storm.mp3"));
    assert_eq!(c.backend().take_sent(), vec![AudioCmd::Play(2)]);
    assert_eq!(c.state().current_track_index, Some(2));
    assert!(c.is_playing());
    assert_eq!(c.current_track().unwrap().display_name, "storm");
}

#[test]
fn play_track_unknown_file_returns_false_without_mutation() {
    let mut c = control();
    assert!(c.play_index(0));
    c.backend().take_sent();
    let before = c.state();

    assert!(!c.play_track("Rain", "thunder.mp3"));
    assert!(!c.play_track("Fire", "storm.mp3"));

    assert_eq!(c.state(), before);
    assert!(c.backend().take_sent().is_empty());
}

#[test]
fn play_index_out_of_range_is_rejected() {
    let mut c = control();
    assert!(!c.play_index(3));
    assert!(c.backend().take_sent().is_empty());
    assert_eq!(c.state().current_track_index, None);
}

#[test]
fn toggle_track_pauses_only_the_playing_track() {
    let mut c = control();
    assert!(c.toggle_track(1));
    assert!(!c.toggle_track(1));
    assert!(c.toggle_track(2));
    assert_eq!(
        c.backend().take_sent(),
        vec![AudioCmd::Play(1), AudioCmd::Pause, AudioCmd::Play(2)]
    );
}

#[test]
fn toggle_resumes_loaded_track_or_starts_fallback() {
    let mut c = control();
    assert!(!c.toggle(None));
    assert!(c.toggle(Some(1)));
    assert!(!c.toggle(Some(1)));
    assert!(c.toggle(Some(0)));
    assert_eq!(
        c.backend().take_sent(),
        vec![AudioCmd::Play(1), AudioCmd::Pause, AudioCmd::Resume]
    );
    assert_eq!(c.state().current_track_index, Some(1));
}

#[test]
fn set_volume_clamps_to_percent_range() {
    let mut c = control();
    assert_eq!(c.set_volume(150), 100);
    assert_eq!(c.set_volume(-3), 0);
    assert_eq!(c.adjust_volume(5), 5);
    assert_eq!(
        c.backend().take_sent(),
        vec![
            AudioCmd::SetVolume(100),
            AudioCmd::SetVolume(0),
            AudioCmd::SetVolume(5)
        ]
    );
}

#[test]
fn seek_to_maps_percent_onto_duration() {
    let mut c = control();
    assert!(!c.seek_to(50.0));
    c.play_index(0);
    c.backend().take_sent();

    assert!(c.seek_to(50.0));
    assert!(c.seek_to(250.0));
    assert_eq!(
        c.backend().take_sent(),
        vec![
            AudioCmd::SeekTo(Duration::from_secs(100)),
            AudioCmd::SeekTo(Duration::from_secs(200))
        ]
    );
}

#[test]
fn dead_backend_fails_soft() {
    let mut c = PlayerControl::new(
        RecordingBackend::disconnected(),
        vec![t("Fire", "campfire.mp3")],
        70,
    );
    assert!(!c.play_index(0));
    assert!(!c.stop());
    assert_eq!(c.set_volume(20), 70);
    assert_eq!(c.state().current_track_index, None);
    assert!(!c.fade_out_and_stop(3000));
    assert!(!c.is_playing());
}

#[test]
fn fade_out_and_stop_resets_state() {
    let mut c = control();
    c.play_index(1);
    assert!(c.fade_out_and_stop(3000));
    assert!(!c.is_playing());
    assert_eq!(c.state().current_track_index, None);
    assert_eq!(
        c.backend().take_sent().last(),
        Some(&AudioCmd::FadeOutAndStop { fade_out_ms: 3000 })
    );
}

#[test]
fn sync_adopts_audio_thread_snapshot() {
    let mut c = control();
    c.backend().set_info(PlaybackInfo {
        index: Some(2),
        elapsed: Duration::from_secs(12),
        playing: true,
        volume: 40,
    });
    c.sync();
    assert_eq!(
        c.state(),
        PlaybackState {
            is_playing: true,
            current_track_index: Some(2),
            volume: 40,
        }
    );
    assert_eq!(c.elapsed(), Duration::from_secs(12));
}

#[test]
fn sync_keeps_requested_track_until_audio_thread_catches_up() {
    let mut c = control();
    assert!(c.play_index(1));

    c.backend().set_info(PlaybackInfo {
        index: None,
        elapsed: Duration::ZERO,
        playing: false,
        volume: 70,
    });
    c.sync();
    assert!(c.is_playing());
    assert_eq!(c.state().current_track_index, Some(1));

    c.backend().set_info(PlaybackInfo {
        index: Some(1),
        elapsed: Duration::from_secs(3),
        playing: true,
        volume: 70,
    });
    c.sync();
    assert_eq!(c.elapsed(), Duration::from_secs(3));

    // Caught up: later snapshots are adopted as-is.
    c.backend().set_info(PlaybackInfo {
        index: Some(1),
        elapsed: Duration::from_secs(4),
        playing: false,
        volume: 70,
    });
    c.sync();
    assert!(!c.is_playing());
}

#[test]
fn failed_play_releases_the_requested_track() {
    let mut c = control();
    c.play_index(2);
    c.playback_failed(2);
    c.backend().set_info(PlaybackInfo {
        index: None,
        elapsed: Duration::ZERO,
        playing: false,
        volume: 70,
    });
    c.sync();
    assert!(!c.is_playing());
    assert_eq!(c.state().current_track_index, None);
}
