use std::path::PathBuf;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use super::model::{CategoryStats, UserDataDoc};
use super::*;
use crate::config::UserDataSettings;
use crate::events::{FavoriteAction, PlayerEvent};
use crate::library::Track;

fn track(category: &str, file: &str) -> Track {
    let path = PathBuf::from("/sounds").join(category).join(file);
    Track::from_path(category, &path, Some(Duration::from_secs(90))).unwrap()
}

fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn settings(max_favorites: usize, max_history: usize) -> UserDataSettings {
    UserDataSettings {
        path: None,
        max_favorites,
        max_history,
    }
}

#[test]
fn toggling_twice_restores_original_state() {
    let mut data = UserData::in_memory(&UserDataSettings::default());
    let rain = track("rain", "drizzle.mp3");

    let (on, event) = data.toggle_favorite(&rain, at(0)).unwrap();
    assert!(on);
    assert_eq!(
        event,
        PlayerEvent::FavoritesUpdated {
            action: FavoriteAction::Added,
            track_id: Some(rain.id()),
        }
    );
    assert!(data.is_favorite(&rain.id()));

    let (on, event) = data.toggle_favorite(&rain, at(1)).unwrap();
    assert!(!on);
    assert!(matches!(
        event,
        PlayerEvent::FavoritesUpdated {
            action: FavoriteAction::Removed,
            ..
        }
    ));
    assert!(!data.is_favorite(&rain.id()));
    assert!(data.favorites().is_empty());
}

#[test]
fn add_favorite_rejects_duplicates_and_respects_cap() {
    let mut data = UserData::in_memory(&settings(2, 50));
    let a = track("rain", "a.mp3");
    data.add_favorite(&a, at(0)).unwrap();
    assert!(matches!(
        data.add_favorite(&a, at(1)),
        Err(UserDataError::AlreadyFavorite(_))
    ));
    data.add_favorite(&track("rain", "b.mp3"), at(2)).unwrap();
    assert!(matches!(
        data.add_favorite(&track("rain", "c.mp3"), at(3)),
        Err(UserDataError::FavoritesFull(2))
    ));
    // Newest first.
    assert_eq!(data.favorites()[0].file_name, "b.mp3");
    assert!(data.remove_favorite(&track("fire", "x.mp3").id()).is_none());
}

#[test]
fn history_dedups_newest_first_and_caps() {
    let mut data = UserData::in_memory(&settings(200, 3));
    for (i, f) in ["a.mp3", "b.mp3", "a.mp3", "c.mp3", "d.mp3"].iter().enumerate() {
        data.add_to_history(&track("rain", f), at(i as i64));
    }
    let names: Vec<&str> = data.history(None).iter().map(|h| h.file_name.as_str()).collect();
    assert_eq!(names, vec!["d.mp3", "c.mp3", "a.mp3"]);
    assert_eq!(data.history(Some(1)).len(), 1);
    assert_eq!(data.history(None)[0].duration_secs, 90);
    assert_eq!(data.doc().statistics.total_plays, 5);

    assert!(data.remove_from_history(&track("rain", "c.mp3").id()));
    assert!(!data.remove_from_history(&track("rain", "c.mp3").id()));
    data.clear_history();
    assert!(data.history(None).is_empty());
}

#[test]
fn most_played_orders_by_plays() {
    let mut data = UserData::in_memory(&UserDataSettings::default());
    data.add_to_history(&track("fire", "a.mp3"), at(0));
    data.add_to_history(&track("rain", "a.mp3"), at(1));
    data.add_to_history(&track("rain", "b.mp3"), at(2));
    data.record_play_time("rain", 120, at(3));

    let top = data.most_played_categories(5);
    assert_eq!(top[0].0, "rain");
    assert_eq!(top[0].1, CategoryStats { plays: 2, play_secs: 120 });
    assert_eq!(top[1].0, "fire");
    assert_eq!(data.most_played_categories(1).len(), 1);
    assert_eq!(data.doc().statistics.total_play_secs, 120);
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("user_data.json");
    let s = UserDataSettings::default();

    let id = {
        let mut data = UserData::open(path.clone(), &s);
        data.add_favorite(&track("rain", "drizzle.mp3"), at(0)).unwrap();
        data.set_language("zh-CN");
        data.set_theme("forest");
        assert_eq!(data.mark_user_interacted(), Some(PlayerEvent::UserInteractionGranted));
        data.client_id()
    };

    let mut data = UserData::open(path, &s);
    assert!(data.is_favorite(&track("rain", "drizzle.mp3").id()));
    assert_eq!(data.language(), Some("zh-CN"));
    assert_eq!(data.theme(), Some("forest"));
    assert_eq!(data.mark_user_interacted(), None);
    assert_eq!(data.client_id(), id);
    assert_eq!(id.len(), 36);
}

#[test]
fn theme_is_written_only_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.json");
    let mut data = UserData::open(path.clone(), &UserDataSettings::default());
    assert_eq!(data.theme(), None);

    data.set_theme("ocean");
    std::fs::remove_file(&path).unwrap();
    data.set_theme("ocean");
    assert!(!path.exists());

    data.set_theme("ember");
    let reopened = UserData::open(path, &UserDataSettings::default());
    assert_eq!(reopened.theme(), Some("ember"));
}

#[test]
fn rating_is_accepted_once_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.json");
    let s = UserDataSettings::default();

    {
        let mut data = UserData::open(path.clone(), &s);
        assert!(matches!(data.rate(0, at(0)), Err(UserDataError::InvalidRating(0))));
        assert!(matches!(data.rate(6, at(0)), Err(UserDataError::InvalidRating(6))));
        let stats = data.rate(4, at(10)).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.average, 4.0);
        assert_eq!(stats.user_rating, Some(4));
    }

    let mut data = UserData::open(path, &s);
    assert_eq!(data.rating().user_rating, Some(4));
    assert_eq!(data.rating().rated_at, Some(at(10)));
    assert!(matches!(data.rate(1, at(20)), Err(UserDataError::AlreadyRated)));
    assert_eq!(data.rating().count, 1);
}

#[test]
fn rating_folds_into_existing_average() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.json");
    std::fs::write(&path, r#"{"rating": {"count": 3, "average": 4.0}}"#).unwrap();

    let mut data = UserData::open(path, &UserDataSettings::default());
    let stats = data.rate(2, at(0)).unwrap();
    assert_eq!(stats.count, 4);
    assert_eq!(stats.average, 3.5);
}

#[test]
fn malformed_file_starts_empty_and_is_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.json");
    std::fs::write(&path, "{ broken").unwrap();

    let mut data = UserData::open(path.clone(), &UserDataSettings::default());
    assert!(data.favorites().is_empty());
    let event = data.clear_favorites();
    assert_eq!(
        event,
        PlayerEvent::FavoritesUpdated {
            action: FavoriteAction::Cleared,
            track_id: None,
        }
    );
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(serde_json::from_str::<UserDataDoc>(&text).is_ok());
}
