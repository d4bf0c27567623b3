use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::library::{Track, TrackId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub id: TrackId,
    pub category: String,
    pub file_name: String,
    pub display_name: String,
    pub added_at: DateTime<Utc>,
}

impl FavoriteItem {
    pub fn from_track(track: &Track, now: DateTime<Utc>) -> Self {
        Self {
            id: track.id(),
            category: track.category.clone(),
            file_name: track.file_name.clone(),
            display_name: track.display_name.clone(),
            added_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: TrackId,
    pub category: String,
    pub file_name: String,
    pub display_name: String,
    pub played_at: DateTime<Utc>,
    /// Track length in whole seconds, 0 when unknown.
    #[serde(default)]
    pub duration_secs: u64,
}

impl HistoryItem {
    pub fn from_track(track: &Track, now: DateTime<Utc>) -> Self {
        Self {
            id: track.id(),
            category: track.category.clone(),
            file_name: track.file_name.clone(),
            display_name: track.display_name.clone(),
            played_at: now,
            duration_secs: track.duration.map_or(0, |d| d.as_secs()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub plays: u64,
    pub play_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub total_plays: u64,
    pub total_play_secs: u64,
    pub categories: BTreeMap<String, CategoryStats>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// The running app rating. Each install may rate once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingStats {
    pub count: u64,
    pub average: f64,
    pub user_rating: Option<u8>,
    pub rated_at: Option<DateTime<Utc>>,
}

/// Everything persisted between runs, stored as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDataDoc {
    pub user_interacted: bool,
    /// Newest first.
    pub favorites: Vec<FavoriteItem>,
    /// Newest first.
    pub history: Vec<HistoryItem>,
    pub statistics: Statistics,
    pub theme: Option<String>,
    pub rating: RatingStats,
    pub language: Option<String>,
    pub analytics_client_id: Option<String>,
}
