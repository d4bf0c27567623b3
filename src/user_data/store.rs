use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::UserDataSettings;
use crate::events::{FavoriteAction, PlayerEvent};
use crate::library::{Track, TrackId};

use super::model::{CategoryStats, FavoriteItem, HistoryItem, RatingStats, UserDataDoc};

#[derive(Debug, Error)]
pub enum UserDataError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("malformed user data in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot serialize user data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{0} is already a favorite")]
    AlreadyFavorite(TrackId),
    #[error("favorites are full ({0} max)")]
    FavoritesFull(usize),
    #[error("a rating was already submitted")]
    AlreadyRated,
    #[error("rating must be 1-5 stars, got {0}")]
    InvalidRating(u8),
}

/// Favorites, history and preferences, written back to disk after every
/// mutation.
///
/// Disk failures never lose the in-memory state: they are logged and the
/// next successful save catches up.
#[derive(Debug)]
pub struct UserData {
    path: Option<PathBuf>,
    doc: UserDataDoc,
    max_favorites: usize,
    max_history: usize,
}

impl UserData {
    /// Open the document at `path`. A missing file starts empty; an
    /// unreadable or malformed one is logged and replaced on the next save.
    pub fn open(path: PathBuf, settings: &UserDataSettings) -> Self {
        let doc = match read_doc(&path) {
            Ok(Some(doc)) => {
                debug!(path = %path.display(), favorites = doc.favorites.len(), "user data loaded");
                doc
            }
            Ok(None) => UserDataDoc::default(),
            Err(e) => {
                warn!(error = %e, "starting with empty user data");
                UserDataDoc::default()
            }
        };
        Self {
            path: Some(path),
            doc,
            max_favorites: settings.max_favorites,
            max_history: settings.max_history,
        }
    }

    /// A store that never touches the disk.
    pub fn in_memory(settings: &UserDataSettings) -> Self {
        Self {
            path: None,
            doc: UserDataDoc::default(),
            max_favorites: settings.max_favorites,
            max_history: settings.max_history,
        }
    }

    pub fn doc(&self) -> &UserDataDoc {
        &self.doc
    }

    pub fn save(&self) -> Result<(), UserDataError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| UserDataError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.doc)?;
        fs::write(path, json).map_err(|source| UserDataError::Write {
            path: path.clone(),
            source,
        })
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "user data not saved");
        }
    }

    // Favorites.

    pub fn favorites(&self) -> &[FavoriteItem] {
        &self.doc.favorites
    }

    pub fn is_favorite(&self, id: &TrackId) -> bool {
        self.doc.favorites.iter().any(|f| &f.id == id)
    }

    pub fn add_favorite(
        &mut self,
        track: &Track,
        now: DateTime<Utc>,
    ) -> Result<PlayerEvent, UserDataError> {
        let id = track.id();
        if self.is_favorite(&id) {
            return Err(UserDataError::AlreadyFavorite(id));
        }
        if self.doc.favorites.len() >= self.max_favorites {
            return Err(UserDataError::FavoritesFull(self.max_favorites));
        }
        self.doc.favorites.insert(0, FavoriteItem::from_track(track, now));
        self.persist();
        Ok(PlayerEvent::FavoritesUpdated {
            action: FavoriteAction::Added,
            track_id: Some(id),
        })
    }

    /// `None` when `id` was not a favorite.
    pub fn remove_favorite(&mut self, id: &TrackId) -> Option<PlayerEvent> {
        let before = self.doc.favorites.len();
        self.doc.favorites.retain(|f| &f.id != id);
        if self.doc.favorites.len() == before {
            return None;
        }
        self.persist();
        Some(PlayerEvent::FavoritesUpdated {
            action: FavoriteAction::Removed,
            track_id: Some(id.clone()),
        })
    }

    /// Flip the favorite state of `track`. Returns the new state and the
    /// event to publish.
    pub fn toggle_favorite(
        &mut self,
        track: &Track,
        now: DateTime<Utc>,
    ) -> Result<(bool, PlayerEvent), UserDataError> {
        let id = track.id();
        match self.remove_favorite(&id) {
            Some(event) => Ok((false, event)),
            None => self.add_favorite(track, now).map(|event| (true, event)),
        }
    }

    pub fn clear_favorites(&mut self) -> PlayerEvent {
        self.doc.favorites.clear();
        self.persist();
        PlayerEvent::FavoritesUpdated {
            action: FavoriteAction::Cleared,
            track_id: None,
        }
    }

    // History.

    pub fn history(&self, limit: Option<usize>) -> &[HistoryItem] {
        let h = &self.doc.history;
        &h[..limit.map_or(h.len(), |l| l.min(h.len()))]
    }

    /// Record a play: the track moves to the front, older duplicates are
    /// dropped and the list is capped.
    pub fn add_to_history(&mut self, track: &Track, now: DateTime<Utc>) {
        let item = HistoryItem::from_track(track, now);
        self.doc.history.retain(|h| h.id != item.id);
        self.doc.history.insert(0, item);
        self.doc.history.truncate(self.max_history);

        let stats = &mut self.doc.statistics;
        stats.total_plays += 1;
        stats.categories.entry(track.category.clone()).or_default().plays += 1;
        stats.last_updated = Some(now);
        self.persist();
    }

    pub fn remove_from_history(&mut self, id: &TrackId) -> bool {
        let before = self.doc.history.len();
        self.doc.history.retain(|h| &h.id != id);
        let removed = self.doc.history.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear_history(&mut self) {
        self.doc.history.clear();
        self.persist();
    }

    // Statistics.

    /// Add listening time for a track that played to its end.
    pub fn record_play_time(&mut self, category: &str, secs: u64, now: DateTime<Utc>) {
        let stats = &mut self.doc.statistics;
        stats.total_play_secs += secs;
        stats.categories.entry(category.to_string()).or_default().play_secs += secs;
        stats.last_updated = Some(now);
        self.persist();
    }

    /// Categories by play count, most played first.
    pub fn most_played_categories(&self, limit: usize) -> Vec<(String, CategoryStats)> {
        let mut out: Vec<(String, CategoryStats)> = self
            .doc
            .statistics
            .categories
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        out.sort_by(|a, b| b.1.plays.cmp(&a.1.plays).then_with(|| a.0.cmp(&b.0)));
        out.truncate(limit);
        out
    }

    // Preferences.

    /// Record the first user gesture. Returns the event only the first
    /// time, across runs.
    pub fn mark_user_interacted(&mut self) -> Option<PlayerEvent> {
        if self.doc.user_interacted {
            return None;
        }
        self.doc.user_interacted = true;
        self.persist();
        info!("first user interaction recorded");
        Some(PlayerEvent::UserInteractionGranted)
    }

    pub fn language(&self) -> Option<&str> {
        self.doc.language.as_deref()
    }

    pub fn set_language(&mut self, code: &str) {
        if self.doc.language.as_deref() == Some(code) {
            return;
        }
        self.doc.language = Some(code.to_string());
        self.persist();
    }

    pub fn theme(&self) -> Option<&str> {
        self.doc.theme.as_deref()
    }

    pub fn set_theme(&mut self, name: &str) {
        if self.doc.theme.as_deref() == Some(name) {
            return;
        }
        self.doc.theme = Some(name.to_string());
        self.persist();
    }

    // Rating.

    pub fn rating(&self) -> &RatingStats {
        &self.doc.rating
    }

    /// Fold `stars` into the running average. Only the first rating counts.
    pub fn rate(&mut self, stars: u8, now: DateTime<Utc>) -> Result<RatingStats, UserDataError> {
        if !(1..=5).contains(&stars) {
            return Err(UserDataError::InvalidRating(stars));
        }
        let rating = &mut self.doc.rating;
        if rating.user_rating.is_some() {
            return Err(UserDataError::AlreadyRated);
        }
        let count = rating.count + 1;
        rating.average = (rating.average * rating.count as f64 + f64::from(stars)) / count as f64;
        rating.count = count;
        rating.user_rating = Some(stars);
        rating.rated_at = Some(now);
        let out = *rating;
        self.persist();
        info!(stars, count, "rating recorded");
        Ok(out)
    }

    /// Anonymous analytics id, created on first use and kept across runs.
    pub fn client_id(&mut self) -> String {
        if let Some(id) = &self.doc.analytics_client_id {
            return id.clone();
        }
        let id = Uuid::new_v4().to_string();
        self.doc.analytics_client_id = Some(id.clone());
        self.persist();
        id
    }
}

fn read_doc(path: &Path) -> Result<Option<UserDataDoc>, UserDataError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(UserDataError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| UserDataError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
