use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stable key for a track, `"{category}_{file_name}"`.
///
/// Favorites and history entries are keyed by it, so it must not change
/// between runs for the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(category: &str, file_name: &str) -> Self {
        Self(format!("{category}_{file_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub category: String,
    pub file_name: String,
    pub display_name: String,
    pub path: PathBuf,
    pub duration: Option<Duration>,
}

impl Track {
    /// Build a track from its on-disk location. Returns `None` for paths
    /// without a UTF-8 file name.
    pub fn from_path(category: &str, path: &Path, duration: Option<Duration>) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        Some(Self {
            category: category.to_string(),
            display_name: display_name_for(&file_name),
            file_name,
            path: path.to_path_buf(),
            duration,
        })
    }

    pub fn id(&self) -> TrackId {
        TrackId::new(&self.category, &self.file_name)
    }

    /// True when this is the file `file_name` inside `category`.
    ///
    /// `file_name` may also be a trailing path fragment (`"sub/rain.mp3"`).
    pub fn matches(&self, category: &str, file_name: &str) -> bool {
        self.category == category && (self.file_name == file_name || self.path.ends_with(file_name))
    }
}

/// The file name with its last extension removed.
pub fn display_name_for(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => file_name[..dot].to_string(),
        _ => file_name.to_string(),
    }
}
