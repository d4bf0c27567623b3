use std::path::Path;
use std::time::Duration;

use lofty::prelude::AudioFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::Track;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .any(|e| !e.is_empty() && e == ext)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn probe_duration(path: &Path) -> Option<Duration> {
    match lofty::read_from_path(path) {
        Ok(tagged) => Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no duration metadata");
            None
        }
    }
}

/// Walk `root` and collect tracks grouped by category folder.
///
/// Depth 1 entries are category folders (or uncategorized files); anything
/// below a category folder belongs to that category, up to `max_depth`
/// levels inside it.
pub fn scan(root: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(root).min_depth(1).follow_links(settings.follow_links);
    if let Some(d) = settings.max_depth {
        // Root is depth 0 and the category folder depth 1.
        walker = walker.max_depth(d + 1);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable library entry");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let category = if entry.depth() == 1 {
            settings.uncategorized_name.clone()
        } else {
            match path
                .strip_prefix(root)
                .ok()
                .and_then(|rel| rel.components().next())
                .and_then(|c| c.as_os_str().to_str())
            {
                Some(c) => c.to_string(),
                None => continue,
            }
        };

        if let Some(track) = Track::from_path(&category, path, probe_duration(path)) {
            tracks.push(track);
        }
    }

    tracks.sort_by(|a, b| {
        a.category
            .to_lowercase()
            .cmp(&b.category.to_lowercase())
            .then_with(|| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
            })
    });
    debug!(count = tracks.len(), root = %root.display(), "library scanned");
    tracks
}
