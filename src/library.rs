//! Track library: category folders scanned from disk.
//!
//! Each immediate subdirectory of the library root is a category (the
//! folder name is its key). Files sitting directly in the root are grouped
//! under the configured "uncategorized" name.

mod model;
mod scan;

pub use model::{Track, TrackId};
pub use scan::scan;

/// Category keys in library order, without duplicates.
pub fn categories(tracks: &[Track]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in tracks {
        if !out.contains(&t.category) {
            out.push(t.category.clone());
        }
    }
    out
}

/// Indices of the tracks that belong to `category`, in library order.
pub fn indices_in_category(tracks: &[Track], category: &str) -> Vec<usize> {
    tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.category == category)
        .map(|(i, _)| i)
        .collect()
}
