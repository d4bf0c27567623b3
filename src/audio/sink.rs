//! Utilities for creating `rodio` sinks from `Track` values.
//!
//! The helper here encapsulates opening/decoding a file and preparing a
//! paused `Sink` at the requested start position.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::library::Track;

use super::types::AudioError;

/// Create a paused `Sink` for `track` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    track: &Track,
    start_at: Duration,
) -> Result<Sink, AudioError> {
    let file = File::open(&track.path).map_err(|source| AudioError::Open {
        path: track.path.clone(),
        source,
    })?;

    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| AudioError::Decode {
            path: track.path.clone(),
            message: e.to_string(),
        })?
        // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
        .skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(sink)
}
