//! Usage analytics (GA4 Measurement Protocol or Amplitude HTTP API).
//!
//! Player events are mapped to `AnalyticsEvent`s on the UI thread and handed
//! to a `Forwarder`, whose thread posts them with bounded retries. Nothing
//! here can block or fail the player; errors end up in the log.

mod forwarder;
mod payload;

use thiserror::Error;

pub use forwarder::{Forwarder, Transport};
pub use payload::{AnalyticsEvent, Request};

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("analytics is missing `{0}`")]
    MissingCredential(&'static str),
    #[error("invalid analytics endpoint {0}")]
    InvalidEndpoint(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("collector answered with status {0}")]
    Status(u16),
    #[error("gave up after {attempts} attempts: {last}")]
    GaveUp { attempts: u32, last: String },
}

#[cfg(test)]
mod tests;
