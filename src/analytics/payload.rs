use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::{Map, Value, json};

use crate::config::{AnalyticsProvider, AnalyticsSettings};
use crate::events::{FavoriteAction, PlayerEvent};
use crate::library::Track;

use super::AnalyticsError;

const GA4_ENDPOINT: &str = "https://www.google-analytics.com/mp/collect";
const AMPLITUDE_ENDPOINT: &str = "https://api2.amplitude.com/2/httpapi";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub name: &'static str,
    pub params: Map<String, Value>,
    pub time: DateTime<Utc>,
}

impl AnalyticsEvent {
    /// Map a player event to its analytics counterpart. Events nobody
    /// reports on (and indices outside `tracks`) map to `None`.
    pub fn from_player_event(
        event: &PlayerEvent,
        tracks: &[Track],
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let mut params = Map::new();
        let name = match event {
            PlayerEvent::TrackChanged { index } => {
                track_params(&mut params, tracks.get(*index)?);
                "track_play"
            }
            PlayerEvent::AudioStateChange {
                playing: false,
                index: Some(index),
            } => {
                track_params(&mut params, tracks.get(*index)?);
                "track_pause"
            }
            PlayerEvent::TrackEnded { index } => {
                track_params(&mut params, tracks.get(*index)?);
                "track_complete"
            }
            PlayerEvent::FavoritesUpdated {
                action,
                track_id: Some(id),
            } => {
                params.insert("track_id".into(), json!(id.as_str()));
                match action {
                    FavoriteAction::Added => "favorite_add",
                    FavoriteAction::Removed => "favorite_remove",
                    FavoriteAction::Cleared => return None,
                }
            }
            PlayerEvent::SleepTimerSet { minutes } => {
                params.insert("minutes".into(), json!(minutes));
                "sleep_timer_set"
            }
            PlayerEvent::SleepTimerCancelled => "sleep_timer_cancel",
            PlayerEvent::SleepTimerFired => "sleep_timer_complete",
            PlayerEvent::RatingSubmitted { stars } => {
                params.insert("stars".into(), json!(stars));
                "rating_submit"
            }
            _ => return None,
        };
        Some(Self {
            name,
            params,
            time: now,
        })
    }
}

fn track_params(params: &mut Map<String, Value>, track: &Track) {
    params.insert("track_id".into(), json!(track.id().as_str()));
    params.insert("category".into(), json!(track.category));
    params.insert("track_name".into(), json!(track.display_name));
}

/// A ready-to-post JSON request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub url: Url,
    pub body: Value,
}

pub fn ga4_body(client_id: &str, event: &AnalyticsEvent) -> Value {
    json!({
        "client_id": client_id,
        "timestamp_micros": event.time.timestamp_micros(),
        "events": [{ "name": event.name, "params": event.params }],
    })
}

pub fn amplitude_body(api_key: &str, device_id: &str, event: &AnalyticsEvent) -> Value {
    json!({
        "api_key": api_key,
        "events": [{
            "device_id": device_id,
            "event_type": event.name,
            "event_properties": event.params,
            "time": event.time.timestamp_millis(),
        }],
    })
}

pub fn build_request(
    settings: &AnalyticsSettings,
    client_id: &str,
    event: &AnalyticsEvent,
) -> Result<Request, AnalyticsError> {
    match settings.provider {
        AnalyticsProvider::Ga4 => {
            let measurement_id = settings
                .measurement_id
                .as_deref()
                .ok_or(AnalyticsError::MissingCredential("measurement_id"))?;
            let api_secret = settings
                .api_secret
                .as_deref()
                .ok_or(AnalyticsError::MissingCredential("api_secret"))?;
            let base = settings.endpoint.as_deref().unwrap_or(GA4_ENDPOINT);
            let url = Url::parse_with_params(
                base,
                &[("measurement_id", measurement_id), ("api_secret", api_secret)],
            )
            .map_err(|e| AnalyticsError::InvalidEndpoint(format!("{base}: {e}")))?;
            Ok(Request {
                url,
                body: ga4_body(client_id, event),
            })
        }
        AnalyticsProvider::Amplitude => {
            let api_key = settings
                .api_key
                .as_deref()
                .ok_or(AnalyticsError::MissingCredential("api_key"))?;
            let base = settings.endpoint.as_deref().unwrap_or(AMPLITUDE_ENDPOINT);
            let url = Url::parse(base)
                .map_err(|e| AnalyticsError::InvalidEndpoint(format!("{base}: {e}")))?;
            Ok(Request {
                url,
                body: amplitude_body(api_key, client_id, event),
            })
        }
    }
}
