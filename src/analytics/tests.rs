use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use super::forwarder::deliver;
use super::payload::build_request;
use super::*;
use crate::config::{AnalyticsProvider, AnalyticsSettings};
use crate::events::{FavoriteAction, PlayerEvent};
use crate::library::Track;

struct FlakyTransport {
    failures_left: AtomicU32,
    calls: AtomicU32,
    delivered: Mutex<Sender<Request>>,
}

impl FlakyTransport {
    fn new(failures: u32) -> (Self, mpsc::Receiver<Request>) {
        let (tx, rx) = mpsc::channel();
        let t = Self {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            delivered: Mutex::new(tx),
        };
        (t, rx)
    }
}

impl Transport for FlakyTransport {
    fn post(&self, request: &Request) -> Result<(), AnalyticsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(AnalyticsError::Status(503));
        }
        let _ = self.delivered.lock().unwrap().send(request.clone());
        Ok(())
    }
}

fn tracks() -> Vec<Track> {
    vec![Track::from_path("rain", &PathBuf::from("/s/rain/storm.mp3"), None).unwrap()]
}

fn ga4() -> AnalyticsSettings {
    AnalyticsSettings {
        enabled: true,
        measurement_id: Some("G-TEST".into()),
        api_secret: Some("s3cret".into()),
        retry_backoff_ms: 1,
        ..AnalyticsSettings::default()
    }
}

fn event(source: &PlayerEvent) -> AnalyticsEvent {
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    AnalyticsEvent::from_player_event(source, &tracks(), now).unwrap()
}

#[test]
fn player_events_map_to_analytics_names() {
    let now = Utc::now();
    let t = tracks();
    let name = |e: PlayerEvent| AnalyticsEvent::from_player_event(&e, &t, now).map(|a| a.name);

    assert_eq!(name(PlayerEvent::TrackChanged { index: 0 }), Some("track_play"));
    assert_eq!(
        name(PlayerEvent::AudioStateChange { playing: false, index: Some(0) }),
        Some("track_pause")
    );
    assert_eq!(name(PlayerEvent::TrackEnded { index: 0 }), Some("track_complete"));
    assert_eq!(name(PlayerEvent::SleepTimerSet { minutes: 15 }), Some("sleep_timer_set"));
    assert_eq!(name(PlayerEvent::SleepTimerCancelled), Some("sleep_timer_cancel"));
    assert_eq!(name(PlayerEvent::SleepTimerFired), Some("sleep_timer_complete"));
    assert_eq!(name(PlayerEvent::RatingSubmitted { stars: 5 }), Some("rating_submit"));
    assert_eq!(
        name(PlayerEvent::FavoritesUpdated {
            action: FavoriteAction::Added,
            track_id: Some(t[0].id()),
        }),
        Some("favorite_add")
    );
    assert_eq!(
        name(PlayerEvent::FavoritesUpdated { action: FavoriteAction::Cleared, track_id: None }),
        None
    );
    assert_eq!(name(PlayerEvent::TrackChanged { index: 9 }), None);
    assert_eq!(name(PlayerEvent::UserInteractionGranted), None);
}

#[test]
fn ga4_request_carries_credentials_and_client_id() {
    let e = event(&PlayerEvent::TrackChanged { index: 0 });
    let req = build_request(&ga4(), "client-1", &e).unwrap();

    assert_eq!(req.url.host_str(), Some("www.google-analytics.com"));
    let query: Vec<(String, String)> = req.url.query_pairs().into_owned().collect();
    assert!(query.contains(&("measurement_id".into(), "G-TEST".into())));
    assert!(query.contains(&("api_secret".into(), "s3cret".into())));
    assert_eq!(req.body["client_id"], "client-1");
    assert_eq!(req.body["events"][0]["name"], "track_play");
    assert_eq!(req.body["events"][0]["params"]["category"], "rain");
    assert_eq!(req.body["events"][0]["params"]["track_name"], "storm");
}

#[test]
fn amplitude_request_uses_device_id_and_millis() {
    let settings = AnalyticsSettings {
        enabled: true,
        provider: AnalyticsProvider::Amplitude,
        api_key: Some("key".into()),
        ..AnalyticsSettings::default()
    };
    let e = event(&PlayerEvent::SleepTimerSet { minutes: 30 });
    let req = build_request(&settings, "dev-1", &e).unwrap();

    assert_eq!(req.url.as_str(), "https://api2.amplitude.com/2/httpapi");
    assert_eq!(req.body["api_key"], "key");
    let ev = &req.body["events"][0];
    assert_eq!(ev["device_id"], "dev-1");
    assert_eq!(ev["event_type"], "sleep_timer_set");
    assert_eq!(ev["event_properties"]["minutes"], 30);
    assert_eq!(ev["time"], 1_700_000_000_000_i64);
}

#[test]
fn missing_credentials_are_reported() {
    let settings = AnalyticsSettings {
        api_secret: None,
        ..ga4()
    };
    let e = event(&PlayerEvent::SleepTimerFired);
    assert!(matches!(
        build_request(&settings, "c", &e),
        Err(AnalyticsError::MissingCredential("api_secret"))
    ));
}

#[test]
fn deliver_retries_until_success() {
    let (transport, rx) = FlakyTransport::new(2);
    let req = build_request(&ga4(), "c", &event(&PlayerEvent::SleepTimerFired)).unwrap();

    assert_eq!(deliver(&transport, &req, 3, Duration::from_millis(1)).unwrap(), 3);
    assert_eq!(rx.try_recv().unwrap(), req);
}

#[test]
fn deliver_gives_up_after_max_attempts() {
    let (transport, rx) = FlakyTransport::new(10);
    let req = build_request(&ga4(), "c", &event(&PlayerEvent::SleepTimerFired)).unwrap();

    match deliver(&transport, &req, 3, Duration::from_millis(1)) {
        Err(AnalyticsError::GaveUp { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    assert!(rx.try_recv().is_err());
}

#[test]
fn forwarder_posts_in_background() {
    let (transport, rx) = FlakyTransport::new(1);
    let forwarder = Forwarder::spawn(transport, ga4(), "client-9".into());
    assert!(forwarder.is_enabled());

    forwarder.track(event(&PlayerEvent::SleepTimerCancelled));
    let req = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(req.body["client_id"], "client-9");
    assert_eq!(req.body["events"][0]["name"], "sleep_timer_cancel");
    forwarder.shutdown();
}

#[test]
fn disabled_forwarder_swallows_events() {
    let forwarder = Forwarder::from_settings(&AnalyticsSettings::default(), "c".into());
    assert!(!forwarder.is_enabled());
    forwarder.track(event(&PlayerEvent::SleepTimerFired));
    forwarder.shutdown();
}
