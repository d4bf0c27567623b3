use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::AnalyticsSettings;

use super::AnalyticsError;
use super::payload::{AnalyticsEvent, Request, build_request};

/// Where requests go. The production transport is HTTP; tests record.
pub trait Transport: Send + 'static {
    fn post(&self, request: &Request) -> Result<(), AnalyticsError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, AnalyticsError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("somna/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: &Request) -> Result<(), AnalyticsError> {
        let response = self
            .client
            .post(request.url.clone())
            .json(&request.body)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Post `request`, retrying with a linearly growing pause. Returns the
/// number of attempts used.
pub fn deliver<T: Transport + ?Sized>(
    transport: &T,
    request: &Request,
    max_attempts: u32,
    backoff: Duration,
) -> Result<u32, AnalyticsError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match transport.post(request) {
            Ok(()) => return Ok(attempt),
            Err(e) if attempt >= max_attempts => {
                return Err(AnalyticsError::GaveUp {
                    attempts: attempt,
                    last: e.to_string(),
                });
            }
            Err(e) => {
                debug!(attempt, error = %e, "analytics post failed, retrying");
                thread::sleep(backoff * attempt);
            }
        }
    }
}

enum Msg {
    Track(AnalyticsEvent),
    Shutdown,
}

/// Handle to the analytics thread. Sending never blocks the caller.
pub struct Forwarder {
    tx: Option<Sender<Msg>>,
}

impl Forwarder {
    /// A handle that drops everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// HTTP forwarder when analytics is enabled and a client can be built.
    pub fn from_settings(settings: &AnalyticsSettings, client_id: String) -> Self {
        if !settings.enabled {
            return Self::disabled();
        }
        match HttpTransport::new() {
            Ok(transport) => Self::spawn(transport, settings.clone(), client_id),
            Err(e) => {
                warn!(error = %e, "analytics disabled: no HTTP client");
                Self::disabled()
            }
        }
    }

    pub fn spawn<T: Transport>(transport: T, settings: AnalyticsSettings, client_id: String) -> Self {
        let (tx, rx) = mpsc::channel::<Msg>();
        let provider = settings.provider;
        thread::spawn(move || {
            let backoff = Duration::from_millis(settings.retry_backoff_ms);
            for msg in rx {
                let event = match msg {
                    Msg::Track(event) => event,
                    Msg::Shutdown => break,
                };
                let request = match build_request(&settings, &client_id, &event) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(event = event.name, error = %e, "analytics event dropped");
                        continue;
                    }
                };
                match deliver(&transport, &request, settings.max_attempts, backoff) {
                    Ok(attempts) => debug!(event = event.name, attempts, "analytics event sent"),
                    Err(e) => warn!(event = event.name, error = %e, "analytics event dropped"),
                }
            }
            debug!("analytics thread finished");
        });
        info!(?provider, "analytics forwarding enabled");
        Self { tx: Some(tx) }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn track(&self, event: AnalyticsEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(Msg::Track(event)).is_err() {
                debug!("analytics thread gone");
            }
        }
    }

    /// Ask the thread to stop once the events already queued are handled.
    /// The thread is not joined; whatever is still pending at process exit
    /// is lost.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Msg::Shutdown);
        }
    }
}
