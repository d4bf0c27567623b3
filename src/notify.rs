//! Transient toast shown in the status box.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Notification {
    text: String,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct Notifier {
    current: Option<Notification>,
    ttl: Duration,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    /// Replace whatever is showing.
    pub fn push(&mut self, text: impl Into<String>, now: Instant) {
        self.current = Some(Notification {
            text: text.into(),
            expires_at: now + self.ttl,
        });
    }

    pub fn current(&self, now: Instant) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|n| now < n.expires_at)
            .map(|n| n.text.as_str())
    }

    pub fn clear_expired(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.current = None;
        }
    }
}
