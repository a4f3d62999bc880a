use std::time::{Duration, SystemTime};

use crate::detector::AlertEvent;

pub const DEFAULT_ALERT_TTL: Duration = Duration::from_millis(5000);

/// The single on-screen alert slot.
///
/// A raise replaces whatever is showing and restarts the display window.
/// All alerts raised together (one poll's transitions) share the slot, so
/// none are lost to simultaneous display.
#[derive(Clone, Debug)]
pub struct AlertSlot {
    pub ttl: Duration,
    current: Vec<AlertEvent>,
    expires_at: Option<SystemTime>,
}

impl AlertSlot {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: Vec::new(),
            expires_at: None,
        }
    }

    /// Replace the visible batch. An empty batch leaves the slot untouched.
    pub fn raise(&mut self, alerts: Vec<AlertEvent>, at: SystemTime) {
        if alerts.is_empty() {
            return;
        }
        self.current = alerts;
        self.expires_at = Some(at + self.ttl);
    }

    /// Alerts still inside their display window at `now`
    pub fn visible(&self, now: SystemTime) -> &[AlertEvent] {
        match self.expires_at {
            Some(deadline) if now < deadline => &self.current,
            _ => &[],
        }
    }

    pub fn expire(&mut self, now: SystemTime) {
        if self.expires_at.is_some_and(|deadline| now >= deadline) {
            self.current.clear();
            self.expires_at = None;
        }
    }
}

impl Default for AlertSlot {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_TTL)
    }
}
