use std::time::{Duration, SystemTime};

use crate::alert::{AlertSlot, DEFAULT_ALERT_TTL};
use crate::detail::DetailSession;
use crate::detector::{AlertEvent, StateChangeDetector};
use crate::model::FleetSnapshot;

/// Shown when the status endpoint cannot be reached at all
pub const CONNECTIVITY_ERROR: &str =
    "Cannot reach the status server. Check that the backend is running.";

/// Fallback when the server rejects a status request without detail
pub const STATUS_FALLBACK_ERROR: &str = "Failed to fetch fleet status.";

/// What the fleet area should show. An error always wins over data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FleetView<'a> {
    Error(&'a str),
    Loading,
    Ready(&'a FleetSnapshot),
}

#[derive(Debug)]
pub struct DashboardState {
    pub fleet: Option<FleetSnapshot>,
    pub error: Option<String>,
    pub detector: StateChangeDetector,
    pub alerts: AlertSlot,
    pub detail: DetailSession,
    /// Sequence number of the newest status fetch that has been applied
    pub last_poll_seq: u64,
    pub last_event_id: u64,
}

impl DashboardState {
    pub fn new(alert_ttl: Duration) -> Self {
        Self {
            fleet: None,
            error: None,
            detector: StateChangeDetector::new(),
            alerts: AlertSlot::new(alert_ttl),
            detail: DetailSession::new(),
            last_poll_seq: 0,
            last_event_id: 0,
        }
    }

    pub fn view(&self) -> FleetView<'_> {
        if let Some(message) = &self.error {
            return FleetView::Error(message);
        }
        match &self.fleet {
            Some(snapshot) => FleetView::Ready(snapshot),
            None => FleetView::Loading,
        }
    }

    pub fn visible_alerts(&self, now: SystemTime) -> &[AlertEvent] {
        self.alerts.visible(now)
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_TTL)
    }
}
