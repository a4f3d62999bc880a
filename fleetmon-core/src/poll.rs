//! Periodic fleet status polling
//!
//! Every tick spawns its own fetch, so a slow server never stalls the timer.
//! Overlapping fetches are tagged with a sequence number and the reducer
//! drops any answer older than the newest one already applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::FleetApi;
use crate::model::{ControlAction, FleetSnapshot};
use crate::reducer::{DashboardEvent, EventSender};
use crate::state::STATUS_FALLBACK_ERROR;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Cloneable handle for out-of-band fetches and control requests
#[derive(Clone)]
pub struct PollHandle {
    api: Arc<dyn FleetApi>,
    events: EventSender,
    seq: Arc<AtomicU64>,
}

impl PollHandle {
    /// Fetch the fleet status once and report the outcome as one event
    pub async fn poll_once(&self) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "polling fleet status");

        let event = match self.api.status().await {
            Ok(resp) => match resp.instances {
                Some(instances) if resp.success => DashboardEvent::FleetLoaded {
                    seq,
                    snapshot: FleetSnapshot::new(instances),
                },
                _ => DashboardEvent::FleetRejected {
                    seq,
                    message: resp
                        .error_message
                        .unwrap_or_else(|| STATUS_FALLBACK_ERROR.to_string()),
                },
            },
            Err(e) => DashboardEvent::ConnectionLost {
                seq,
                detail: e.to_string(),
            },
        };

        self.events.emit(event);
    }

    /// One immediate fetch outside the timer
    pub fn refresh(&self) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            handle.poll_once().await;
        })
    }

    /// Send a control request, post its outcome as a notice, then refresh.
    ///
    /// The refresh happens whatever the control endpoint answered.
    pub async fn control(&self, instance_id: &str, action: ControlAction, display_name: &str) {
        info!(instance = instance_id, %action, "sending control request");

        let message = match self.api.control(instance_id, action).await {
            Ok(resp) => resp.message.unwrap_or_else(|| {
                format!(
                    "Control request sent: {} {}",
                    display_name,
                    action.as_str().to_uppercase()
                )
            }),
            Err(e) => {
                warn!(instance = instance_id, error = %e, "control request failed");
                format!("Control request failed: {}", e)
            }
        };

        self.events.emit(DashboardEvent::Notice { message });
        let _ = self.refresh().await;
    }
}

pub struct PollLoop {
    handle: PollHandle,
    interval: Duration,
    ticker: Option<JoinHandle<()>>,
}

impl PollLoop {
    pub fn new(api: Arc<dyn FleetApi>, events: EventSender, interval: Duration) -> Self {
        Self {
            handle: PollHandle {
                api,
                events,
                seq: Arc::new(AtomicU64::new(0)),
            },
            interval,
            ticker: None,
        }
    }

    /// Poll now and then every `interval`. No-op when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("poll loop already running");
            return;
        }

        info!(interval_ms = self.interval.as_millis() as u64, "starting poll loop");
        let handle = self.handle.clone();
        let period = self.interval;

        self.ticker = Some(tokio::spawn(async move {
            // First tick fires immediately
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                handle.refresh();
            }
        }));
    }

    /// Cancel the timer. In-flight fetches still report back.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            info!("stopping poll loop");
            ticker.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn handle(&self) -> PollHandle {
        self.handle.clone()
    }

    pub fn refresh(&self) -> JoinHandle<()> {
        self.handle.refresh()
    }

    pub async fn control(&self, instance_id: &str, action: ControlAction, display_name: &str) {
        self.handle.control(instance_id, action, display_name).await;
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
