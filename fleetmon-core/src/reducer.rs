use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::detail::{DetailTicket, LogResult, MetricsResult};
use crate::detector::AlertEvent;
use crate::model::FleetSnapshot;
use crate::state::{CONNECTIVITY_ERROR, DashboardState};

#[derive(Clone, Debug)]
pub enum DashboardEvent {
    /// A status fetch returned a usable fleet
    FleetLoaded { seq: u64, snapshot: FleetSnapshot },
    /// The server answered but reported failure
    FleetRejected { seq: u64, message: String },
    /// The status fetch never produced a readable answer
    ConnectionLost { seq: u64, detail: String },
    LogResolved {
        ticket: DetailTicket,
        result: LogResult,
    },
    MetricsResolved {
        ticket: DetailTicket,
        result: MetricsResult,
    },
    /// Free-form operator notice (control responses)
    Notice { message: String },
}

#[derive(Clone, Debug)]
pub struct EventEnvelope {
    pub id: u64,
    pub at: SystemTime,
    pub event: DashboardEvent,
}

/// Cloneable handle that stamps events and queues them for the reducer
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<EventEnvelope>,
    next_id: Arc<AtomicU64>,
}

impl EventSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EventEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (sender, rx)
    }

    pub fn emit(&self, event: DashboardEvent) {
        let env = EventEnvelope {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            at: SystemTime::now(),
            event,
        };
        // Receiver only goes away on shutdown
        let _ = self.tx.send(env);
    }
}

fn accept_poll(state: &mut DashboardState, seq: u64) -> bool {
    if seq < state.last_poll_seq {
        debug!(seq, newest = state.last_poll_seq, "discarding stale status response");
        return false;
    }
    state.last_poll_seq = seq;
    true
}

pub fn reduce(state: &mut DashboardState, env: &EventEnvelope) {
    state.last_event_id = env.id;

    match &env.event {
        DashboardEvent::FleetLoaded { seq, snapshot } => {
            if !accept_poll(state, *seq) {
                return;
            }
            // Memory must be updated before the snapshot is published
            let alerts = state.detector.observe(snapshot);
            for alert in &alerts {
                info!(message = %alert.message, "instance state changed");
            }
            state.alerts.raise(alerts, env.at);
            state.fleet = Some(snapshot.clone());
            state.error = None;
        }
        DashboardEvent::FleetRejected { seq, message } => {
            if !accept_poll(state, *seq) {
                return;
            }
            warn!(%message, "status request rejected");
            state.error = Some(message.clone());
        }
        DashboardEvent::ConnectionLost { seq, detail } => {
            if !accept_poll(state, *seq) {
                return;
            }
            warn!(%detail, "status fetch failed");
            state.error = Some(CONNECTIVITY_ERROR.to_string());
            state.fleet = None;
        }
        DashboardEvent::LogResolved { ticket, result } => {
            state.detail.apply_log(ticket, result.clone());
        }
        DashboardEvent::MetricsResolved { ticket, result } => {
            state.detail.apply_metrics(ticket, result.clone());
        }
        DashboardEvent::Notice { message } => {
            state.alerts.raise(vec![AlertEvent::notice(message.clone())], env.at);
        }
    }
}

/// Apply queued events to the shared state until every sender is dropped
pub async fn run_reducer(
    state: Arc<RwLock<DashboardState>>,
    mut rx: mpsc::UnboundedReceiver<EventEnvelope>,
) {
    while let Some(env) = rx.recv().await {
        let mut s = state.write().await;
        reduce(&mut s, &env);
    }
}
