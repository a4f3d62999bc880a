//! Detail expansion for a single instance
//!
//! Selecting an instance issues a log fetch and a metrics fetch at the same
//! time. Each selection gets a fresh generation number; results carry the
//! ticket they were issued under and are dropped when that ticket no longer
//! matches the live selection. Requests are never aborted, only ignored.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{ApiError, FleetApi, LogResponse, MetricsResponse};
use crate::merger::{self, MergedSeries};
use crate::model::InstanceId;
use crate::reducer::{DashboardEvent, EventSender};

/// Identifies the selection a fetch was issued for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailTicket {
    pub instance_id: InstanceId,
    pub generation: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogResult {
    Loading,
    Text(String),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum MetricsResult {
    Pending,
    Ready(MergedSeries),
    Failed(String),
}

#[derive(Clone, Debug, Default)]
pub struct DetailSession {
    selected: Option<InstanceId>,
    generation: u64,
    log: Option<LogResult>,
    metrics: Option<MetricsResult>,
}

impl DetailSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the detail view for `id`.
    ///
    /// Returns the ticket to fetch with, or `None` when this collapsed the
    /// already-open instance.
    pub fn select(&mut self, id: &str) -> Option<DetailTicket> {
        self.generation += 1;

        if self.selected.as_deref() == Some(id) {
            self.reset();
            return None;
        }

        self.selected = Some(id.to_string());
        self.log = Some(LogResult::Loading);
        self.metrics = Some(MetricsResult::Pending);

        Some(DetailTicket {
            instance_id: id.to_string(),
            generation: self.generation,
        })
    }

    /// Collapse whatever is open and invalidate outstanding fetches
    pub fn clear(&mut self) {
        self.generation += 1;
        self.reset();
    }

    pub fn is_current(&self, ticket: &DetailTicket) -> bool {
        self.generation == ticket.generation
            && self.selected.as_deref() == Some(ticket.instance_id.as_str())
    }

    /// Store a log result; returns false when the ticket is stale.
    pub fn apply_log(&mut self, ticket: &DetailTicket, result: LogResult) -> bool {
        if !self.is_current(ticket) {
            debug!(instance = %ticket.instance_id, "discarding stale log result");
            return false;
        }
        self.log = Some(result);
        true
    }

    /// Store a metrics result; returns false when the ticket is stale.
    pub fn apply_metrics(&mut self, ticket: &DetailTicket, result: MetricsResult) -> bool {
        if !self.is_current(ticket) {
            debug!(instance = %ticket.instance_id, "discarding stale metrics result");
            return false;
        }
        self.metrics = Some(result);
        true
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn log(&self) -> Option<&LogResult> {
        self.log.as_ref()
    }

    pub fn metrics(&self) -> Option<&MetricsResult> {
        self.metrics.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn reset(&mut self) {
        self.selected = None;
        self.log = None;
        self.metrics = None;
    }
}

pub fn resolve_log(response: Result<LogResponse, ApiError>) -> LogResult {
    match response {
        Ok(resp) if resp.success => LogResult::Text(resp.log.unwrap_or_default()),
        Ok(resp) => LogResult::Failed(format!(
            "Log retrieval failed: {}",
            resp.error_message.unwrap_or_else(|| "unknown error".into())
        )),
        Err(e) => LogResult::Failed(format!("Log retrieval error: {}", e)),
    }
}

pub fn resolve_metrics(response: Result<MetricsResponse, ApiError>) -> MetricsResult {
    match response {
        Ok(resp) if resp.success => {
            let cpu = resp.cpu_utilization.unwrap_or_default();
            let network_in = resp.network_in.unwrap_or_default();
            let network_out = resp.network_out.unwrap_or_default();
            MetricsResult::Ready(merger::merge(&cpu, &network_in, &network_out))
        }
        Ok(resp) => MetricsResult::Failed(
            resp.error_message
                .unwrap_or_else(|| "Metric retrieval failed".into()),
        ),
        Err(e) => MetricsResult::Failed(format!("Metric retrieval error: {}", e)),
    }
}

/// Issue the log and metrics fetches for `ticket` as two independent tasks.
/// Each reports back through `events` as soon as it completes.
pub fn spawn_detail_fetch(
    api: Arc<dyn FleetApi>,
    events: EventSender,
    ticket: DetailTicket,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let log_task = {
        let api = api.clone();
        let events = events.clone();
        let ticket = ticket.clone();
        tokio::spawn(async move {
            let result = resolve_log(api.logs(&ticket.instance_id).await);
            events.emit(DashboardEvent::LogResolved { ticket, result });
        })
    };

    let metrics_task = tokio::spawn(async move {
        let result = resolve_metrics(api.metrics(&ticket.instance_id).await);
        events.emit(DashboardEvent::MetricsResolved { ticket, result });
    });

    (log_task, metrics_task)
}
