//! One-shot subcommands: run the same fetch/reduce path as the TUI once,
//! print the result, and exit.

mod fleet;
mod instance;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use fleetmon_core::api::FleetApi;
use fleetmon_core::model::ControlAction;
use fleetmon_core::poll::{DEFAULT_POLL_INTERVAL, PollHandle, PollLoop};
use fleetmon_core::reducer::{DashboardEvent, EventEnvelope, EventSender, reduce};
use fleetmon_core::state::DashboardState;

pub use fleet::run_status;
pub use instance::{run_control, run_logs, run_metrics};

/// A dashboard state driven by hand instead of by the timer
pub struct OneShot {
    pub state: DashboardState,
    handle: PollHandle,
    rx: UnboundedReceiver<EventEnvelope>,
    notices: Vec<String>,
}

impl OneShot {
    pub fn new(api: Arc<dyn FleetApi>) -> Self {
        let (events, rx) = EventSender::channel();
        let handle = PollLoop::new(api, events, DEFAULT_POLL_INTERVAL).handle();
        Self {
            state: DashboardState::default(),
            handle,
            rx,
            notices: Vec::new(),
        }
    }

    pub async fn poll(&mut self) {
        self.handle.poll_once().await;
        self.drain();
    }

    pub async fn control(&mut self, instance_id: &str, action: ControlAction, name: &str) {
        self.handle.control(instance_id, action, name).await;
        self.drain();
    }

    /// Notices raised so far, oldest first
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    fn drain(&mut self) {
        while let Ok(env) = self.rx.try_recv() {
            if let DashboardEvent::Notice { message } = &env.event {
                self.notices.push(message.clone());
            }
            reduce(&mut self.state, &env);
        }
    }
}
