pub mod draw;
pub mod theme;

use ratatui::widgets::TableState;

use fleetmon_core::model::{ControlAction, InstanceId};

pub use theme::styles;

/// A control action waiting for the operator's y/n
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingControl {
    pub instance_id: InstanceId,
    pub name: String,
    pub action: ControlAction,
}

/// Presenter-only state: cursor, scroll offset and prompt
#[derive(Debug, Default)]
pub struct UiState {
    pub cursor: usize,
    pub table: TableState,
    pub log_scroll: u16,
    pub confirm: Option<PendingControl>,
}

impl UiState {
    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn scroll_log(&mut self, delta: i32) {
        self.log_scroll = (self.log_scroll as i32 + delta).clamp(0, u16::MAX as i32) as u16;
    }
}
