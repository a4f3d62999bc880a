use std::io;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crossterm::{
    event::{self, Event as CEvent, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::RwLock;
use tracing::{debug, info};

use fleetmon_core::api::FleetApi;
use fleetmon_core::detail::spawn_detail_fetch;
use fleetmon_core::model::{ControlAction, FleetSnapshot, InstanceId};
use fleetmon_core::poll::PollLoop;
use fleetmon_core::reducer::EventSender;
use fleetmon_core::state::{DashboardState, FleetView};

use crate::ui::{PendingControl, UiState, draw::draw};

const LOG_PAGE: i32 = 10;

// --- Terminal setup/teardown ---
pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    Quit,
    MoveUp,
    MoveDown,
    ToggleDetail,
    CloseDetail,
    RequestControl,
    Confirm,
    Cancel,
    Refresh,
    ScrollLog(i32),
}

/// Map a key press to an action. While a confirmation is open only y/n/Esc
/// mean anything.
pub fn key_action(code: KeyCode, modifiers: KeyModifiers, confirming: bool) -> Option<UiAction> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Some(UiAction::Quit);
    }

    if confirming {
        return match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UiAction::Confirm),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(UiAction::Cancel),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(UiAction::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(UiAction::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(UiAction::MoveDown),
        KeyCode::Enter => Some(UiAction::ToggleDetail),
        KeyCode::Esc => Some(UiAction::CloseDetail),
        KeyCode::Char('s') => Some(UiAction::RequestControl),
        KeyCode::Char('r') => Some(UiAction::Refresh),
        KeyCode::PageUp => Some(UiAction::ScrollLog(-LOG_PAGE)),
        KeyCode::PageDown => Some(UiAction::ScrollLog(LOG_PAGE)),
        _ => None,
    }
}

/// The row under the cursor, as the key handlers need it
#[derive(Clone, Debug)]
struct CursorTarget {
    instance_id: InstanceId,
    name: String,
    action: Option<ControlAction>,
}

fn cursor_target(fleet: Option<&FleetSnapshot>, cursor: usize) -> Option<CursorTarget> {
    fleet
        .and_then(|f| f.instances.get(cursor))
        .map(|inst| CursorTarget {
            instance_id: inst.instance_id.clone(),
            name: inst.name.clone(),
            action: inst.available_action(),
        })
}

pub async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: Arc<RwLock<DashboardState>>,
    poller: &PollLoop,
    api: Arc<dyn FleetApi>,
    events: EventSender,
    api_url: &str,
) -> io::Result<()> {
    let mut ui = UiState::default();

    loop {
        let now = SystemTime::now();
        state.write().await.alerts.expire(now);

        let snapshot = state.read().await;
        terminal.draw(|f| draw(f, &snapshot, &mut ui, api_url, now))?;

        let fleet = match snapshot.view() {
            FleetView::Ready(fleet) => Some(fleet),
            _ => None,
        };
        let fleet_len = fleet.map_or(0, |f| f.len());
        let target = cursor_target(fleet, ui.cursor);
        drop(snapshot);

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        let CEvent::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        let Some(action) = key_action(code, modifiers, ui.confirm.is_some()) else {
            continue;
        };

        match action {
            UiAction::Quit => {
                info!("quitting");
                return Ok(());
            }
            UiAction::MoveUp => ui.move_cursor(-1, fleet_len),
            UiAction::MoveDown => ui.move_cursor(1, fleet_len),
            UiAction::ScrollLog(delta) => ui.scroll_log(delta),
            UiAction::ToggleDetail => {
                let Some(target) = target else { continue };
                let ticket = state.write().await.detail.select(&target.instance_id);
                ui.log_scroll = 0;
                if let Some(ticket) = ticket {
                    debug!(instance = %ticket.instance_id, generation = ticket.generation, "opening detail");
                    spawn_detail_fetch(api.clone(), events.clone(), ticket);
                }
            }
            UiAction::CloseDetail => {
                state.write().await.detail.clear();
                ui.log_scroll = 0;
            }
            UiAction::RequestControl => {
                if let Some(CursorTarget {
                    instance_id,
                    name,
                    action: Some(action),
                }) = target
                {
                    ui.confirm = Some(PendingControl {
                        instance_id,
                        name,
                        action,
                    });
                }
            }
            UiAction::Confirm => {
                if let Some(pending) = ui.confirm.take() {
                    let handle = poller.handle();
                    tokio::spawn(async move {
                        handle
                            .control(&pending.instance_id, pending.action, &pending.name)
                            .await;
                    });
                }
            }
            UiAction::Cancel => ui.confirm = None,
            UiAction::Refresh => {
                poller.refresh();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetmon_core::model::InstanceSnapshot;
    use serde_json::json;

    fn no_mods(code: KeyCode, confirming: bool) -> Option<UiAction> {
        key_action(code, KeyModifiers::NONE, confirming)
    }

    fn instance(id: &str, name: &str, state: &str) -> InstanceSnapshot {
        serde_json::from_value(json!({
            "InstanceId": id,
            "Name": name,
            "InstanceState": state,
        }))
        .unwrap()
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(no_mods(KeyCode::Up, false), Some(UiAction::MoveUp));
        assert_eq!(no_mods(KeyCode::Char('j'), false), Some(UiAction::MoveDown));
        assert_eq!(no_mods(KeyCode::Enter, false), Some(UiAction::ToggleDetail));
        assert_eq!(no_mods(KeyCode::Esc, false), Some(UiAction::CloseDetail));
        assert_eq!(
            no_mods(KeyCode::PageDown, false),
            Some(UiAction::ScrollLog(LOG_PAGE))
        );
        assert_eq!(no_mods(KeyCode::Char('x'), false), None);
    }

    #[test]
    fn test_confirmation_swallows_other_keys() {
        assert_eq!(no_mods(KeyCode::Char('y'), true), Some(UiAction::Confirm));
        assert_eq!(no_mods(KeyCode::Esc, true), Some(UiAction::Cancel));
        assert_eq!(no_mods(KeyCode::Char('q'), true), None);
        assert_eq!(no_mods(KeyCode::Char('r'), true), None);
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        assert_eq!(
            key_action(KeyCode::Char('c'), KeyModifiers::CONTROL, true),
            Some(UiAction::Quit)
        );
    }

    #[test]
    fn test_cursor_target() {
        let up = instance("i-1", "web", "running");
        let busy = instance("i-2", "db", "stopping");

        let fleet = FleetSnapshot::new(vec![up, busy]);

        let first = cursor_target(Some(&fleet), 0).unwrap();
        assert_eq!(first.instance_id, "i-1");
        assert_eq!(first.action, Some(ControlAction::Stop));

        let second = cursor_target(Some(&fleet), 1).unwrap();
        assert_eq!(second.action, None);

        assert!(cursor_target(Some(&fleet), 2).is_none());
        assert!(cursor_target(None, 0).is_none());
    }

    #[test]
    fn test_move_cursor_clamps() {
        let mut ui = UiState::default();
        ui.move_cursor(-1, 3);
        assert_eq!(ui.cursor, 0);
        ui.move_cursor(5, 3);
        assert_eq!(ui.cursor, 2);
        ui.move_cursor(1, 0);
        assert_eq!(ui.cursor, 0);
    }
}
