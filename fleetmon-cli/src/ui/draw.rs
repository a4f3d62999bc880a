use std::time::SystemTime;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span, Text},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table, Wrap,
    },
};

use fleetmon_core::detail::{DetailSession, LogResult, MetricsResult};
use fleetmon_core::detector::AlertEvent;
use fleetmon_core::merger::MergedSeries;
use fleetmon_core::model::{ControlAction, FleetSnapshot, InstanceSnapshot};
use fleetmon_core::state::{DashboardState, FleetView};

use super::{PendingControl, UiState, styles};

pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{:.0}{}", value, UNITS[unit])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}

pub fn draw(f: &mut Frame, state: &DashboardState, ui: &mut UiState, api_url: &str, now: SystemTime) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    let view = state.view();
    draw_header(f, chunks[0], view, api_url);

    match view {
        FleetView::Error(message) => draw_message(
            f,
            chunks[1],
            " Fleet ",
            &format!("Error: {}", message),
            styles::error(),
        ),
        FleetView::Loading => draw_message(
            f,
            chunks[1],
            " Fleet ",
            "Loading fleet status...",
            styles::text_dim(),
        ),
        FleetView::Ready(fleet) => draw_fleet(f, chunks[1], fleet, &state.detail, ui),
    }

    draw_footer(f, chunks[2]);
    draw_alerts(f, area, state.visible_alerts(now));

    if let Some(pending) = &ui.confirm {
        draw_confirm(f, area, pending);
    }
}

fn draw_header(f: &mut Frame, area: Rect, view: FleetView<'_>, api_url: &str) {
    let mut spans = vec![
        Span::styled(" ☁ fleetmon ", styles::title()),
        Span::styled(format!(" {} ", api_url), styles::accent()),
    ];
    if let FleetView::Ready(fleet) = view {
        spans.push(Span::styled(
            format!(
                "  {}/{} running  ·  last updated {}",
                fleet.running_count(),
                fleet.len(),
                fleet.last_updated()
            ),
            styles::text_dim(),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_subtle()),
    );
    f.render_widget(header, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints = [
        ("↑↓", "move"),
        ("⏎", "details"),
        ("s", "start/stop"),
        ("r", "refresh"),
        ("PgUp/PgDn", "scroll log"),
        ("esc", "close"),
        ("q", "quit"),
    ];
    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(format!(" {} ", key), styles::key_hint()),
                Span::styled(format!("{} ", label), styles::text_muted()),
            ]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_message(f: &mut Frame, area: Rect, title: &str, message: &str, style: ratatui::style::Style) {
    let paragraph = Paragraph::new(Span::styled(message.to_string(), style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(styles::border_subtle()),
        );
    f.render_widget(paragraph, area);
}

fn action_span(inst: &InstanceSnapshot) -> Span<'static> {
    match inst.available_action() {
        Some(ControlAction::Stop) => Span::styled("[s] stop", styles::error()),
        Some(ControlAction::Start) => Span::styled("[s] start", styles::success()),
        None => Span::styled("busy", styles::text_muted()),
    }
}

fn draw_fleet(
    f: &mut Frame,
    area: Rect,
    fleet: &FleetSnapshot,
    detail: &DetailSession,
    ui: &mut UiState,
) {
    if fleet.is_empty() {
        draw_message(f, area, " Instances ", "No instances found.", styles::text_dim());
        return;
    }

    let selected = detail.selected();
    let expanded = selected.and_then(|id| fleet.find(id));

    let (table_area, detail_area) = match expanded {
        Some(_) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(area);
            (split[0], Some(split[1]))
        }
        None => (area, None),
    };

    let rows: Vec<Row> = fleet
        .instances
        .iter()
        .map(|inst| {
            let marker = if selected == Some(inst.instance_id.as_str()) {
                "▾"
            } else {
                "▸"
            };
            let state_style = styles::state(&inst.state);
            Row::new(vec![
                Cell::from(format!("{} {}", marker, inst.name)),
                Cell::from(Span::styled(inst.instance_id.clone(), styles::text_dim())),
                Cell::from(Line::from(vec![
                    Span::styled(format!("{} ", styles::state_icon(&inst.state)), state_style),
                    Span::styled(inst.state.as_str().to_uppercase(), state_style),
                ])),
                Cell::from(Line::from(vec![
                    Span::styled(
                        styles::check_icon(&inst.system_check),
                        styles::check(&inst.system_check),
                    ),
                    Span::raw(" "),
                    Span::styled(
                        styles::check_icon(&inst.instance_check),
                        styles::check(&inst.instance_check),
                    ),
                ])),
                Cell::from(inst.display_address().to_string()),
                Cell::from(inst.instance_type.clone().unwrap_or_default()),
                Cell::from(action_span(inst)),
            ])
        })
        .collect();

    let header = Row::new(vec!["Name", "ID", "State", "Checks", "Address", "Type", "Control"])
        .style(styles::section_header());

    let widths = [
        Constraint::Percentage(20),
        Constraint::Length(21),
        Constraint::Length(16),
        Constraint::Length(7),
        Constraint::Length(16),
        Constraint::Length(11),
        Constraint::Min(9),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(styles::selection())
        .block(
            Block::default()
                .title(" Instances ")
                .borders(Borders::ALL)
                .border_style(styles::border_focused()),
        );

    ui.cursor = ui.cursor.min(fleet.len() - 1);
    ui.table.select(Some(ui.cursor));
    f.render_stateful_widget(table, table_area, &mut ui.table);

    if let (Some(inst), Some(detail_area)) = (expanded, detail_area) {
        draw_detail(f, detail_area, inst, detail, ui.log_scroll);
    }
}

fn draw_detail(
    f: &mut Frame,
    area: Rect,
    inst: &InstanceSnapshot,
    detail: &DetailSession,
    log_scroll: u16,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let log_text = match detail.log() {
        None | Some(LogResult::Loading) => Text::styled("Loading log...", styles::text_dim()),
        Some(LogResult::Text(text)) if text.is_empty() => {
            Text::styled("(empty log)", styles::text_muted())
        }
        Some(LogResult::Text(text)) => Text::styled(text.clone(), styles::text()),
        Some(LogResult::Failed(message)) => Text::styled(message.clone(), styles::error()),
    };

    let log = Paragraph::new(log_text)
        .wrap(Wrap { trim: false })
        .scroll((log_scroll, 0))
        .block(
            Block::default()
                .title(format!(" System log · {} ", inst.name))
                .borders(Borders::ALL)
                .border_style(styles::border_subtle()),
        );
    f.render_widget(log, cols[0]);

    match detail.metrics() {
        None | Some(MetricsResult::Pending) => draw_message(
            f,
            cols[1],
            " Metrics ",
            "Loading metrics...",
            styles::text_dim(),
        ),
        Some(MetricsResult::Failed(message)) => {
            draw_message(f, cols[1], " Metrics ", message, styles::error())
        }
        Some(MetricsResult::Ready(series)) if series.is_empty() => draw_message(
            f,
            cols[1],
            " Metrics ",
            "No datapoints in the last hour.",
            styles::text_muted(),
        ),
        Some(MetricsResult::Ready(series)) => draw_charts(f, cols[1], series),
    }
}

fn draw_charts(f: &mut Frame, area: Rect, series: &MergedSeries) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let cpu_data = series.cpu_points();
    let in_data = series.network_in_points();
    let out_data = series.network_out_points();

    let x_max = series.len().saturating_sub(1).max(1) as f64;
    let (first, last) = series.labels().unwrap_or(("", ""));
    let x_labels = vec![
        Span::styled(first.to_string(), styles::text_dim()),
        Span::styled(last.to_string(), styles::text_dim()),
    ];

    let cpu_dataset = Dataset::default()
        .name("CPU (%)")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(styles::accent())
        .data(&cpu_data);

    let cpu_chart = Chart::new(vec![cpu_dataset])
        .block(
            Block::default()
                .title(" CPU % ")
                .borders(Borders::ALL)
                .border_style(styles::border_subtle()),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(x_labels.clone()),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, 100.0])
                .labels(vec![Span::raw("0"), Span::raw("100")]),
        );
    f.render_widget(cpu_chart, rows[0]);

    let net_max = series.max_network().max(1.0);
    let in_dataset = Dataset::default()
        .name("Net In")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(styles::success())
        .data(&in_data);
    let out_dataset = Dataset::default()
        .name("Net Out")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(styles::warn())
        .data(&out_data);

    let net_chart = Chart::new(vec![in_dataset, out_dataset])
        .block(
            Block::default()
                .title(" Network ")
                .borders(Borders::ALL)
                .border_style(styles::border_subtle()),
        )
        .x_axis(Axis::default().bounds([0.0, x_max]).labels(x_labels))
        .y_axis(
            Axis::default()
                .bounds([0.0, net_max])
                .labels(vec![Span::raw("0"), Span::raw(format_bytes(net_max))]),
        );
    f.render_widget(net_chart, rows[1]);
}

/// Bottom-right popup holding the current alert batch
fn draw_alerts(f: &mut Frame, area: Rect, alerts: &[AlertEvent]) {
    if alerts.is_empty() {
        return;
    }

    let width = area.width.min(64);
    let height = (alerts.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + area.height.saturating_sub(height + 1),
        width,
        height,
    };

    let lines: Vec<Line> = alerts
        .iter()
        .map(|a| Line::from(Span::styled(a.message.clone(), styles::warn())))
        .collect();

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(" Alert ")
                .borders(Borders::ALL)
                .border_style(styles::warn()),
        ),
        popup,
    );
}

fn draw_confirm(f: &mut Frame, area: Rect, pending: &PendingControl) {
    let width = area.width.min(56);
    let height = 5.min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let verb = match pending.action {
        ControlAction::Start => "Start",
        ControlAction::Stop => "Stop",
    };
    let text = vec![
        Line::from(Span::styled(
            format!("{} {} ({})?", verb, pending.name, pending.instance_id),
            styles::title(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y ", styles::key_hint()),
            Span::styled("confirm  ", styles::text_muted()),
            Span::styled(" n ", styles::key_hint()),
            Span::styled("cancel", styles::text_muted()),
        ]),
    ];

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .title(" Confirm ")
                .borders(Borders::ALL)
                .border_style(styles::border_focused()),
        ),
        popup,
    );
}
