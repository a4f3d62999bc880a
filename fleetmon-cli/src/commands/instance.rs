use std::fmt::Write;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, bail};

use fleetmon_core::api::FleetApi;
use fleetmon_core::detail::{LogResult, MetricsResult, resolve_log, resolve_metrics};
use fleetmon_core::merger::MergedSeries;
use fleetmon_core::model::ControlAction;
use fleetmon_core::state::FleetView;

use super::OneShot;
use crate::ui::draw::format_bytes;

pub async fn run_logs(api: Arc<dyn FleetApi>, instance_id: &str) -> anyhow::Result<()> {
    match resolve_log(api.logs(instance_id).await) {
        LogResult::Text(text) if text.is_empty() => {
            println!("(empty log)");
            Ok(())
        }
        LogResult::Text(text) => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        LogResult::Failed(message) => bail!("{}", message),
        LogResult::Loading => bail!("log fetch did not complete"),
    }
}

pub fn format_series(series: &MergedSeries) -> String {
    if series.is_empty() {
        return "No datapoints in the last hour.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<8}  {:>7}  {:>10}  {:>10}", "TIME", "CPU %", "NET IN", "NET OUT");
    for p in &series.points {
        let _ = writeln!(
            out,
            "{:<8}  {:>7.2}  {:>10}  {:>10}",
            p.timestamp,
            p.cpu,
            format_bytes(p.network_in),
            format_bytes(p.network_out)
        );
    }
    out
}

pub async fn run_metrics(api: Arc<dyn FleetApi>, instance_id: &str) -> anyhow::Result<()> {
    match resolve_metrics(api.metrics(instance_id).await) {
        MetricsResult::Ready(series) => {
            print!("{}", format_series(&series));
            Ok(())
        }
        MetricsResult::Failed(message) => bail!("{}", message),
        MetricsResult::Pending => bail!("metrics fetch did not complete"),
    }
}

/// Look the instance up, refuse actions the table would not offer, then send
/// the request and report what the follow-up poll saw.
pub async fn run_control(
    api: Arc<dyn FleetApi>,
    instance_id: &str,
    action: ControlAction,
) -> anyhow::Result<()> {
    let mut oneshot = OneShot::new(api);
    oneshot.poll().await;

    let name = match oneshot.state.view() {
        FleetView::Ready(fleet) => {
            let inst = fleet
                .find(instance_id)
                .with_context(|| format!("unknown instance '{}'", instance_id))?;
            if inst.available_action() != Some(action) {
                bail!(
                    "cannot {} {}: instance is {}",
                    action,
                    inst.name,
                    inst.state.as_str().to_uppercase()
                );
            }
            inst.name.clone()
        }
        FleetView::Error(message) => bail!("{}", message),
        FleetView::Loading => bail!("no status received"),
    };

    oneshot.control(instance_id, action, &name).await;

    for notice in oneshot.take_notices() {
        println!("{}", notice);
    }
    for alert in oneshot.state.visible_alerts(SystemTime::now()) {
        if alert.transition.is_some() {
            println!("{}", alert.message);
        }
    }
    if let FleetView::Ready(fleet) = oneshot.state.view() {
        if let Some(inst) = fleet.find(instance_id) {
            println!("{}: {}", name, inst.state.as_str().to_uppercase());
        }
    }
    Ok(())
}
