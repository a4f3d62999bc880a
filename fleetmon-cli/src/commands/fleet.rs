use std::fmt::Write;
use std::sync::Arc;

use anyhow::bail;

use fleetmon_core::api::FleetApi;
use fleetmon_core::model::FleetSnapshot;
use fleetmon_core::state::FleetView;

use super::OneShot;

pub fn format_fleet(fleet: &FleetSnapshot) -> String {
    if fleet.is_empty() {
        return "No instances found.\n".to_string();
    }

    let name_width = fleet
        .instances
        .iter()
        .map(|i| i.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<20}  {:<13}  {:<6}  {:<6}  {:<15}  {}",
        "NAME", "ID", "STATE", "SYSTEM", "INST", "ADDRESS", "TYPE"
    );
    for inst in &fleet.instances {
        let check = |ok: bool| if ok { "ok" } else { "failed" };
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<20}  {:<13}  {:<6}  {:<6}  {:<15}  {}",
            inst.name,
            inst.instance_id,
            inst.state.as_str().to_uppercase(),
            check(inst.system_check.is_ok()),
            check(inst.instance_check.is_ok()),
            inst.display_address(),
            inst.instance_type.as_deref().unwrap_or("N/A"),
        );
    }
    let _ = writeln!(
        out,
        "\n{}/{} running · last updated {}",
        fleet.running_count(),
        fleet.len(),
        fleet.last_updated()
    );
    out
}

pub async fn run_status(api: Arc<dyn FleetApi>) -> anyhow::Result<()> {
    let mut oneshot = OneShot::new(api);
    oneshot.poll().await;

    match oneshot.state.view() {
        FleetView::Ready(fleet) => {
            print!("{}", format_fleet(fleet));
            Ok(())
        }
        FleetView::Error(message) => bail!("{}", message),
        FleetView::Loading => bail!("no status received"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::Server;
    use serde_json::json;

    use super::*;
    use crate::http::HttpFleetApi;
    use fleetmon_core::model::InstanceSnapshot;
    use fleetmon_core::state::{CONNECTIVITY_ERROR, STATUS_FALLBACK_ERROR};

    fn instance(id: &str, name: &str, state: &str) -> InstanceSnapshot {
        serde_json::from_value(json!({
            "InstanceId": id,
            "Name": name,
            "InstanceState": state,
            "SystemStatus": "ok",
            "InstanceStatus": "impaired",
            "PrivateIp": "10.0.0.7",
            "LastUpdated": "2024-05-01 10:00:00 UTC"
        }))
        .unwrap()
    }

    #[test]
    fn test_format_fleet() {
        let fleet = FleetSnapshot::new(vec![
            instance("i-1", "web", "running"),
            instance("i-2", "batch", "stopped"),
        ]);
        let out = format_fleet(&fleet);
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].contains("RUNNING"));
        assert!(lines[1].contains("10.0.0.7"));
        assert!(lines[1].contains("failed"));
        assert!(lines[2].contains("STOPPED"));
        assert!(out.contains("1/2 running · last updated 2024-05-01 10:00:00 UTC"));
    }

    #[test]
    fn test_format_empty_fleet() {
        assert_eq!(format_fleet(&FleetSnapshot::default()), "No instances found.\n");
    }

    #[tokio::test]
    async fn test_status_rejected_without_message_uses_fallback() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/status")
            .with_status(200)
            .with_body(json!({"success": false}).to_string())
            .create_async()
            .await;

        let api = HttpFleetApi::new(&format!("{}/api", server.url()), Duration::from_secs(2)).unwrap();
        let err = run_status(Arc::new(api)).await.unwrap_err();
        assert_eq!(err.to_string(), STATUS_FALLBACK_ERROR);
    }

    #[tokio::test]
    async fn test_status_unreachable_reports_connectivity() {
        let api = HttpFleetApi::new("http://127.0.0.1:1/api", Duration::from_millis(500)).unwrap();
        let err = run_status(Arc::new(api)).await.unwrap_err();
        assert_eq!(err.to_string(), CONNECTIVITY_ERROR);
    }
}
