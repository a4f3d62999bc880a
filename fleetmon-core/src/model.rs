use std::fmt;

use serde::{Deserialize, Serialize};

pub type InstanceId = String;

/// Lifecycle state reported for an instance.
///
/// Unknown transitional values are kept verbatim so they still render and
/// still compare correctly between polls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Stopping,
    Stopped,
    Terminated,
    Other(String),
}

impl InstanceState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Terminated => "terminated",
            Self::Other(raw) => raw,
        }
    }

    /// States that are mid-way between running and stopped
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Pending | Self::Stopping | Self::ShuttingDown)
    }
}

impl From<String> for InstanceState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" => Self::ShuttingDown,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            "terminated" => Self::Terminated,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for InstanceState {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<InstanceState> for String {
    fn from(state: InstanceState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a status check. Anything other than `ok` counts as failed;
/// the raw server value is kept for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckStatus {
    Ok,
    Failed(String),
}

impl CheckStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl Default for CheckStatus {
    fn default() -> Self {
        Self::Failed("unknown".into())
    }
}

impl From<String> for CheckStatus {
    fn from(raw: String) -> Self {
        if raw == "ok" {
            Self::Ok
        } else {
            Self::Failed(raw)
        }
    }
}

impl From<CheckStatus> for String {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Ok => "ok".into(),
            CheckStatus::Failed(raw) => raw,
        }
    }
}

/// Operator action accepted by the control endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(format!("invalid action '{}', use 'start' or 'stop'", other)),
        }
    }
}

/// One row of the fleet table as reported by `GET /status`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    #[serde(rename = "InstanceId")]
    pub instance_id: InstanceId,
    #[serde(rename = "Name", default = "default_name")]
    pub name: String,
    #[serde(rename = "InstanceState")]
    pub state: InstanceState,
    #[serde(rename = "SystemStatus", default)]
    pub system_check: CheckStatus,
    #[serde(rename = "InstanceStatus", default)]
    pub instance_check: CheckStatus,
    #[serde(rename = "PublicIp", default)]
    pub public_address: Option<String>,
    #[serde(rename = "PrivateIp", default)]
    pub private_address: Option<String>,
    #[serde(rename = "InstanceType", default)]
    pub instance_type: Option<String>,
    #[serde(rename = "LastUpdated", default)]
    pub last_updated: String,
}

fn default_name() -> String {
    "N/A".into()
}

impl InstanceSnapshot {
    /// Public address, falling back to the private one
    pub fn display_address(&self) -> &str {
        self.public_address
            .as_deref()
            .or(self.private_address.as_deref())
            .unwrap_or("N/A")
    }

    /// The control action an operator may issue right now, if any
    pub fn available_action(&self) -> Option<ControlAction> {
        match self.state {
            InstanceState::Running => Some(ControlAction::Stop),
            InstanceState::Pending | InstanceState::Stopping => None,
            _ => Some(ControlAction::Start),
        }
    }
}

/// The whole fleet at one poll tick, in server order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FleetSnapshot {
    pub instances: Vec<InstanceSnapshot>,
}

impl FleetSnapshot {
    pub fn new(instances: Vec<InstanceSnapshot>) -> Self {
        Self { instances }
    }

    pub fn find(&self, id: &str) -> Option<&InstanceSnapshot> {
        self.instances.iter().find(|i| i.instance_id == id)
    }

    pub fn last_updated(&self) -> &str {
        self.instances
            .first()
            .map(|i| i.last_updated.as_str())
            .unwrap_or("N/A")
    }

    pub fn running_count(&self) -> usize {
        self.instances
            .iter()
            .filter(|i| i.state == InstanceState::Running)
            .count()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instance_from_wire() {
        let json = r#"{
            "InstanceId": "i-0abc",
            "Name": "web-1",
            "PublicIp": null,
            "PrivateIp": "10.0.0.4",
            "InstanceType": "t3.micro",
            "InstanceState": "running",
            "SystemStatus": "ok",
            "InstanceStatus": "initializing",
            "LastUpdated": "2024-05-01 10:00:00 UTC"
        }"#;
        let inst: InstanceSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(inst.instance_id, "i-0abc");
        assert_eq!(inst.state, InstanceState::Running);
        assert!(inst.system_check.is_ok());
        assert_eq!(inst.instance_check, CheckStatus::Failed("initializing".into()));
        assert_eq!(inst.display_address(), "10.0.0.4");
        assert_eq!(inst.available_action(), Some(ControlAction::Stop));
    }

    #[test]
    fn test_unknown_state_is_preserved() {
        let state = InstanceState::from("rebooting");
        assert_eq!(state, InstanceState::Other("rebooting".into()));
        assert_eq!(state.to_string(), "rebooting");
        assert_eq!(InstanceState::from("shutting-down"), InstanceState::ShuttingDown);
    }

    #[test]
    fn test_available_action_blocks_transitions() {
        let mut inst: InstanceSnapshot = serde_json::from_str(
            r#"{"InstanceId":"i-1","InstanceState":"pending"}"#,
        )
        .unwrap();
        assert_eq!(inst.name, "N/A");
        assert_eq!(inst.available_action(), None);

        inst.state = InstanceState::Stopping;
        assert_eq!(inst.available_action(), None);

        inst.state = InstanceState::Stopped;
        assert_eq!(inst.available_action(), Some(ControlAction::Start));
        assert_eq!(inst.display_address(), "N/A");
    }

    #[test]
    fn test_fleet_last_updated() {
        assert_eq!(FleetSnapshot::default().last_updated(), "N/A");
    }

    #[test]
    fn test_control_action_parse() {
        assert_eq!("start".parse::<ControlAction>(), Ok(ControlAction::Start));
        assert!("reboot".parse::<ControlAction>().is_err());
    }
}
