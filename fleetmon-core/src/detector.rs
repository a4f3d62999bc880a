use std::collections::BTreeMap;

use crate::model::{FleetSnapshot, InstanceId, InstanceState};

/// Last observed state per instance. Only grows; entries are overwritten on
/// every successful poll and never removed.
pub type StateMemory = BTreeMap<InstanceId, InstanceState>;

/// A transient notification shown in the alert slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertEvent {
    pub message: String,
    pub transition: Option<Transition>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub instance_id: InstanceId,
    pub from: InstanceState,
    pub to: InstanceState,
}

impl AlertEvent {
    /// Free-form alert with no transition attached (control notices)
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transition: None,
        }
    }

    fn transition(name: &str, transition: Transition) -> Self {
        Self {
            message: format!(
                "{} state changed from {} to {}",
                name,
                transition.from.as_str().to_uppercase(),
                transition.to.as_str().to_uppercase()
            ),
            transition: Some(transition),
        }
    }
}

/// Detects per-instance state transitions between consecutive snapshots.
#[derive(Clone, Debug, Default)]
pub struct StateChangeDetector {
    memory: StateMemory,
}

impl StateChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `snapshot` against memory and record its states.
    ///
    /// Alerts come back in snapshot order, one per instance whose state
    /// differs from the last one seen for the same id. An id seen for the
    /// first time never alerts.
    pub fn observe(&mut self, snapshot: &FleetSnapshot) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();

        for instance in &snapshot.instances {
            let previous = self
                .memory
                .insert(instance.instance_id.clone(), instance.state.clone());

            if let Some(from) = previous {
                if from != instance.state {
                    alerts.push(AlertEvent::transition(
                        &instance.name,
                        Transition {
                            instance_id: instance.instance_id.clone(),
                            from,
                            to: instance.state.clone(),
                        },
                    ));
                }
            }
        }

        alerts
    }

    pub fn memory(&self) -> &StateMemory {
        &self.memory
    }

    pub fn last_state(&self, id: &str) -> Option<&InstanceState> {
        self.memory.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckStatus, InstanceSnapshot};

    fn inst(id: &str, name: &str, state: &str) -> InstanceSnapshot {
        InstanceSnapshot {
            instance_id: id.into(),
            name: name.into(),
            state: InstanceState::from(state),
            system_check: CheckStatus::Ok,
            instance_check: CheckStatus::Ok,
            public_address: None,
            private_address: None,
            instance_type: None,
            last_updated: "2024-05-01 10:00:00 UTC".into(),
        }
    }

    #[test]
    fn test_first_observation_never_alerts() {
        let mut detector = StateChangeDetector::new();
        let snapshot = FleetSnapshot::new(vec![
            inst("i-1", "web", "running"),
            inst("i-2", "db", "terminated"),
            inst("i-3", "odd", "rebooting"),
        ]);

        assert!(detector.observe(&snapshot).is_empty());
        assert_eq!(detector.memory().len(), 3);
    }

    #[test]
    fn test_single_change_emits_one_alert() {
        let mut detector = StateChangeDetector::new();
        let s1 = FleetSnapshot::new(vec![
            inst("i-1", "web", "running"),
            inst("i-2", "db", "running"),
        ]);
        let s2 = FleetSnapshot::new(vec![
            inst("i-1", "web", "running"),
            inst("i-2", "db", "stopping"),
        ]);

        detector.observe(&s1);
        let alerts = detector.observe(&s2);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "db state changed from RUNNING to STOPPING");
        let transition = alerts[0].transition.as_ref().unwrap();
        assert_eq!(transition.instance_id, "i-2");
        assert_eq!(transition.from, InstanceState::Running);
        assert_eq!(transition.to, InstanceState::Stopping);

        for instance in &s2.instances {
            assert_eq!(detector.last_state(&instance.instance_id), Some(&instance.state));
        }
    }

    #[test]
    fn test_compares_by_id_not_position() {
        let mut detector = StateChangeDetector::new();
        detector.observe(&FleetSnapshot::new(vec![
            inst("i-1", "web", "running"),
            inst("i-2", "db", "stopped"),
        ]));

        // Same states, reversed order: nothing changed
        let alerts = detector.observe(&FleetSnapshot::new(vec![
            inst("i-2", "db", "stopped"),
            inst("i-1", "web", "running"),
        ]));
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_alerts_follow_snapshot_order() {
        let mut detector = StateChangeDetector::new();
        detector.observe(&FleetSnapshot::new(vec![
            inst("i-1", "a", "stopped"),
            inst("i-2", "b", "stopped"),
        ]));

        let alerts = detector.observe(&FleetSnapshot::new(vec![
            inst("i-2", "b", "pending"),
            inst("i-1", "a", "pending"),
        ]));
        let names: Vec<_> = alerts
            .iter()
            .map(|a| a.transition.as_ref().unwrap().instance_id.as_str())
            .collect();
        assert_eq!(names, vec!["i-2", "i-1"]);
    }

    #[test]
    fn test_memory_survives_missing_instances() {
        let mut detector = StateChangeDetector::new();
        detector.observe(&FleetSnapshot::new(vec![inst("i-1", "web", "running")]));
        detector.observe(&FleetSnapshot::default());
        assert_eq!(detector.last_state("i-1"), Some(&InstanceState::Running));

        let alerts = detector.observe(&FleetSnapshot::new(vec![inst("i-1", "web", "stopped")]));
        assert_eq!(alerts.len(), 1);
    }
}
