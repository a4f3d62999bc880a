//! Merging of per-metric sample streams into chart rows
//!
//! The metrics endpoint returns CPU, network-in and network-out as three
//! separate arrays. The merged series has one row per CPU sample; the
//! network streams are matched by index, not by timestamp, and missing
//! positions read as zero.

use crate::api::MetricSample;

/// One chart row
#[derive(Clone, Debug, PartialEq)]
pub struct MergedPoint {
    pub timestamp: String,
    pub cpu: f64,
    pub network_in: f64,
    pub network_out: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedSeries {
    pub points: Vec<MergedPoint>,
}

/// Merge the three streams by index. Output length is `cpu.len()`.
pub fn merge(
    cpu: &[MetricSample],
    network_in: &[MetricSample],
    network_out: &[MetricSample],
) -> MergedSeries {
    let value_at = |samples: &[MetricSample], i: usize| samples.get(i).map_or(0.0, |s| s.value);

    let points = cpu
        .iter()
        .enumerate()
        .map(|(i, sample)| MergedPoint {
            timestamp: sample.timestamp.clone(),
            cpu: sample.value,
            network_in: value_at(network_in, i),
            network_out: value_at(network_out, i),
        })
        .collect();

    MergedSeries { points }
}

impl MergedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// CPU values as (index, value) pairs for Chart rendering
    pub fn cpu_points(&self) -> Vec<(f64, f64)> {
        self.project(|p| p.cpu)
    }

    pub fn network_in_points(&self) -> Vec<(f64, f64)> {
        self.project(|p| p.network_in)
    }

    pub fn network_out_points(&self) -> Vec<(f64, f64)> {
        self.project(|p| p.network_out)
    }

    /// Largest network value in either direction, 0 when empty
    pub fn max_network(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.network_in.max(p.network_out))
            .fold(0.0, f64::max)
    }

    /// First and last timestamps, for axis labels
    pub fn labels(&self) -> Option<(&str, &str)> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some((first.timestamp.as_str(), last.timestamp.as_str()))
    }

    fn project(&self, f: impl Fn(&MergedPoint) -> f64) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, f(p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[(&str, f64)]) -> Vec<MetricSample> {
        values
            .iter()
            .map(|(t, v)| MetricSample::new(*t, *v))
            .collect()
    }

    #[test]
    fn test_merge_aligned_streams() {
        let cpu = samples(&[("10:00", 1.5), ("10:05", 2.5)]);
        let net_in = samples(&[("10:00", 100.0), ("10:05", 200.0)]);
        let net_out = samples(&[("10:00", 10.0), ("10:05", 20.0)]);

        let merged = merge(&cpu, &net_in, &net_out);
        assert_eq!(
            merged.points,
            vec![
                MergedPoint {
                    timestamp: "10:00".into(),
                    cpu: 1.5,
                    network_in: 100.0,
                    network_out: 10.0,
                },
                MergedPoint {
                    timestamp: "10:05".into(),
                    cpu: 2.5,
                    network_in: 200.0,
                    network_out: 20.0,
                },
            ]
        );
    }

    #[test]
    fn test_short_network_stream_reads_zero() {
        let cpu = samples(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        let net_in = samples(&[("a", 5.0), ("b", 6.0)]);
        let net_out = samples(&[("a", 7.0), ("b", 8.0), ("c", 9.0), ("d", 10.0)]);

        let merged = merge(&cpu, &net_in, &net_out);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.points[2].network_in, 0.0);
        assert_eq!(merged.points[3].network_in, 0.0);
        assert_eq!(merged.points[3].network_out, 10.0);
    }

    #[test]
    fn test_length_follows_cpu() {
        let net = samples(&[("a", 1.0), ("b", 2.0)]);
        assert!(merge(&[], &net, &net).is_empty());

        let cpu = samples(&[("a", 1.0)]);
        assert_eq!(merge(&cpu, &net, &net).len(), 1);
    }

    #[test]
    fn test_timestamps_are_not_reconciled() {
        let cpu = samples(&[("10:00", 1.0)]);
        let net_in = samples(&[("09:55", 42.0)]);
        let merged = merge(&cpu, &net_in, &[]);
        assert_eq!(merged.points[0].timestamp, "10:00");
        assert_eq!(merged.points[0].network_in, 42.0);
        assert_eq!(merged.points[0].network_out, 0.0);
    }

    #[test]
    fn test_chart_helpers() {
        let cpu = samples(&[("10:00", 1.0), ("10:05", 3.0)]);
        let net_in = samples(&[("10:00", 50.0), ("10:05", 10.0)]);
        let net_out = samples(&[("10:00", 5.0), ("10:05", 80.0)]);
        let merged = merge(&cpu, &net_in, &net_out);

        assert_eq!(merged.cpu_points(), vec![(0.0, 1.0), (1.0, 3.0)]);
        assert_eq!(merged.network_out_points(), vec![(0.0, 5.0), (1.0, 80.0)]);
        assert_eq!(merged.max_network(), 80.0);
        assert_eq!(merged.labels(), Some(("10:00", "10:05")));
        assert_eq!(MergedSeries::default().labels(), None);
        assert_eq!(MergedSeries::default().max_network(), 0.0);
    }
}
