//! Chart series builders
//!
//! Converts derived metrics into label/series pairs for the plot sink.
//! `None` points are gaps, not zeros.

use serde::{Deserialize, Serialize};

use crate::domain::services::{DayBucket, PriorityBreakdown, TeamPerformance};
use crate::domain::value_objects::Priority;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Created vs resolved, short range
    CaseVolume,
    /// Daily mean response and resolution minutes, long range
    ResponseTrend,
    PendingByPriority,
    AgentWorkload,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Option<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

fn labels(buckets: &[DayBucket]) -> Vec<String> {
    buckets.iter().map(|b| b.label.clone()).collect()
}

pub fn case_volume(buckets: &[DayBucket]) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::CaseVolume,
        labels: labels(buckets),
        series: vec![
            Series { name: "Created".into(), points: buckets.iter().map(|b| Some(b.created as f64)).collect() },
            Series { name: "Resolved".into(), points: buckets.iter().map(|b| Some(b.resolved as f64)).collect() },
        ],
    }
}

pub fn response_trend(buckets: &[DayBucket]) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::ResponseTrend,
        labels: labels(buckets),
        series: vec![
            Series { name: "Avg response (min)".into(), points: buckets.iter().map(|b| b.avg_response_minutes).collect() },
            Series { name: "Avg resolution (min)".into(), points: buckets.iter().map(|b| b.avg_resolution_minutes).collect() },
        ],
    }
}

/// The unknown slice only appears when there is something in it
pub fn pending_by_priority(breakdown: &PriorityBreakdown) -> ChartSpec {
    let mut labels: Vec<String> = Priority::ALL.iter().map(|p| p.as_str().to_string()).collect();
    let mut points: Vec<Option<f64>> = Priority::ALL.iter().map(|p| Some(breakdown.get(*p) as f64)).collect();
    if breakdown.unknown > 0 {
        labels.push("unknown".into());
        points.push(Some(breakdown.unknown as f64));
    }
    ChartSpec {
        kind: ChartKind::PendingByPriority,
        labels,
        series: vec![Series { name: "Pending".into(), points }],
    }
}

pub fn agent_workload(team: &TeamPerformance) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::AgentWorkload,
        labels: team.agents.iter().map(|a| a.name.clone()).collect(),
        series: vec![
            Series { name: "Pending".into(), points: team.agents.iter().map(|a| Some(a.pending_cases as f64)).collect() },
            Series { name: "Capacity".into(), points: team.agents.iter().map(|a| Some(f64::from(a.capacity))).collect() },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Case;
    use crate::domain::services::{daily_buckets, BucketWindow};
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_response_trend_keeps_gaps() {
        let window = BucketWindow::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 3);
        let cases = vec![Case::new("a", Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()).with_response_minutes(20.0)];
        let spec = response_trend(&daily_buckets(window, &cases));

        assert_eq!(spec.labels, vec!["Jan 01", "Jan 02", "Jan 03"]);
        assert_eq!(spec.series[0].points, vec![None, Some(20.0), None]);
        assert_eq!(spec.series[1].points, vec![None, None, None]);
    }

    #[test]
    fn test_priority_chart_unknown_slice() {
        let mut breakdown = PriorityBreakdown { vip: 1, urgent: 2, normal: 3, low: 4, unknown: 0 };
        assert_eq!(pending_by_priority(&breakdown).labels.len(), 4);

        breakdown.unknown = 2;
        let spec = pending_by_priority(&breakdown);
        assert_eq!(spec.labels.last().map(String::as_str), Some("unknown"));
        assert_eq!(spec.series[0].points, vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(2.0)]);
    }
}
