//! Case metrics aggregation
//!
//! Turns an unordered batch of cases into the team overview numbers. The
//! pass never fails: malformed status or priority values are counted as
//! pending / unknown and surfaced through diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sla::SlaEvaluator;
use crate::domain::aggregates::Case;
use crate::domain::value_objects::Priority;

/// Pending cases by priority. `unknown` holds cases whose priority is
/// missing or not one of the four known tiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub vip: u64,
    pub urgent: u64,
    pub normal: u64,
    pub low: u64,
    pub unknown: u64,
}

impl PriorityBreakdown {
    pub fn get(&self, priority: Priority) -> u64 {
        match priority {
            Priority::Vip => self.vip,
            Priority::Urgent => self.urgent,
            Priority::Normal => self.normal,
            Priority::Low => self.low,
        }
    }

    fn bump(&mut self, priority: Option<Priority>) {
        match priority {
            Some(Priority::Vip) => self.vip += 1,
            Some(Priority::Urgent) => self.urgent += 1,
            Some(Priority::Normal) => self.normal += 1,
            Some(Priority::Low) => self.low += 1,
            None => self.unknown += 1,
        }
    }

    /// Sum of the four recognised tiers
    pub fn known_total(&self) -> u64 {
        self.vip + self.urgent + self.normal + self.low
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMetrics {
    pub total_cases: u64,
    pub total_resolved: u64,
    pub total_pending: u64,
    pub pending_breakdown: PriorityBreakdown,
    /// Rounded mean in minutes; 0 when nothing was measured
    pub team_avg_response_time: u64,
    /// Number of cases that contributed to the average
    pub response_samples: u64,
    pub overdue: u64,
}

impl CaseMetrics {
    /// Whether `team_avg_response_time` reflects real measurements
    pub fn has_response_data(&self) -> bool {
        self.response_samples > 0
    }
}

/// Aggregate a batch of cases. `now` is used for the overdue count only.
pub fn aggregate(cases: &[Case], now: DateTime<Utc>) -> CaseMetrics {
    let sla = SlaEvaluator::at(now);
    let mut metrics = CaseMetrics {
        total_cases: cases.len() as u64,
        ..Default::default()
    };
    let mut response_sum = 0.0;

    for case in cases {
        if case.is_resolved() {
            metrics.total_resolved += 1;
        } else {
            metrics.pending_breakdown.bump(case.parsed_priority());
            if sla.is_overdue(case) {
                metrics.overdue += 1;
            }
        }
        if let Some(minutes) = case.measured_response_minutes() {
            response_sum += minutes;
            metrics.response_samples += 1;
        }
    }

    metrics.total_pending = metrics.total_cases - metrics.total_resolved;
    metrics.team_avg_response_time = mean(response_sum, metrics.response_samples)
        .map(|avg| avg.round() as u64)
        .unwrap_or(0);

    if metrics.pending_breakdown.unknown > 0 {
        tracing::warn!(
            unknown = metrics.pending_breakdown.unknown,
            "Pending cases with missing or unrecognised priority"
        );
    }

    metrics
}

pub(crate) fn mean(sum: f64, samples: u64) -> Option<f64> {
    (samples > 0).then(|| sum / samples as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        assert_eq!(aggregate(&[], now()), CaseMetrics::default());
    }

    #[test]
    fn test_counts_and_breakdown() {
        let t = now() - Duration::hours(1);
        let cases = vec![
            Case::new("1", t).with_priority("vip"),
            Case::new("2", t).with_priority(" URGENT ").with_status("escalated"),
            Case::new("3", t).with_priority("normal").with_status("Resolved"),
            Case::new("4", t).with_priority("low").with_status("closed"),
            Case::new("5", t).with_priority("critical").with_status("pending_customer"),
            Case::new("6", t).with_priority("low").with_status("gibberish"),
        ];
        let m = aggregate(&cases, now());

        assert_eq!(m.total_cases, 6);
        assert_eq!(m.total_resolved, 2);
        assert_eq!(m.total_pending, 4);
        assert_eq!(m.pending_breakdown.vip, 1);
        assert_eq!(m.pending_breakdown.urgent, 1);
        assert_eq!(m.pending_breakdown.normal, 0);
        assert_eq!(m.pending_breakdown.low, 1);
        assert_eq!(m.pending_breakdown.unknown, 1);
    }

    #[test]
    fn test_missing_status_counts_as_pending() {
        let mut case = Case::new("1", now());
        case.status = None;
        let m = aggregate(&[case], now());
        assert_eq!(m.total_pending, 1);
        assert_eq!(m.pending_breakdown.normal, 1);
    }

    #[test]
    fn test_undated_case_counts_but_is_never_overdue() {
        let record = serde_json::json!({ "id": "u1", "priority": "vip", "created_at": "yesterday-ish" });
        let undated = Case::from_record(record.as_object().unwrap()).unwrap();
        let stale = Case::new("s1", now() - Duration::hours(30)).with_priority("vip");

        let m = aggregate(&[undated, stale], now());
        assert_eq!(m.total_cases, 2);
        assert_eq!(m.total_pending, 2);
        assert_eq!(m.pending_breakdown.vip, 2);
        assert_eq!(m.overdue, 1);
    }

    #[test]
    fn test_average_response_skips_unmeasured() {
        let t = now();
        let cases = vec![
            Case::new("1", t).with_response_minutes(10.0),
            Case::new("2", t).with_response_minutes(21.0),
            Case::new("3", t).with_response_minutes(0.0),
            Case::new("4", t).with_response_minutes(-5.0),
            Case::new("5", t),
        ];
        let m = aggregate(&cases, now());
        assert_eq!(m.response_samples, 2);
        assert_eq!(m.team_avg_response_time, 16); // 15.5 rounds up
        assert!(m.has_response_data());

        let unmeasured = aggregate(&cases[2..], now());
        assert_eq!(unmeasured.team_avg_response_time, 0);
        assert!(!unmeasured.has_response_data());
    }

    #[test]
    fn test_overdue_only_counts_pending() {
        let old = now() - Duration::hours(30);
        let cases = vec![
            Case::new("1", old),
            Case::new("2", old).with_status("resolved"),
            Case::new("3", now()),
        ];
        assert_eq!(aggregate(&cases, now()).overdue, 1);
    }

    fn arb_case() -> impl Strategy<Value = Case> {
        let statuses = prop::option::of(prop::sample::select(vec![
            "new", "assigned", "in_progress", "pending_customer", "resolved",
            "closed", "escalated", " CLOSED", "Resolved ", "???", "",
        ]));
        let priorities = prop::option::of(prop::sample::select(vec![
            "vip", "urgent", "normal", "low", "VIP ", "high", "",
        ]));
        let minutes = prop::option::of(-100.0f64..600.0);
        (statuses, priorities, minutes, 0i64..200).prop_map(|(status, priority, minutes, age)| {
            let mut case = Case::new("p", now() - Duration::hours(age));
            case.status = status.map(String::from);
            case.priority = priority.map(String::from);
            case.response_time_minutes = minutes;
            case
        })
    }

    proptest! {
        #[test]
        fn prop_resolved_plus_pending_is_total(cases in prop::collection::vec(arb_case(), 0..60)) {
            let m = aggregate(&cases, now());
            prop_assert_eq!(m.total_resolved + m.total_pending, m.total_cases);
        }

        #[test]
        fn prop_breakdown_bounded_by_pending(cases in prop::collection::vec(arb_case(), 0..60)) {
            let m = aggregate(&cases, now());
            prop_assert!(m.pending_breakdown.known_total() <= m.total_pending);
            prop_assert_eq!(m.pending_breakdown.known_total() + m.pending_breakdown.unknown, m.total_pending);
        }

        #[test]
        fn prop_aggregate_is_idempotent(cases in prop::collection::vec(arb_case(), 0..60)) {
            prop_assert_eq!(aggregate(&cases, now()), aggregate(&cases, now()));
        }
    }
}
