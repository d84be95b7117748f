//! Domain services
//!
//! Pure derivations over already-fetched records. None of them perform I/O
//! or read the clock; callers pass a single `now` per pass.

pub mod metrics;
pub mod sla;
pub mod buckets;
pub mod performance;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use buckets::{daily_buckets, BucketWindow, DayBucket};
pub use metrics::{aggregate, CaseMetrics, PriorityBreakdown};
pub use performance::{agent_performance, efficiency, team_performance, AgentPerformance, TeamPerformance};
pub use sla::SlaEvaluator;

use crate::domain::aggregates::{Agent, Case};

/// Everything one refresh derives from the raw records. Recomputed from
/// scratch every time, never patched in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub computed_at: DateTime<Utc>,
    pub summary: CaseMetrics,
    pub team: TeamPerformance,
    pub daily: Vec<DayBucket>,
}

impl DerivedMetrics {
    pub fn derive(cases: &[Case], agents: &[Agent], window: BucketWindow, now: DateTime<Utc>) -> Self {
        Self {
            computed_at: now,
            summary: aggregate(cases, now),
            team: team_performance(agents, cases, now),
            daily: daily_buckets(window, cases),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_derive_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2024, 1, 7, 18, 0, 0).unwrap();
        let agents = vec![Agent::new("a1", "Robin")];
        let cases = vec![
            Case::new("1", now - Duration::hours(3)).with_agent("a1").with_priority("vip"),
            Case::new("2", now - Duration::days(2)).with_agent("a1").with_status("resolved")
                .resolved_on(now - Duration::hours(2)).with_response_minutes(12.0),
        ];
        let window = BucketWindow::ending_on(now.date_naive(), 7).unwrap();

        let first = DerivedMetrics::derive(&cases, &agents, window, now);
        let second = DerivedMetrics::derive(&cases, &agents, window, now);
        assert_eq!(first, second);
        assert_eq!(first.summary.total_cases, 2);
        assert_eq!(first.team.agents[0].resolved_today, 1);
        assert_eq!(first.daily.len(), 7);
        assert_eq!(first.daily[6].resolved, 1);
        assert_eq!(first.daily[6].created, 1);
    }
}
