//! SLA evaluation
//!
//! An evaluator is pinned to a single `now` so that every case in one
//! render pass is judged against the same instant.

use chrono::{DateTime, Duration, Utc};

use crate::domain::aggregates::Case;
use crate::domain::value_objects::sla_hours_for;

#[derive(Clone, Copy, Debug)]
pub struct SlaEvaluator {
    now: DateTime<Utc>,
}

impl SlaEvaluator {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Budget for the case's priority; unknown priorities get 24 hours
    pub fn budget(case: &Case) -> Duration {
        Duration::hours(sla_hours_for(case.priority.as_deref()))
    }

    /// Open longer than its priority allows. Resolved and closed cases are
    /// never overdue, whatever their age, and neither are undated ones.
    pub fn is_overdue(&self, case: &Case) -> bool {
        self.time_remaining(case).map(|left| left < Duration::zero()).unwrap_or(false)
    }

    /// Remaining budget for a pending case (negative once breached);
    /// `None` for resolved or undated cases.
    pub fn time_remaining(&self, case: &Case) -> Option<Duration> {
        if case.is_resolved() {
            return None;
        }
        let created_at = case.created_at?;
        Some(Self::budget(case) - (self.now - created_at))
    }

    pub fn count_overdue<'a>(&self, cases: impl IntoIterator<Item = &'a Case>) -> u64 {
        cases.into_iter().filter(|c| self.is_overdue(c)).count() as u64
    }
}
