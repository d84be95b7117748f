//! Daily time-series buckets
//!
//! One bucket per UTC calendar day. The same code backs the 7-day and the
//! 30-day charts; only the window differs.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::metrics::mean;
use crate::domain::aggregates::Case;

const LABEL_FORMAT: &str = "%b %d";

/// Contiguous run of `days` calendar days starting at `start`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketWindow {
    pub start: NaiveDate,
    pub days: u32,
}

impl BucketWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    /// Trailing window whose last bucket is `today`. `None` when the start
    /// would fall before the earliest representable date.
    pub fn ending_on(today: NaiveDate, days: u32) -> Option<Self> {
        let back = i64::from(days.saturating_sub(1));
        let start = today.checked_sub_signed(Duration::days(back))?;
        Some(Self { start, days })
    }

    /// Exclusive end date, `None` past the calendar range
    pub fn end(&self) -> Option<NaiveDate> {
        self.start.checked_add_signed(Duration::days(i64::from(self.days)))
    }

    /// Bucket position for a date, if it falls inside the window
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        (offset >= 0 && offset < i64::from(self.days)).then_some(offset as usize)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).map_while(move |i| self.start.checked_add_signed(Duration::days(i64::from(i))))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub label: String,
    pub created: u64,
    pub resolved: u64,
    /// Mean response minutes of cases created that day; `None` when no case
    /// had a measured response, so charts can leave a gap
    pub avg_response_minutes: Option<f64>,
    pub response_samples: u64,
    pub avg_resolution_minutes: Option<f64>,
    pub resolution_samples: u64,
}

#[derive(Default)]
struct Accumulator {
    created: u64,
    resolved: u64,
    response_sum: f64,
    response_samples: u64,
    resolution_sum: f64,
    resolution_samples: u64,
}

/// Build exactly `window.days` buckets. Cases whose timestamps fall outside
/// the window are ignored. A window running past the calendar range yields
/// no buckets.
pub fn daily_buckets(window: BucketWindow, cases: &[Case]) -> Vec<DayBucket> {
    if window.end().is_none() {
        tracing::warn!(start = %window.start, days = window.days, "Bucket window exceeds the calendar range");
        return Vec::new();
    }
    let mut acc: Vec<Accumulator> = (0..window.days).map(|_| Accumulator::default()).collect();

    for case in cases {
        if let Some(i) = case.created_on().and_then(|d| window.index_of(d)) {
            let slot = &mut acc[i];
            slot.created += 1;
            if let Some(m) = case.measured_response_minutes() {
                slot.response_sum += m;
                slot.response_samples += 1;
            }
            if let Some(m) = case.measured_resolution_minutes() {
                slot.resolution_sum += m;
                slot.resolution_samples += 1;
            }
        }
        if let Some(i) = case.resolved_on_date().and_then(|d| window.index_of(d)) {
            acc[i].resolved += 1;
        }
    }

    window
        .dates()
        .zip(acc)
        .map(|(date, a)| DayBucket {
            date,
            label: date.format(LABEL_FORMAT).to_string(),
            created: a.created,
            resolved: a.resolved,
            avg_response_minutes: mean(a.response_sum, a.response_samples),
            response_samples: a.response_samples,
            avg_resolution_minutes: mean(a.resolution_sum, a.resolution_samples),
            resolution_samples: a.resolution_samples,
        })
        .collect()
}
