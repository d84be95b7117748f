//! Agent performance
//!
//! Joins cases to agents by `agent_id` and derives per-agent counts and an
//! efficiency label. The label thresholds are a product contract.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::metrics::mean;
use crate::domain::aggregates::{Agent, Case};
use crate::domain::value_objects::{AgentStatus, CaseStatus, Efficiency};

/// Window in which a brand-new case counts as unattended
pub const UNATTENDED_WINDOW_HOURS: i64 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub agent_id: String,
    pub name: String,
    pub status: Option<AgentStatus>,
    pub total_cases: u64,
    pub resolved_today: u64,
    pub pending_cases: u64,
    pub unattended: u64,
    /// Rounded mean response minutes over all of the agent's cases
    pub avg_response_time: Option<u64>,
    pub resolution_rate: Option<f64>,
    pub capacity: u32,
    pub utilization: f64,
    pub efficiency: Option<Efficiency>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamPerformance {
    pub agents: Vec<AgentPerformance>,
    /// Pending cases not assigned to any known agent
    pub unassigned_pending: u64,
}

/// Efficiency label, first matching rule wins:
///
/// 1. offline agents get no label
/// 2. High Performer: `resolved_today >= 5`, `avg <= 60`, `pending <= 3`
/// 3. Good: `resolved_today >= 3` or (`avg <= 120` and `pending <= 5`),
///    unless the agent is overloaded (`pending > 8`)
/// 4. Needs Support: `pending > 8` or `avg > 180`
///
/// Thresholds apply to the exact mean, not the rounded display value. A
/// missing average never satisfies a threshold in either direction.
pub fn efficiency(status: Option<AgentStatus>, resolved_today: u64, avg_response: Option<f64>, pending: u64) -> Option<Efficiency> {
    if status == Some(AgentStatus::Offline) {
        return None;
    }
    let avg_at_most = |limit: f64| avg_response.map(|a| a <= limit).unwrap_or(false);
    let avg_above = |limit: f64| avg_response.map(|a| a > limit).unwrap_or(false);
    let overloaded = pending > 8;

    if resolved_today >= 5 && avg_at_most(60.0) && pending <= 3 {
        Some(Efficiency::HighPerformer)
    } else if !overloaded && (resolved_today >= 3 || (avg_at_most(120.0) && pending <= 5)) {
        Some(Efficiency::Good)
    } else if overloaded || avg_above(180.0) {
        Some(Efficiency::NeedsSupport)
    } else {
        None
    }
}

/// Performance for a single agent over the full case list
pub fn agent_performance(agent: &Agent, cases: &[Case], now: DateTime<Utc>) -> AgentPerformance {
    let today = now.date_naive();
    let fresh_since = now - Duration::hours(UNATTENDED_WINDOW_HOURS);

    let mut total = 0u64;
    let mut resolved_total = 0u64;
    let mut resolved_today = 0u64;
    let mut pending = 0u64;
    let mut unattended = 0u64;
    let mut response_sum = 0.0;
    let mut response_samples = 0u64;

    for case in cases.iter().filter(|c| c.is_assigned_to(&agent.id)) {
        total += 1;
        if case.is_resolved() {
            resolved_total += 1;
            if case.resolved_on_date() == Some(today) {
                resolved_today += 1;
            }
        } else {
            pending += 1;
        }
        if case.parsed_status() == Some(CaseStatus::New) && case.created_at.map_or(false, |at| at > fresh_since) {
            unattended += 1;
        }
        if let Some(m) = case.measured_response_minutes() {
            response_sum += m;
            response_samples += 1;
        }
    }

    let avg_response = mean(response_sum, response_samples);
    let capacity = agent.max_concurrent_cases.max(1);

    AgentPerformance {
        agent_id: agent.id.clone(),
        name: agent.name.clone(),
        status: agent.status,
        total_cases: total,
        resolved_today,
        pending_cases: pending,
        unattended,
        avg_response_time: avg_response.map(|a| a.round() as u64),
        resolution_rate: (total > 0).then(|| resolved_total as f64 / total as f64),
        capacity,
        utilization: pending as f64 / f64::from(capacity),
        efficiency: efficiency(agent.status, resolved_today, avg_response, pending),
    }
}

/// One record per agent, in the order the agents were given
pub fn team_performance(agents: &[Agent], cases: &[Case], now: DateTime<Utc>) -> TeamPerformance {
    let records = agents.iter().map(|a| agent_performance(a, cases, now)).collect();
    let unassigned_pending = cases
        .iter()
        .filter(|c| c.is_pending())
        .filter(|c| match c.agent_id.as_deref() {
            Some(id) => !agents.iter().any(|a| a.id == id),
            None => true,
        })
        .count() as u64;

    TeamPerformance { agents: records, unassigned_pending }
}
