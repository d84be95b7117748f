//! Data transfer objects handed to the view layer.
//!
//! Plain data only: no colors, no markup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::aggregates::{Agent, Case, EmailThread};
use crate::domain::services::{CaseMetrics, SlaEvaluator};
use crate::domain::value_objects::{CaseStatus, Priority};

/// Independently refreshed dashboard sections
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Overview,
    Agents,
    RecentCases,
    Charts,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Overview, Section::Agents, Section::RecentCases, Section::Charts];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Overview => "team overview",
            Self::Agents => "agents",
            Self::RecentCases => "recent cases",
            Self::Charts => "charts",
        }
    }

    pub fn error_message(&self) -> String {
        format!("Error loading {}", self.title())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamOverview {
    pub computed_at: DateTime<Utc>,
    pub metrics: CaseMetrics,
    /// Records dropped because they could not be decoded
    pub skipped_records: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecentCaseRow {
    pub case_id: String,
    pub case_number: String,
    pub subject: Option<String>,
    pub status: Option<CaseStatus>,
    pub priority: Option<Priority>,
    pub agent_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub overdue: bool,
    /// Minutes of SLA budget left; negative once breached
    pub sla_remaining_minutes: Option<i64>,
}

impl RecentCaseRow {
    pub fn build(case: &Case, agents: &[Agent], sla: &SlaEvaluator) -> Self {
        let agent_name = case
            .agent_id
            .as_deref()
            .and_then(|id| agents.iter().find(|a| a.id == id))
            .map(|a| a.name.clone());

        Self {
            case_id: case.id.clone(),
            case_number: case.case_number.clone(),
            subject: case.subject().map(String::from),
            status: case.parsed_status(),
            priority: case.parsed_priority(),
            agent_name,
            created_at: case.created_at,
            overdue: sla.is_overdue(case),
            sla_remaining_minutes: sla.time_remaining(case).map(|d| d.num_minutes()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseDetail {
    pub case: Case,
    pub agent: Option<Agent>,
    pub threads: Vec<EmailThread>,
    pub overdue: bool,
    pub sla_remaining_minutes: Option<i64>,
}
