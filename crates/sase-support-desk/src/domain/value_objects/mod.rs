//! Support desk value objects
//!
//! Status and priority values arrive as free-form strings from the backend.
//! Parsing is trimmed and case-insensitive and never fails loudly: anything
//! unrecognised comes back as `None` and callers decide how to bucket it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Case lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    New,
    Assigned,
    InProgress,
    PendingCustomer,
    Resolved,
    Closed,
    Escalated,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 7] = [
        CaseStatus::New,
        CaseStatus::Assigned,
        CaseStatus::InProgress,
        CaseStatus::PendingCustomer,
        CaseStatus::Resolved,
        CaseStatus::Closed,
        CaseStatus::Escalated,
    ];

    /// Parse a raw status string
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == normalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PendingCustomer => "pending_customer",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Escalated => "escalated",
        }
    }

    /// Member of the resolved-set {resolved, closed}
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when a raw status string names a resolved-set status.
/// Missing or unrecognised statuses count as pending.
pub fn is_resolved_status(raw: Option<&str>) -> bool {
    raw.and_then(CaseStatus::parse)
        .map(|s| s.is_resolved())
        .unwrap_or(false)
}

/// Case priority with its SLA budget
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Vip,
    Urgent,
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Vip, Priority::Urgent, Priority::Normal, Priority::Low];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vip" => Some(Self::Vip),
            "urgent" => Some(Self::Urgent),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vip => "vip",
            Self::Urgent => "urgent",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }

    /// Maximum hours a case may stay open before it is overdue
    pub fn sla_hours(&self) -> i64 {
        match self {
            Self::Vip => 4,
            Self::Urgent => 8,
            Self::Normal => 24,
            Self::Low => 48,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SLA budget for a raw priority; unrecognised priorities get the normal tier.
pub fn sla_hours_for(raw: Option<&str>) -> i64 {
    raw.and_then(Priority::parse)
        .unwrap_or(Priority::Normal)
        .sla_hours()
}

/// Agent presence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Available,
    Busy,
    Break,
    Offline,
}

impl AgentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "available" => Some(Self::Available),
            "busy" => Some(Self::Busy),
            "break" => Some(Self::Break),
            "offline" => Some(Self::Offline),
            _ => None,
        }
    }
}

/// Qualitative agent efficiency label
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Efficiency {
    HighPerformer,
    Good,
    NeedsSupport,
}

impl Efficiency {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighPerformer => "High Performer",
            Self::Good => "Good",
            Self::NeedsSupport => "Needs Support",
        }
    }
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
