//! Case aggregate
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use super::fields::{self, Record};
use crate::domain::value_objects::{is_resolved_status, CaseStatus, Priority};

/// A support case as read from the backend.
///
/// `status` and `priority` keep the raw strings so that malformed values can
/// be reported instead of being coerced into a known variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub case_number: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// `None` when the backend value was unreadable. Such a case still
    /// counts toward totals but has no age, so it never goes overdue and
    /// lands in no daily bucket.
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub response_time_minutes: Option<f64>,
    pub resolution_time_minutes: Option<f64>,
    pub agent_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum CaseDecodeError {
    #[error("case record without id")]
    MissingId,
}

impl Case {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let id = id.into();
        Self {
            case_number: id.clone(),
            id,
            status: Some(CaseStatus::New.as_str().into()),
            priority: Some(Priority::Normal.as_str().into()),
            created_at: Some(created_at),
            resolved_at: None,
            first_response_at: None,
            response_time_minutes: None,
            resolution_time_minutes: None,
            agent_id: None,
            metadata: HashMap::new(),
        }
    }

    /// Decode a backend record. Only `id` is required; every other field
    /// degrades to `None` when unreadable.
    pub fn from_record(record: &Record) -> Result<Self, CaseDecodeError> {
        let id = fields::string(record, "id").ok_or(CaseDecodeError::MissingId)?;
        let created_at = fields::timestamp(record, "created_at");
        if created_at.is_none() {
            tracing::warn!("Case {} has no readable created_at", id);
        }

        let metadata = match record.get("metadata") {
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => HashMap::new(),
        };

        Ok(Self {
            case_number: fields::string(record, "case_number").unwrap_or_else(|| id.clone()),
            status: fields::string(record, "status"),
            priority: fields::string(record, "priority"),
            created_at,
            resolved_at: fields::timestamp(record, "resolved_at"),
            first_response_at: fields::timestamp(record, "first_response_at"),
            response_time_minutes: fields::number(record, "response_time_minutes"),
            resolution_time_minutes: fields::number(record, "resolution_time_minutes"),
            agent_id: fields::string(record, "agent_id"),
            metadata,
            id,
        })
    }

    // Builder-style setters, mostly for fixtures and the demo seed
    pub fn with_number(mut self, number: impl Into<String>) -> Self { self.case_number = number.into(); self }
    pub fn with_status(mut self, status: impl Into<String>) -> Self { self.status = Some(status.into()); self }
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self { self.priority = Some(priority.into()); self }
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self { self.agent_id = Some(agent_id.into()); self }
    pub fn with_response_minutes(mut self, minutes: f64) -> Self { self.response_time_minutes = Some(minutes); self }
    pub fn with_resolution_minutes(mut self, minutes: f64) -> Self { self.resolution_time_minutes = Some(minutes); self }
    pub fn resolved_on(mut self, at: DateTime<Utc>) -> Self { self.resolved_at = Some(at); self }

    pub fn parsed_status(&self) -> Option<CaseStatus> {
        self.status.as_deref().and_then(CaseStatus::parse)
    }

    pub fn parsed_priority(&self) -> Option<Priority> {
        self.priority.as_deref().and_then(Priority::parse)
    }

    pub fn is_resolved(&self) -> bool {
        is_resolved_status(self.status.as_deref())
    }

    pub fn is_pending(&self) -> bool {
        !self.is_resolved()
    }

    pub fn is_assigned_to(&self, agent_id: &str) -> bool {
        self.agent_id.as_deref() == Some(agent_id)
    }

    /// Response time when it was actually measured
    pub fn measured_response_minutes(&self) -> Option<f64> {
        positive(self.response_time_minutes)
    }

    pub fn measured_resolution_minutes(&self) -> Option<f64> {
        positive(self.resolution_time_minutes)
    }

    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_at.map(|at| at.date_naive())
    }

    pub fn resolved_on_date(&self) -> Option<NaiveDate> {
        self.resolved_at.map(|at| at.date_naive())
    }

    /// Free-form subject stored by the ingestion process, if any
    pub fn subject(&self) -> Option<&str> {
        self.metadata.get("subject").and_then(Value::as_str)
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_decode_full_record() {
        let record = json!({
            "id": "c-1",
            "case_number": "CASE-1001",
            "status": "In_Progress",
            "priority": "VIP",
            "created_at": "2024-01-03T10:00:00Z",
            "response_time_minutes": "35",
            "resolution_time_minutes": null,
            "agent_id": 7,
            "metadata": { "subject": "Refund request" }
        });
        let case = Case::from_record(record.as_object().unwrap()).unwrap();

        assert_eq!(case.case_number, "CASE-1001");
        assert_eq!(case.parsed_status(), Some(CaseStatus::InProgress));
        assert_eq!(case.parsed_priority(), Some(Priority::Vip));
        assert_eq!(case.created_at, Some(Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap()));
        assert_eq!(case.measured_response_minutes(), Some(35.0));
        assert_eq!(case.measured_resolution_minutes(), None);
        assert!(case.is_assigned_to("7"));
        assert_eq!(case.subject(), Some("Refund request"));
    }

    #[test]
    fn test_decode_requires_only_id() {
        let no_id = json!({ "created_at": "2024-01-03T10:00:00Z" });
        assert_eq!(Case::from_record(no_id.as_object().unwrap()), Err(CaseDecodeError::MissingId));

        let bad_date = json!({ "id": "c-2", "created_at": "last week", "status": "closed" });
        let case = Case::from_record(bad_date.as_object().unwrap()).unwrap();
        assert_eq!(case.created_at, None);
        assert_eq!(case.created_on(), None);
        assert!(case.is_resolved());
    }

    #[test]
    fn test_non_positive_durations_are_unmeasured() {
        let now = Utc::now();
        assert_eq!(Case::new("a", now).with_response_minutes(0.0).measured_response_minutes(), None);
        assert_eq!(Case::new("a", now).with_response_minutes(-3.0).measured_response_minutes(), None);
        assert_eq!(Case::new("a", now).with_response_minutes(f64::NAN).measured_response_minutes(), None);
    }
}
