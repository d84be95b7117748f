//! Agent entity
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::fields::{self, Record};
use crate::domain::value_objects::AgentStatus;

pub const DEFAULT_MAX_CONCURRENT_CASES: u32 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    /// `None` when the backend reports a presence value we do not know
    pub status: Option<AgentStatus>,
    pub handles_vip: bool,
    pub handles_escalations: bool,
    pub max_concurrent_cases: u32,
    pub expertise: BTreeSet<String>,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: Some(AgentStatus::Available),
            handles_vip: false,
            handles_escalations: false,
            max_concurrent_cases: DEFAULT_MAX_CONCURRENT_CASES,
            expertise: BTreeSet::new(),
        }
    }

    /// Decode a backend record; `None` when it carries no id.
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = fields::string(record, "id")?;
        let max_concurrent_cases = fields::number(record, "max_concurrent_cases")
            .filter(|n| *n >= 1.0)
            .map(|n| n as u32)
            .unwrap_or(DEFAULT_MAX_CONCURRENT_CASES);

        Some(Self {
            name: fields::string(record, "name").unwrap_or_else(|| id.clone()),
            status: fields::string(record, "status").as_deref().and_then(AgentStatus::parse),
            handles_vip: fields::boolean(record, "handles_vip").unwrap_or(false),
            handles_escalations: fields::boolean(record, "handles_escalations").unwrap_or(false),
            max_concurrent_cases,
            expertise: fields::string_list(record, "expertise").into_iter().collect(),
            id,
        })
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self { self.status = Some(status); self }
    pub fn with_capacity(mut self, max: u32) -> Self { self.max_concurrent_cases = max; self }

    pub fn is_offline(&self) -> bool {
        self.status == Some(AgentStatus::Offline)
    }
}
