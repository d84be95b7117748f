//! Email thread entries attached to a case
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::{self, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction { Inbound, Outbound }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmailThread {
    pub id: String,
    pub case_id: String,
    pub direction: Direction,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl EmailThread {
    pub fn from_record(record: &Record) -> Option<Self> {
        let direction = match fields::string(record, "direction").map(|d| d.trim().to_ascii_lowercase()).as_deref() {
            Some("outbound") => Direction::Outbound,
            _ => Direction::Inbound,
        };
        Some(Self {
            id: fields::string(record, "id")?,
            case_id: fields::string(record, "case_id")?,
            direction,
            sender: fields::string(record, "sender"),
            subject: fields::string(record, "subject"),
            sent_at: fields::timestamp(record, "sent_at"),
        })
    }
}
