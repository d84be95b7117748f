//! Change notifications from the backend
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend collections the dashboard reads
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection { Cases, Agents, EmailThreads }

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cases => "cases",
            Self::Agents => "agents",
            Self::EmailThreads => "email_threads",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind { Insert, Update }

/// A row was inserted or updated. Delivery is at-least-once, so consumers
/// must treat repeats as harmless.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub record_id: String,
}
