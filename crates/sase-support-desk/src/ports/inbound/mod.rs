//! Inbound ports (use case traits)

use async_trait::async_trait;

use crate::application::dto::CaseDetail;
use crate::domain::value_objects::CaseStatus;
use crate::error::Result;

/// Status actions the UI may request on a case
#[async_trait]
pub trait CaseActions: Send + Sync {
    /// Move a case to `target`. Only in_progress, resolved, escalated and
    /// closed are accepted.
    async fn transition(&self, case_id: &str, target: CaseStatus) -> Result<()>;

    /// Case with its email thread and SLA state
    async fn case_detail(&self, case_id: &str) -> Result<CaseDetail>;
}
