//! Command handlers
//!
//! Status actions issue update intents to the data source. Stamping of
//! auxiliary timestamps travels with the same update so the backend applies
//! it atomically.

use std::sync::Arc;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::application::dto::CaseDetail;
use crate::domain::aggregates::{Agent, Case, EmailThread};
use crate::domain::services::SlaEvaluator;
use crate::domain::value_objects::CaseStatus;
use crate::domain::Collection;
use crate::error::{DashboardError, Result};
use crate::ports::inbound::CaseActions;
use crate::ports::outbound::{Clock, DataSource, Filter, Query};

/// Case action application service
pub struct CaseActionService {
    source: Arc<dyn DataSource>,
    clock: Arc<dyn Clock>,
}

impl CaseActionService {
    pub fn new(source: Arc<dyn DataSource>, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    async fn load_case(&self, case_id: &str) -> Result<Case> {
        let record = self.source.get_one(Collection::Cases, case_id).await?
            .ok_or_else(|| DashboardError::CaseNotFound(case_id.into()))?;
        Case::from_record(&record).map_err(|e| {
            tracing::warn!("Case {} unreadable: {}", case_id, e);
            DashboardError::CaseNotFound(case_id.into())
        })
    }
}

/// Fields written for a transition, given the current case
pub fn transition_fields(case: &Case, target: CaseStatus, now: chrono::DateTime<chrono::Utc>) -> Result<Map<String, Value>> {
    let stamp = Value::String(now.to_rfc3339());
    let mut fields = Map::new();
    match target {
        CaseStatus::InProgress => {
            if case.first_response_at.is_none() {
                fields.insert("first_response_at".into(), stamp.clone());
            }
        }
        CaseStatus::Resolved | CaseStatus::Closed => {
            fields.insert("resolved_at".into(), stamp.clone());
        }
        CaseStatus::Escalated => {}
        other => return Err(DashboardError::InvalidTransition(other.as_str().into())),
    }
    fields.insert("status".into(), Value::String(target.as_str().into()));
    fields.insert("updated_at".into(), stamp);
    Ok(fields)
}

#[async_trait]
impl CaseActions for CaseActionService {
    async fn transition(&self, case_id: &str, target: CaseStatus) -> Result<()> {
        let case = self.load_case(case_id).await?;
        let fields = transition_fields(&case, target, self.clock.now())?;

        self.source.update(Collection::Cases, case_id, fields).await?;
        tracing::info!("Case {} moved to {}", case.case_number, target);
        Ok(())
    }

    async fn case_detail(&self, case_id: &str) -> Result<CaseDetail> {
        let case = self.load_case(case_id).await?;

        let thread_query = Query::new()
            .filter(Filter::Eq("case_id".into(), Value::String(case.id.clone())))
            .order_by("sent_at", false);
        let threads = self.source.list(Collection::EmailThreads, &thread_query).await?
            .iter()
            .filter_map(EmailThread::from_record)
            .collect();

        let agent = match case.agent_id.as_deref() {
            Some(agent_id) => self.source.get_one(Collection::Agents, agent_id).await?
                .as_ref()
                .and_then(Agent::from_record),
            None => None,
        };

        let sla = SlaEvaluator::at(self.clock.now());
        Ok(CaseDetail {
            overdue: sla.is_overdue(&case),
            sla_remaining_minutes: sla.time_remaining(&case).map(|d| d.num_minutes()),
            case,
            agent,
            threads,
        })
    }
}
