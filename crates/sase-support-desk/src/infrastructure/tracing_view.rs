//! Log-only view and chart sink
//!
//! Used by the headless binary: each rendered section becomes a structured
//! log line instead of markup.

use parking_lot::Mutex;
use std::collections::HashSet;

use crate::application::charts::ChartSpec;
use crate::application::dto::{RecentCaseRow, Section, TeamOverview};
use crate::domain::services::TeamPerformance;
use crate::error::Result;
use crate::ports::outbound::{ChartHandle, ChartSink, DashboardView};

#[derive(Debug, Default)]
pub struct TracingView;

impl DashboardView for TracingView {
    fn render_overview(&self, overview: &TeamOverview) -> Result<()> {
        let m = &overview.metrics;
        tracing::info!(
            total = m.total_cases,
            resolved = m.total_resolved,
            pending = m.total_pending,
            overdue = m.overdue,
            vip = m.pending_breakdown.vip,
            urgent = m.pending_breakdown.urgent,
            normal = m.pending_breakdown.normal,
            low = m.pending_breakdown.low,
            unknown = m.pending_breakdown.unknown,
            avg_response = m.team_avg_response_time,
            "Team overview"
        );
        Ok(())
    }

    fn render_agents(&self, team: &TeamPerformance) -> Result<()> {
        for agent in &team.agents {
            tracing::info!(
                agent = %agent.name,
                resolved_today = agent.resolved_today,
                pending = agent.pending_cases,
                unattended = agent.unattended,
                avg_response = ?agent.avg_response_time,
                efficiency = agent.efficiency.map(|e| e.label()).unwrap_or("-"),
                "Agent performance"
            );
        }
        tracing::info!(unassigned = team.unassigned_pending, "Unassigned pending cases");
        Ok(())
    }

    fn render_recent_cases(&self, rows: &[RecentCaseRow]) -> Result<()> {
        for row in rows {
            tracing::info!(
                case = %row.case_number,
                status = ?row.status,
                priority = ?row.priority,
                agent = row.agent_name.as_deref().unwrap_or("unassigned"),
                overdue = row.overdue,
                "Recent case"
            );
        }
        Ok(())
    }

    fn render_section_error(&self, section: Section, message: &str) {
        tracing::error!(section = %section, "{}", message);
    }
}

/// Chart sink that logs series and tracks live handles
#[derive(Debug, Default)]
pub struct TracingChartSink {
    live: Mutex<HashSet<ChartHandle>>,
}

impl TracingChartSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_charts(&self) -> usize {
        self.live.lock().len()
    }
}

impl ChartSink for TracingChartSink {
    fn plot(&self, spec: &ChartSpec) -> Result<ChartHandle> {
        let handle = ChartHandle::new();
        tracing::debug!(kind = ?spec.kind, points = spec.labels.len(), series = spec.series.len(), "Plotting chart");
        self.live.lock().insert(handle);
        Ok(handle)
    }

    fn destroy(&self, handle: ChartHandle) {
        if !self.live.lock().remove(&handle) {
            tracing::warn!("Destroying unknown chart handle {:?}", handle);
        }
    }
}
