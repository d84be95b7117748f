//! View refresh coordination
//!
//! Sequences fetch → derive → render for every dashboard section. At most
//! one refresh runs at a time; a request that arrives while one is in flight
//! is dropped, not queued. Sections run concurrently and fail independently.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::application::charts::{self, ChartKind, ChartSpec};
use crate::application::dto::{RecentCaseRow, Section, TeamOverview};
use crate::config::DashboardConfig;
use crate::domain::aggregates::{decode_agents, decode_cases, Agent, Case};
use crate::domain::services::{aggregate, daily_buckets, team_performance, BucketWindow, DerivedMetrics, SlaEvaluator};
use crate::domain::{ChangeEvent, ChangeKind, Collection};
use crate::error::{DashboardError, Result};
use crate::ports::outbound::{ChartHandle, ChartSink, Clock, DashboardView, DataSource, Query};

const WATCHED_CHANGES: [ChangeKind; 2] = [ChangeKind::Insert, ChangeKind::Update];

/// Why a refresh was requested
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RefreshTrigger {
    Timer,
    VisibilityRegained,
    FocusRegained,
    Change(ChangeEvent),
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub section: Section,
    /// `Err` carries the underlying failure, already shown to the user
    pub result: std::result::Result<(), String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RefreshReport {
    pub trigger: RefreshTrigger,
    pub now: DateTime<Utc>,
    pub sections: Vec<SectionReport>,
}

impl RefreshReport {
    pub fn failed(&self) -> Vec<Section> {
        self.sections.iter().filter(|s| s.result.is_err()).map(|s| s.section).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    /// Another refresh was already in flight
    Skipped,
}

/// Puts the coordinator back to Idle however the refresh ends
struct IdleGuard<'a>(&'a Mutex<RefreshState>);

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock() = RefreshState::Idle;
    }
}

/// Owns the collaborators and the chart handle registry for one dashboard
pub struct RefreshCoordinator {
    source: Arc<dyn DataSource>,
    view: Arc<dyn DashboardView>,
    charts: Arc<dyn ChartSink>,
    clock: Arc<dyn Clock>,
    config: DashboardConfig,
    state: Mutex<RefreshState>,
    registry: Mutex<HashMap<ChartKind, ChartHandle>>,
    completed: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        source: Arc<dyn DataSource>,
        view: Arc<dyn DashboardView>,
        charts: Arc<dyn ChartSink>,
        clock: Arc<dyn Clock>,
        config: DashboardConfig,
    ) -> Self {
        Self {
            source,
            view,
            charts,
            clock,
            config,
            state: Mutex::new(RefreshState::Idle),
            registry: Mutex::new(HashMap::new()),
            completed: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> RefreshState {
        *self.state.lock()
    }

    /// Number of refresh cycles that ran to completion
    pub fn completed_cycles(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn live_charts(&self) -> usize {
        self.registry.lock().len()
    }

    /// Trigger channel for UI events (visibility, focus, manual refresh)
    pub fn trigger_channel(&self) -> (mpsc::Sender<RefreshTrigger>, mpsc::Receiver<RefreshTrigger>) {
        mpsc::channel(self.config.trigger_buffer)
    }

    /// Run one refresh unless one is already running
    pub async fn request_refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        {
            let mut state = self.state.lock();
            if *state == RefreshState::Refreshing {
                tracing::debug!("Refresh already in flight, dropping {:?}", trigger);
                return RefreshOutcome::Skipped;
            }
            *state = RefreshState::Refreshing;
        }
        let idle = IdleGuard(&self.state);

        let started = Instant::now();
        let now = self.clock.now();
        let (overview, agents, recent, charts) = tokio::join!(
            self.run_section(Section::Overview, self.refresh_overview(now)),
            self.run_section(Section::Agents, self.refresh_agents(now)),
            self.run_section(Section::RecentCases, self.refresh_recent_cases(now)),
            self.run_section(Section::Charts, self.refresh_charts(now)),
        );

        let report = RefreshReport { trigger, now, sections: vec![overview, agents, recent, charts] };
        drop(idle);
        self.completed.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            trigger = ?report.trigger,
            failed = report.failed().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dashboard refreshed"
        );
        RefreshOutcome::Completed(report)
    }

    async fn run_section<F>(&self, section: Section, work: F) -> SectionReport
    where
        F: Future<Output = Result<()>>,
    {
        let result = work.await.map_err(|e| {
            tracing::error!(section = %section, "Section refresh failed: {}", e);
            self.view.render_section_error(section, &section.error_message());
            e.to_string()
        });
        SectionReport { section, result }
    }

    async fn fetch_cases(&self, query: &Query) -> Result<Vec<Case>> {
        let records = self.source.list(Collection::Cases, query).await?;
        Ok(decode_cases(&records).0)
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>> {
        let records = self.source.list(Collection::Agents, &Query::new().order_by("name", false)).await?;
        Ok(decode_agents(&records).0)
    }

    /// Agents for name lookups only; a failure degrades to no names
    async fn agents_or_empty(&self, section: Section) -> Vec<Agent> {
        self.fetch_agents().await.unwrap_or_else(|e| {
            tracing::warn!(section = %section, "Rendering without agent data: {}", e);
            Vec::new()
        })
    }

    async fn refresh_overview(&self, now: DateTime<Utc>) -> Result<()> {
        let records = self.source.list(Collection::Cases, &Query::new()).await?;
        let (cases, skipped_records) = decode_cases(&records);
        let overview = TeamOverview {
            computed_at: now,
            metrics: aggregate(&cases, now),
            skipped_records,
        };
        self.view.render_overview(&overview)
    }

    async fn refresh_agents(&self, now: DateTime<Utc>) -> Result<()> {
        let agents = self.fetch_agents().await?;
        let cases = self.fetch_cases(&Query::new()).await?;
        self.view.render_agents(&team_performance(&agents, &cases, now))
    }

    async fn refresh_recent_cases(&self, now: DateTime<Utc>) -> Result<()> {
        let query = Query::new()
            .order_by("created_at", true)
            .limit(self.config.recent_cases_limit);
        let cases = self.fetch_cases(&query).await?;
        let agents = self.agents_or_empty(Section::RecentCases).await;

        let sla = SlaEvaluator::at(now);
        let rows: Vec<RecentCaseRow> = cases.iter().map(|c| RecentCaseRow::build(c, &agents, &sla)).collect();
        self.view.render_recent_cases(&rows)
    }

    async fn refresh_charts(&self, now: DateTime<Utc>) -> Result<()> {
        let cases = self.fetch_cases(&Query::new()).await?;
        let agents = self.agents_or_empty(Section::Charts).await;

        let today = now.date_naive();
        let window = |days: u32| {
            BucketWindow::ending_on(today, days)
                .ok_or_else(|| DashboardError::Config(format!("{} day chart window is out of range", days)))
        };
        let short = window(self.config.short_range_days)?;
        let long = window(self.config.long_range_days)?;

        let derived = DerivedMetrics::derive(&cases, &agents, long, now);
        let specs = [
            charts::case_volume(&daily_buckets(short, &cases)),
            charts::response_trend(&derived.daily),
            charts::pending_by_priority(&derived.summary.pending_breakdown),
            charts::agent_workload(&derived.team),
        ];
        for spec in &specs {
            self.redraw(spec).await?;
        }
        Ok(())
    }

    /// Replace the chart of this kind. The old handle is destroyed first and
    /// the sink gets a short pause before the new one is created.
    async fn redraw(&self, spec: &ChartSpec) -> Result<()> {
        let previous = self.registry.lock().remove(&spec.kind);
        if let Some(handle) = previous {
            self.charts.destroy(handle);
            tokio::time::sleep(self.config.chart_rebuild_delay()).await;
        }
        let handle = self.charts.plot(spec)?;
        self.registry.lock().insert(spec.kind, handle);
        Ok(())
    }

    /// Release every chart handle
    pub fn teardown(&self) {
        let handles: Vec<ChartHandle> = self.registry.lock().drain().map(|(_, h)| h).collect();
        for handle in handles {
            self.charts.destroy(handle);
        }
        tracing::info!("Dashboard torn down");
    }

    /// Event loop: timer ticks, UI triggers and backend change feeds each
    /// request a refresh. Returns after the trigger channel closes and the
    /// in-flight refreshes have finished, leaving the dashboard torn down.
    pub async fn run(self: Arc<Self>, mut triggers: mpsc::Receiver<RefreshTrigger>) -> Result<()> {
        let mut case_changes = self.source.subscribe(Collection::Cases, &WATCHED_CHANGES).await?;
        let mut agent_changes = self.source.subscribe(Collection::Agents, &WATCHED_CHANGES).await?;
        let mut ticker = tokio::time::interval(self.config.refresh_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: JoinSet<RefreshOutcome> = JoinSet::new();

        tracing::info!(interval_secs = self.config.refresh_interval_secs, "Refresh loop started");
        loop {
            let trigger = tokio::select! {
                _ = ticker.tick() => Some(RefreshTrigger::Timer),
                received = triggers.recv() => match received {
                    Some(trigger) => Some(trigger),
                    None => break,
                },
                Some(event) = case_changes.next() => Some(RefreshTrigger::Change(event)),
                Some(event) = agent_changes.next() => Some(RefreshTrigger::Change(event)),
                Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = finished {
                        tracing::error!("Refresh task failed: {}", e);
                    }
                    None
                }
            };

            if let Some(trigger) = trigger {
                let coordinator = Arc::clone(&self);
                in_flight.spawn(async move { coordinator.request_refresh(trigger).await });
            }
        }

        while let Some(finished) = in_flight.join_next().await {
            if let Err(e) = finished {
                tracing::error!("Refresh task failed: {}", e);
            }
        }
        self.teardown();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Record;
    use crate::domain::services::TeamPerformance;
    use crate::infrastructure::{FixedClock, InMemoryDataSource};
    use crate::ports::outbound::{ChangeSubscription, DataSourceError};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use serde_json::{json, Map, Value};
    use std::collections::HashSet;
    use std::time::Duration as StdDuration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    /// Wraps the in-memory source with call counting, latency and failures
    struct FlakySource {
        inner: InMemoryDataSource,
        latency: StdDuration,
        failing: Mutex<HashSet<Collection>>,
        case_lists: AtomicU64,
    }

    impl FlakySource {
        fn new(latency: StdDuration) -> Self {
            Self {
                inner: InMemoryDataSource::new(),
                latency,
                failing: Mutex::new(HashSet::new()),
                case_lists: AtomicU64::new(0),
            }
        }

        fn fail(&self, collection: Collection) {
            self.failing.lock().insert(collection);
        }

        fn heal(&self) {
            self.failing.lock().clear();
        }

        fn case_lists(&self) -> u64 {
            self.case_lists.load(Ordering::SeqCst)
        }
    }


    #[async_trait]
    impl DataSource for FlakySource {
        async fn list(&self, collection: Collection, query: &Query) -> std::result::Result<Vec<Record>, DataSourceError> {
            if collection == Collection::Cases {
                self.case_lists.fetch_add(1, Ordering::SeqCst);
            }
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.failing.lock().contains(&collection) {
                return Err(DataSourceError::Connection("backend unreachable".into()));
            }
            self.inner.list(collection, query).await
        }

        async fn get_one(&self, collection: Collection, id: &str) -> std::result::Result<Option<Record>, DataSourceError> {
            self.inner.get_one(collection, id).await
        }

        async fn update(&self, collection: Collection, id: &str, fields: Map<String, Value>) -> std::result::Result<(), DataSourceError> {
            self.inner.update(collection, id, fields).await
        }

        async fn subscribe(&self, collection: Collection, kinds: &[ChangeKind]) -> std::result::Result<ChangeSubscription, DataSourceError> {
            self.inner.subscribe(collection, kinds).await
        }
    }

    #[derive(Default)]
    struct RecordingView {
        events: Mutex<Vec<String>>,
        missing_agents_target: bool,
    }

    impl RecordingView {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl DashboardView for RecordingView {
        fn render_overview(&self, overview: &TeamOverview) -> Result<()> {
            self.events.lock().push(format!("overview:{}", overview.metrics.total_cases));
            Ok(())
        }

        fn render_agents(&self, team: &TeamPerformance) -> Result<()> {
            if self.missing_agents_target {
                return Err(DashboardError::RenderTargetMissing("agents".into()));
            }
            self.events.lock().push(format!("agents:{}", team.agents.len()));
            Ok(())
        }

        fn render_recent_cases(&self, rows: &[RecentCaseRow]) -> Result<()> {
            let names: Vec<&str> = rows.iter().map(|r| r.agent_name.as_deref().unwrap_or("-")).collect();
            self.events.lock().push(format!("recent:{}", names.join(",")));
            Ok(())
        }

        fn render_section_error(&self, _section: Section, message: &str) {
            self.events.lock().push(message.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingCharts {
        log: Mutex<Vec<String>>,
        live: Mutex<HashSet<ChartHandle>>,
    }

    impl ChartSink for RecordingCharts {
        fn plot(&self, spec: &ChartSpec) -> Result<ChartHandle> {
            let handle = ChartHandle::new();
            self.log.lock().push(format!("plot:{:?}", spec.kind));
            self.live.lock().insert(handle);
            Ok(handle)
        }

        fn destroy(&self, handle: ChartHandle) {
            self.log.lock().push("destroy".into());
            self.live.lock().remove(&handle);
        }
    }

    struct Harness {
        source: Arc<FlakySource>,
        view: Arc<RecordingView>,
        charts: Arc<RecordingCharts>,
        coordinator: Arc<RefreshCoordinator>,
    }

    async fn harness(latency: StdDuration, view: RecordingView) -> Harness {
        let source = Arc::new(FlakySource::new(latency));
        source.inner.insert(Collection::Agents, json!({ "id": "a1", "name": "Robin", "status": "available" })).await;
        source.inner.insert(Collection::Cases, json!({
            "id": "c1", "case_number": "CASE-1", "status": "new", "priority": "vip",
            "created_at": (now() - Duration::hours(1)).to_rfc3339(), "agent_id": "a1"
        })).await;
        source.inner.insert(Collection::Cases, json!({
            "id": "c2", "case_number": "CASE-2", "status": "resolved", "priority": "low",
            "created_at": (now() - Duration::days(1)).to_rfc3339(),
            "resolved_at": (now() - Duration::hours(2)).to_rfc3339(), "response_time_minutes": 30
        })).await;

        let view = Arc::new(view);
        let charts = Arc::new(RecordingCharts::default());
        let config = DashboardConfig { chart_rebuild_delay_ms: 0, ..Default::default() };
        let coordinator = Arc::new(RefreshCoordinator::new(
            source.clone(),
            view.clone(),
            charts.clone(),
            Arc::new(FixedClock::new(now())),
            config,
        ));
        Harness { source, view, charts, coordinator }
    }

    fn completed(outcome: RefreshOutcome) -> RefreshReport {
        match outcome {
            RefreshOutcome::Completed(report) => report,
            RefreshOutcome::Skipped => panic!("refresh was skipped"),
        }
    }

    #[tokio::test]
    async fn test_full_refresh_renders_every_section() {
        let h = harness(StdDuration::ZERO, RecordingView::default()).await;
        let report = completed(h.coordinator.request_refresh(RefreshTrigger::Manual).await);

        assert!(report.failed().is_empty());
        assert_eq!(report.now, now());
        let events = h.view.events();
        assert!(events.contains(&"overview:2".to_string()));
        assert!(events.contains(&"agents:1".to_string()));
        assert!(events.contains(&"recent:Robin,-".to_string()));
        assert_eq!(h.coordinator.live_charts(), 4);
        assert_eq!(h.coordinator.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_concurrent_request_is_dropped() {
        let h = harness(StdDuration::from_millis(20), RecordingView::default()).await;
        let (first, second) = tokio::join!(
            h.coordinator.request_refresh(RefreshTrigger::Timer),
            h.coordinator.request_refresh(RefreshTrigger::FocusRegained),
        );

        assert!(matches!(first, RefreshOutcome::Completed(_)));
        assert_eq!(second, RefreshOutcome::Skipped);
        assert_eq!(h.coordinator.completed_cycles(), 1);
        // overview, agents, recent cases and charts each list cases once
        assert_eq!(h.source.case_lists(), 4);
    }

    #[tokio::test]
    async fn test_failing_section_does_not_stop_others() {
        let h = harness(StdDuration::ZERO, RecordingView::default()).await;
        h.source.fail(Collection::Agents);

        let report = completed(h.coordinator.request_refresh(RefreshTrigger::VisibilityRegained).await);
        assert_eq!(report.failed(), vec![Section::Agents]);

        let events = h.view.events();
        assert!(events.contains(&"Error loading agents".to_string()));
        assert!(events.contains(&"overview:2".to_string()));
        assert!(events.contains(&"recent:-,-".to_string()));
        assert_eq!(h.coordinator.live_charts(), 4);
    }

    #[tokio::test]
    async fn test_back_to_idle_after_total_failure() {
        let h = harness(StdDuration::ZERO, RecordingView::default()).await;
        h.source.fail(Collection::Cases);

        let report = completed(h.coordinator.request_refresh(RefreshTrigger::Timer).await);
        assert_eq!(report.failed().len(), 4);
        assert_eq!(h.coordinator.state(), RefreshState::Idle);

        h.source.heal();
        let report = completed(h.coordinator.request_refresh(RefreshTrigger::Timer).await);
        assert!(report.failed().is_empty());
        assert_eq!(h.coordinator.completed_cycles(), 2);
    }

    #[tokio::test]
    async fn test_missing_render_target_is_scoped() {
        let view = RecordingView { missing_agents_target: true, ..Default::default() };
        let h = harness(StdDuration::ZERO, view).await;

        let report = completed(h.coordinator.request_refresh(RefreshTrigger::Manual).await);
        assert_eq!(report.failed(), vec![Section::Agents]);
        assert!(h.view.events().contains(&"overview:2".to_string()));
    }

    #[tokio::test]
    async fn test_chart_redraw_destroys_before_plotting() {
        let h = harness(StdDuration::ZERO, RecordingView::default()).await;
        completed(h.coordinator.request_refresh(RefreshTrigger::Manual).await);
        completed(h.coordinator.request_refresh(RefreshTrigger::Manual).await);

        let log = h.charts.log.lock().clone();
        assert_eq!(log.len(), 12);
        assert!(log[..4].iter().all(|e| e.starts_with("plot:")));
        for pair in log[4..].chunks(2) {
            assert_eq!(pair[0], "destroy");
            assert!(pair[1].starts_with("plot:"));
        }
        assert_eq!(h.charts.live.lock().len(), 4);

        h.coordinator.teardown();
        assert_eq!(h.coordinator.live_charts(), 0);
        assert!(h.charts.live.lock().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_chart_window_fails_only_charts() {
        let h = harness(StdDuration::ZERO, RecordingView::default()).await;
        let config = DashboardConfig { long_range_days: 200_000_000, chart_rebuild_delay_ms: 0, ..Default::default() };
        let coordinator = RefreshCoordinator::new(
            h.source.clone(),
            h.view.clone(),
            h.charts.clone(),
            Arc::new(FixedClock::new(now())),
            config,
        );

        let report = completed(coordinator.request_refresh(RefreshTrigger::Manual).await);
        assert_eq!(report.failed(), vec![Section::Charts]);
        assert!(h.view.events().contains(&"Error loading charts".to_string()));
        assert!(h.view.events().contains(&"overview:2".to_string()));
        assert_eq!(coordinator.live_charts(), 0);
    }

    async fn wait_for_cycles(coordinator: &RefreshCoordinator, cycles: u64) {
        tokio::time::timeout(StdDuration::from_secs(5), async {
            while coordinator.completed_cycles() < cycles {
                tokio::time::sleep(StdDuration::from_millis(5)).await;
            }
        })
        .await
        .expect("refresh did not complete in time");
    }

    #[tokio::test]
    async fn test_run_loop_reacts_and_tears_down() {
        let h = harness(StdDuration::ZERO, RecordingView::default()).await;
        let (tx, rx) = h.coordinator.trigger_channel();
        let runner = tokio::spawn(h.coordinator.clone().run(rx));

        // first timer tick fires immediately
        wait_for_cycles(&h.coordinator, 1).await;

        h.source.inner.insert(Collection::Cases, json!({
            "id": "c3", "status": "new", "created_at": now().to_rfc3339()
        })).await;
        wait_for_cycles(&h.coordinator, 2).await;

        tx.send(RefreshTrigger::FocusRegained).await.unwrap();
        wait_for_cycles(&h.coordinator, 3).await;
        assert!(h.view.events().contains(&"overview:3".to_string()));

        drop(tx);
        runner.await.unwrap().unwrap();
        assert_eq!(h.coordinator.live_charts(), 0);
        assert!(h.charts.live.lock().is_empty());
    }
}
