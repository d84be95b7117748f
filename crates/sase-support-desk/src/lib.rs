//! OpenSASE Support Desk Dashboard
//!
//! Derivation core behind the support desk dashboard: reads cases, agents
//! and email threads from the hosted backend and turns them into plain
//! metric objects for the view layer.
//!
//! ## Architecture
//!
//! - **Domain Layer**: case/agent records, tolerant decoding, pure metric services
//! - **Application Layer**: refresh coordination, status actions, chart series
//! - **Ports Layer**: data source, view, chart sink and clock interfaces
//! - **Infrastructure Layer**: in-memory data source, tracing view, clocks
//!
//! ## Features
//!
//! - Resolved/pending counts with a priority breakdown
//! - SLA overdue detection per priority tier
//! - Daily created/resolved and response-time series
//! - Agent performance and efficiency labels
//! - Single-flight refresh driven by timers, UI events and change feeds

pub mod config;
pub mod error;
pub mod domain;
pub mod application;
pub mod ports;
pub mod infrastructure;

// Re-exports for convenience
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use domain::aggregates::{Agent, Case, EmailThread};
pub use domain::services::{
    aggregate, daily_buckets, efficiency, team_performance, AgentPerformance, BucketWindow, CaseMetrics,
    DayBucket, DerivedMetrics, PriorityBreakdown, SlaEvaluator, TeamPerformance,
};
pub use domain::value_objects::{AgentStatus, CaseStatus, Efficiency, Priority};
pub use domain::{ChangeEvent, ChangeKind, Collection};
pub use application::{CaseActionService, RefreshCoordinator, RefreshOutcome, RefreshTrigger};
pub use ports::inbound::CaseActions;
pub use ports::outbound::{ChartSink, Clock, DashboardView, DataSource, DataSourceError, Filter, Query};
