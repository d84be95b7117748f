//! Outbound ports
//!
//! Hexagonal architecture: the backend, the renderer, the chart library and
//! the clock are all collaborators behind these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::application::charts::ChartSpec;
use crate::application::dto::{RecentCaseRow, Section, TeamOverview};
use crate::domain::aggregates::Record;
use crate::domain::services::TeamPerformance;
use crate::domain::{ChangeEvent, ChangeKind, Collection};
use crate::error::Result;

// =============================================================================
// Data source
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    /// Field >= value; timestamps compare as instants, numbers numerically
    Gte(String, Value),
    Lt(String, Value),
    IsNull(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub descending: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order = Some(Order { field: field.into(), descending });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("entity not found")]
    NotFound,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Filtered stream of change notifications for one collection
pub struct ChangeSubscription {
    collection: Collection,
    kinds: Vec<ChangeKind>,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    pub fn new(collection: Collection, kinds: &[ChangeKind], rx: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { collection, kinds: kinds.to_vec(), rx }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Next matching event, `None` once the feed is closed. A lagging
    /// receiver yields a synthetic update since something did change.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.collection == self.collection && self.kinds.contains(&event.kind) => {
                    return Some(event)
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Change feed for {} lagged by {} events", self.collection, missed);
                    return Some(ChangeEvent {
                        collection: self.collection,
                        kind: ChangeKind::Update,
                        record_id: String::new(),
                    });
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Backend port
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Records matching the query
    async fn list(&self, collection: Collection, query: &Query) -> std::result::Result<Vec<Record>, DataSourceError>;

    async fn get_one(&self, collection: Collection, id: &str) -> std::result::Result<Option<Record>, DataSourceError>;

    /// Merge `fields` into an existing record
    async fn update(&self, collection: Collection, id: &str, fields: Map<String, Value>) -> std::result::Result<(), DataSourceError>;

    async fn subscribe(&self, collection: Collection, kinds: &[ChangeKind]) -> std::result::Result<ChangeSubscription, DataSourceError>;
}

// =============================================================================
// Rendering
// =============================================================================

/// Receives plain derived data for each dashboard section
pub trait DashboardView: Send + Sync {
    fn render_overview(&self, overview: &TeamOverview) -> Result<()>;
    fn render_agents(&self, team: &TeamPerformance) -> Result<()>;
    fn render_recent_cases(&self, rows: &[RecentCaseRow]) -> Result<()>;
    /// Inline "Error loading X" placeholder scoped to one section
    fn render_section_error(&self, section: Section, message: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChartHandle(pub uuid::Uuid);

impl ChartHandle {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ChartHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Plot-series sink
pub trait ChartSink: Send + Sync {
    fn plot(&self, spec: &ChartSpec) -> Result<ChartHandle>;
    fn destroy(&self, handle: ChartHandle);
}

// =============================================================================
// Clock
// =============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
