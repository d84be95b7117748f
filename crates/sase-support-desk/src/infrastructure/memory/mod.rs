//! In-memory data source
//!
//! Backs the demo binary and the tests. Records are kept as JSON objects per
//! collection and every insert/update is published on a broadcast channel.

use std::cmp::Ordering;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::domain::aggregates::fields::parse_timestamp;
use crate::domain::aggregates::Record;
use crate::domain::{ChangeEvent, ChangeKind, Collection};
use crate::ports::outbound::{ChangeSubscription, DataSource, DataSourceError, Filter, Query};

const CHANGE_FEED_CAPACITY: usize = 256;

pub struct InMemoryDataSource {
    collections: DashMap<Collection, Vec<Record>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for InMemoryDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { collections: DashMap::new(), changes }
    }

    /// Insert a record. Non-object values are ignored.
    pub async fn insert(&self, collection: Collection, value: Value) {
        let Value::Object(record) = value else {
            tracing::warn!("Ignoring non-object record for {}", collection);
            return;
        };
        let record_id = record_id(&record).unwrap_or_default();
        self.collections.entry(collection).or_default().push(record);
        self.publish(collection, ChangeKind::Insert, record_id);
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collections.get(&collection).map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.collections.iter().all(|entry| entry.value().is_empty())
    }

    fn publish(&self, collection: Collection, kind: ChangeKind, record_id: String) {
        // No receivers is fine: nobody is watching yet
        let _ = self.changes.send(ChangeEvent { collection, kind, record_id });
    }
}

fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Order two JSON values: timestamps as instants, numbers numerically,
/// everything else by its string form. Nulls sort first.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn field<'a>(record: &'a Record, key: &str) -> &'a Value {
    record.get(key).unwrap_or(&Value::Null)
}

fn matches(record: &Record, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(key, value) => compare_values(field(record, key), value) == Ordering::Equal,
        Filter::In(key, values) => values.iter().any(|v| compare_values(field(record, key), v) == Ordering::Equal),
        Filter::Gte(key, value) => {
            let current = field(record, key);
            !current.is_null() && compare_values(current, value) != Ordering::Less
        }
        Filter::Lt(key, value) => {
            let current = field(record, key);
            !current.is_null() && compare_values(current, value) == Ordering::Less
        }
        Filter::IsNull(key) => field(record, key).is_null(),
    }
}

#[async_trait]
impl DataSource for InMemoryDataSource {
    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Record>, DataSourceError> {
        let mut rows: Vec<Record> = match self.collections.get(&collection) {
            Some(records) => records
                .iter()
                .filter(|r| query.filters.iter().all(|f| matches(r, f)))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(field(a, &order.field), field(b, &order.field));
                if order.descending { ord.reverse() } else { ord }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn get_one(&self, collection: Collection, id: &str) -> Result<Option<Record>, DataSourceError> {
        Ok(self
            .collections
            .get(&collection)
            .and_then(|records| records.iter().find(|r| record_id(r).as_deref() == Some(id)).cloned()))
    }

    async fn update(&self, collection: Collection, id: &str, fields: Map<String, Value>) -> Result<(), DataSourceError> {
        {
            let mut records = self.collections.get_mut(&collection).ok_or(DataSourceError::NotFound)?;
            let record = records
                .iter_mut()
                .find(|r| record_id(r).as_deref() == Some(id))
                .ok_or(DataSourceError::NotFound)?;
            record.extend(fields);
        }
        self.publish(collection, ChangeKind::Update, id.to_string());
        Ok(())
    }

    async fn subscribe(&self, collection: Collection, kinds: &[ChangeKind]) -> Result<ChangeSubscription, DataSourceError> {
        Ok(ChangeSubscription::new(collection, kinds, self.changes.subscribe()))
    }
}
