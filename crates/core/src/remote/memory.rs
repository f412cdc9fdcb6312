//! In-process remote store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Filter, Query, RemoteError, RemoteStore, compare_values};

/// Remote store backed by in-memory JSON tables.
///
/// Behaves like the hosted table API for the operations the storefront
/// uses. [`MemoryRemote::fail_next`] makes the next call fail with a given
/// message, which is how tests exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    failure: Mutex<Option<String>>,
    inserts: AtomicUsize,
}

impl MemoryRemote {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `table` with rows, replacing its contents.
    #[must_use]
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.to_owned(), rows);
        self
    }

    /// Snapshot of a table's rows.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Make the next call fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Number of insert calls that reached the store.
    #[must_use]
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(AtomicOrdering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), RemoteError> {
        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(message) => Err(RemoteError::Api {
                status: 400,
                message,
            }),
            None => Ok(()),
        }
    }

    fn matching(&self, query: &Query) -> Vec<Value> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(x), Some(y)) => {
                        compare_values(x, y).unwrap_or(std::cmp::Ordering::Equal)
                    }
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                };
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        rows
    }
}

fn project(row: Value, columns: &str) -> Value {
    if columns.trim() == "*" {
        return row;
    }
    let Value::Object(mut full) = row else {
        return row;
    };
    let mut out = Map::new();
    for column in columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(value) = full.remove(column) {
            out.insert(column.to_owned(), value);
        }
    }
    Value::Object(out)
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, RemoteError> {
        self.take_failure()?;
        Ok(self
            .matching(query)
            .into_iter()
            .map(|row| project(row, &query.columns))
            .collect())
    }

    async fn count(&self, query: &Query) -> Result<u64, RemoteError> {
        self.take_failure()?;
        let unlimited = Query {
            limit: None,
            order: None,
            ..query.clone()
        };
        Ok(self.matching(&unlimited).len() as u64)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<(), RemoteError> {
        self.inserts.fetch_add(1, AtomicOrdering::SeqCst);
        self.take_failure()?;
        if rows.iter().any(|row| !row.is_object()) {
            return Err(RemoteError::Api {
                status: 400,
                message: "rows must be JSON objects".to_owned(),
            });
        }
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_owned())
            .or_default()
            .extend(rows);
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<(), RemoteError> {
        self.take_failure()?;
        let Value::Object(patch) = patch else {
            return Err(RemoteError::Api {
                status: 400,
                message: "patch must be a JSON object".to_owned(),
            });
        };
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if !filters.iter().all(|f| f.matches(row)) {
                    continue;
                }
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }
}
