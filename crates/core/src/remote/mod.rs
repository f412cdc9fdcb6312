//! Remote catalog/order store interface.
//!
//! The hosted store is a key-filtered table API: `select(columns)`, filter
//! with `eq`/`neq`/`gt`/`gte`/`lt`/`lte`, `order(column, direction)`,
//! `limit(n)`, exact counts, `insert(rows)` and `update(patch).eq(..)`.
//! Anything exposing that shape can implement [`RemoteStore`].
//!
//! # Implementations
//!
//! - [`MemoryRemote`] - in-process tables, used by tests and offline runs
//! - [`PostgrestClient`] - PostgREST over HTTP (`remote` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use neemon_core::remote::{Query, select_as};
//! use neemon_core::Product;
//!
//! let query = Query::from("products")
//!     .eq("is_active", true)
//!     .gt("stock", 0)
//!     .order("created_at", false)
//!     .limit(20);
//! let products: Vec<Product> = select_as(&store, &query).await?;
//! ```

mod memory;
#[cfg(feature = "remote")]
mod postgrest;

use std::cmp::Ordering as CmpOrdering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryRemote;
#[cfg(feature = "remote")]
pub use postgrest::PostgrestClient;

/// Table names used by the storefront.
pub mod tables {
    /// Catalog rows.
    pub const PRODUCTS: &str = "products";
    /// Order rows.
    pub const ORDERS: &str = "orders";
}

/// Errors returned by the remote store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The store rejected the request. `message` is the store's own text
    /// and is shown to users verbatim.
    #[error("{message}")]
    Api {
        /// HTTP status (or 0 when not applicable).
        status: u16,
        /// Store-provided message.
        message: String,
    },

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived but could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Build an API error without an HTTP status.
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            status: 0,
            message: message.into(),
        }
    }
}

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    /// PostgREST operator keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// A single column filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Create a filter.
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Equality filter, the shape used by `update(..).eq(key, value)`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    /// Evaluate the filter against a JSON row.
    ///
    /// Missing columns never match. Values are compared as timestamps when
    /// both parse as RFC 3339, then as numbers, then as strings.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => values_equal(actual, &self.value),
            FilterOp::Neq => !values_equal(actual, &self.value),
            FilterOp::Gt => compare_values(actual, &self.value) == Some(CmpOrdering::Greater),
            FilterOp::Gte => matches!(
                compare_values(actual, &self.value),
                Some(CmpOrdering::Greater | CmpOrdering::Equal)
            ),
            FilterOp::Lt => compare_values(actual, &self.value) == Some(CmpOrdering::Less),
            FilterOp::Lte => matches!(
                compare_values(actual, &self.value),
                Some(CmpOrdering::Less | CmpOrdering::Equal)
            ),
        }
    }
}

/// Sort order of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub ascending: bool,
}

/// A select query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    /// Comma-separated column list, `*` for all.
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Ordering>,
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query selecting every column of `table`.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_owned(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict the returned columns.
    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Eq, value))
    }

    #[must_use]
    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Neq, value))
    }

    #[must_use]
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Gt, value))
    }

    #[must_use]
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Gte, value))
    }

    #[must_use]
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Lt, value))
    }

    #[must_use]
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Lte, value))
    }

    /// Sort by `column`.
    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Ordering {
            column: column.to_owned(),
            ascending,
        });
        self
    }

    /// Cap the number of rows.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// Asynchronous key-filtered table API.
///
/// Every call attempts the operation exactly once; retries are the caller's
/// decision.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows matching the query, as JSON objects.
    async fn select(&self, query: &Query) -> Result<Vec<Value>, RemoteError>;

    /// Exact number of rows matching the query's filters.
    async fn count(&self, query: &Query) -> Result<u64, RemoteError>;

    /// Insert rows into `table`.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<(), RemoteError>;

    /// Apply `patch` to every row of `table` matching all `filters`.
    async fn update(&self, table: &str, patch: Value, filters: &[Filter])
    -> Result<(), RemoteError>;
}

/// Select rows and decode them into `T`.
///
/// Rows that do not match `T` are skipped with a warning, so one foreign
/// row cannot hide the rest of the table.
///
/// # Errors
///
/// Returns the store's error.
pub async fn select_as<T, S>(store: &S, query: &Query) -> Result<Vec<T>, RemoteError>
where
    T: DeserializeOwned,
    S: RemoteStore + ?Sized,
{
    let rows = store.select(query).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(table = %query.table, error = %e, "skipping undecodable row");
                None
            }
        })
        .collect())
}

/// Insert one serializable row.
///
/// # Errors
///
/// Returns the store's error, or [`RemoteError::Decode`] if the row cannot
/// be serialized.
pub async fn insert_one<T, S>(store: &S, table: &str, row: &T) -> Result<(), RemoteError>
where
    T: Serialize + Sync,
    S: RemoteStore + ?Sized,
{
    let value = serde_json::to_value(row).map_err(|e| RemoteError::Decode(e.to_string()))?;
    store.insert(table, vec![value]).await
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<CmpOrdering> {
    if let (Some(x), Some(y)) = (as_timestamp(a), as_timestamp(b)) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || compare_values(a, b) == Some(CmpOrdering::Equal)
}
