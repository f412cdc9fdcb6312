//! PostgREST client for the hosted table API (`/rest/v1`).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{Filter, FilterOp, Query, RemoteError, RemoteStore};

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(alias = "error_description", alias = "msg")]
    error: Option<String>,
}

/// HTTP client for a PostgREST endpoint.
///
/// Sends the project key both as `apikey` and as a bearer token, which is
/// what the hosted gateway expects for anonymous and service-role access.
#[derive(Clone)]
pub struct PostgrestClient {
    client: reqwest::Client,
    rest_url: Url,
}

impl std::fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("rest_url", &self.rest_url.as_str())
            .finish_non_exhaustive()
    }
}

impl PostgrestClient {
    /// Create a client for the project at `project_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Network`] if the URL or key is malformed or the
    /// HTTP client fails to build.
    pub fn new(project_url: &str, api_key: &SecretString) -> Result<Self, RemoteError> {
        let rest_url = Url::parse(&format!("{}/rest/v1/", project_url.trim_end_matches('/')))
            .map_err(|e| RemoteError::Network(format!("invalid project URL: {e}")))?;

        let key = api_key.expose_secret();
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key)
                .map_err(|e| RemoteError::Network(format!("invalid API key format: {e}")))?,
        );
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| RemoteError::Network(format!("invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self { client, rest_url })
    }

    fn table_url(&self, table: &str) -> Result<Url, RemoteError> {
        self.rest_url
            .join(table)
            .map_err(|e| RemoteError::Network(format!("invalid table name {table}: {e}")))
    }

    fn query_url(&self, query: &Query, with_modifiers: bool) -> Result<Url, RemoteError> {
        let mut url = self.table_url(&query.table)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &query.columns);
            for filter in &query.filters {
                pairs.append_pair(&filter.column, &filter_expr(filter));
            }
            if with_modifiers {
                if let Some(order) = &query.order {
                    let dir = if order.ascending { "asc" } else { "desc" };
                    pairs.append_pair("order", &format!("{}.{dir}", order.column));
                }
                if let Some(limit) = query.limit {
                    pairs.append_pair("limit", &limit.to_string());
                }
            }
        }
        Ok(url)
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn filter_expr(filter: &Filter) -> String {
    match (filter.op, &filter.value) {
        (FilterOp::Eq, Value::Null) => "is.null".to_owned(),
        (FilterOp::Neq, Value::Null) => "not.is.null".to_owned(),
        (op, value) => format!("{}.{}", op.keyword(), render_value(value)),
    }
}

/// Extract the total from a `Content-Range` header (`0-24/42` or `*/42`).
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}

fn network(e: &reqwest::Error) -> RemoteError {
    RemoteError::Network(e.to_string())
}

#[async_trait]
impl RemoteStore for PostgrestClient {
    #[instrument(skip(self), fields(table = %query.table))]
    async fn select(&self, query: &Query) -> Result<Vec<Value>, RemoteError> {
        let url = self.query_url(query, true)?;
        debug!(%url, "select");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network(&e))?;
        check(response)
            .await?
            .json::<Vec<Value>>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    #[instrument(skip(self), fields(table = %query.table))]
    async fn count(&self, query: &Query) -> Result<u64, RemoteError> {
        let url = self.query_url(query, false)?;
        let response = self
            .client
            .head(url)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| network(&e))?;
        let response = check(response).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| RemoteError::Decode("missing Content-Range total".to_owned()))
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<(), RemoteError> {
        let url = self.table_url(table)?;
        let response = self
            .client
            .post(url)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await
            .map_err(|e| network(&e))?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<(), RemoteError> {
        let mut url = self.table_url(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            for filter in filters {
                pairs.append_pair(&filter.column, &filter_expr(filter));
            }
        }
        let response = self
            .client
            .patch(url)
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await
            .map_err(|e| network(&e))?;
        check(response).await?;
        Ok(())
    }
}
