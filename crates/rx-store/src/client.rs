//! Minimal PostgREST client for a Supabase project.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use rx_core::ProbeError;
use serde_json::Value;
use tracing::{debug, info};

/// A remote table store that can insert rows and delete them by id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts `row` into `table` and returns the rows the server echoes back.
    async fn insert(&self, table: &str, row: &Value) -> Result<Vec<Value>, ProbeError>;

    /// Deletes rows whose `id` equals `id` and returns the deleted rows.
    async fn delete_by_id(&self, table: &str, id: &Value) -> Result<Vec<Value>, ProbeError>;
}

fn transport_err(e: impl ToString) -> ProbeError {
    ProbeError::Transport(e.to_string())
}

/// Turns a PostgREST response body into rows. An empty body means no rows.
fn parse_rows(body: &str) -> Result<Vec<Value>, ProbeError> {
    if body.trim().is_empty() {
        return Ok(vec![]);
    }
    Ok(match serde_json::from_str::<Value>(body)? {
        Value::Array(rows) => rows,
        Value::Null => vec![],
        row => vec![row],
    })
}

/// Renders an id for a PostgREST `eq.` filter.
fn filter_value(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Client bound to one Supabase URL/key pair.
pub struct SupabaseClient {
    client: Client,
    rest_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_err)?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    async fn rows(response: Response) -> Result<Vec<Value>, ProbeError> {
        let status = response.status();
        let body = response.text().await.map_err(transport_err)?;

        if !status.is_success() {
            return Err(ProbeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!("PostgREST {}: {}", status, body);
        parse_rows(&body)
    }
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn insert(&self, table: &str, row: &Value) -> Result<Vec<Value>, ProbeError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(transport_err)?;

        let rows = Self::rows(response).await?;
        info!("Inserted into {}: {} row(s) returned", table, rows.len());
        Ok(rows)
    }

    async fn delete_by_id(&self, table: &str, id: &Value) -> Result<Vec<Value>, ProbeError> {
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{}", filter_value(id)))])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(transport_err)?;

        let rows = Self::rows(response).await?;
        info!("Deleted from {}: {} row(s)", table, rows.len());
        Ok(rows)
    }
}
