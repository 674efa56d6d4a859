//! PostgREST (Supabase) row client.

use async_trait::async_trait;
use footstorage::{
    errors::{Result as StorageResult, StorageError},
    fetch::{Collection, Record, RowSource},
};

use crate::error::{FetcherError, Result};

const REST_PATH: &str = "rest/v1";

/// Client for the REST interface of a Supabase project.
#[derive(Clone, Debug)]
pub struct PostgrestClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    /// Creates a client for the project at `base_url`, authenticating with `api_key`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(FetcherError::MissingCredential("source URL"));
        }
        if api_key.trim().is_empty() {
            return Err(FetcherError::MissingCredential("source API key"));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(FetcherError::InvalidParam(format!(
                "source URL must be http(s), got '{base_url}'"
            )));
        }
        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the REST endpoint for `table`.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    /// Fetches rows `[offset, offset + limit)` of `table`.
    pub async fn select_page(&self, table: &str, offset: usize, limit: usize) -> Result<Vec<Record>> {
        if table.is_empty() {
            return Err(FetcherError::InvalidParam("table name is empty".to_string()));
        }

        let mut params = vec![
            ("select", "*".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(order) = order_param(table) {
            params.push(("order", order));
        }

        let response = self
            .http_client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetcherError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let rows: Vec<Record> = serde_json::from_str(&body)?;
        Ok(rows)
    }
}

/// PostgREST `order` value for a known table, e.g. `player_id.asc,team_id.asc`.
pub fn order_param(table: &str) -> Option<String> {
    let collection = Collection::from_table_name(table)?;
    let columns: Vec<String> = collection
        .order_columns()
        .iter()
        .map(|column| format!("{column}.asc"))
        .collect();
    Some(columns.join(","))
}

#[async_trait]
impl RowSource for PostgrestClient {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn fetch_page(
        &self,
        collection: &str,
        offset: usize,
        limit: usize,
    ) -> StorageResult<Vec<Record>> {
        self.select_page(collection, offset, limit)
            .await
            .map_err(|err| StorageError::SyncError(format!("{collection}: {err}")))
    }
}
