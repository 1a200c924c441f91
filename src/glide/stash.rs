//! Stash-based bulk table API
//!
//! Rows are uploaded to a server-side stash in numbered batches; the stash is
//! then used to create a new table or to overwrite an existing one in a
//! single request.

use super::error::{GlideError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Root of the tables REST API
pub const DEFAULT_BASE_URL: &str = "https://api.glideapps.com";

/// Column types accepted by the tables API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    String,
    Number,
    Boolean,
    Url,
    DateTime,
    Json,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 6] = [
        ColumnKind::String,
        ColumnKind::Number,
        ColumnKind::Boolean,
        ColumnKind::Url,
        ColumnKind::DateTime,
        ColumnKind::Json,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::String => "string",
            ColumnKind::Number => "number",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Url => "url",
            ColumnKind::DateTime => "dateTime",
            ColumnKind::Json => "json",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = GlideError;

    fn from_str(s: &str) -> Result<Self> {
        ColumnKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = ColumnKind::ALL.iter().map(|k| k.as_str()).collect();
                GlideError::InvalidSchema(format!(
                    "Column type {} not allowed. Must be one of {:?}",
                    s, allowed
                ))
            })
    }
}

/// Wire form of a column type: `{"kind": "<type>"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    pub kind: ColumnKind,
}

/// A column in a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub id: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub display_name: String,
}

impl TableColumn {
    pub fn new(id: impl Into<String>, kind: ColumnKind, display_name: impl Into<String>) -> Self {
        TableColumn {
            id: id.into(),
            column_type: ColumnType { kind },
            display_name: display_name.into(),
        }
    }

    /// Create a column from a type name, rejecting unknown types
    pub fn parse(
        id: impl Into<String>,
        kind: &str,
        display_name: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(id, kind.parse()?, display_name))
    }

    pub fn kind(&self) -> ColumnKind {
        self.column_type.kind
    }
}

/// Client for stashing rows and creating/overwriting tables from a stash
pub struct StashClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
    stash_id: Option<String>,
    stash_serial: u32,
}

impl StashClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        StashClient {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
            stash_id: None,
            stash_serial: 0,
        }
    }

    /// ID of the stash currently being filled, if any
    pub fn stash_id(&self) -> Option<&str> {
        self.stash_id.as_deref()
    }

    /// Serial number the next batch will be stored under
    pub fn stash_serial(&self) -> u32 {
        self.stash_serial
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn reset_stash(&mut self) {
        self.stash_id = None;
        self.stash_serial = 0;
    }

    /// Send a request and return the JSON body, or `Api` error with the
    /// response text on a non-success status
    async fn send(&self, request: reqwest::RequestBuilder, context: String) -> Result<Value> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GlideError::Api {
                status: status.as_u16(),
                context,
                body: text,
            });
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Upload a batch of rows into the current stash, creating it on first use
    pub async fn stash_rows<R: Serialize>(&mut self, rows: &[R]) -> Result<()> {
        let stash_id = match self.stash_id.clone() {
            Some(id) => id,
            None => {
                let request = self.http_client.post(self.url("stashes"));
                let result = self.send(request, "create stash".to_string()).await?;
                let id = data_field(&result, "stashID")?;
                info!("Created new stash for records with id '{}'", id);
                self.stash_id = Some(id.clone());
                self.stash_serial = 0;
                id
            }
        };

        debug!(
            "adding {} rows to stash {} as batch {}...",
            rows.len(),
            stash_id,
            self.stash_serial
        );
        let request = self
            .http_client
            .post(self.url(&format!("stashes/{}/{}", stash_id, self.stash_serial)))
            .json(rows);
        self.send(
            request,
            format!("add rows batch for serial '{}'", self.stash_serial),
        )
        .await?;

        info!(
            "added {} rows as batch for serial '{}' successfully.",
            rows.len(),
            self.stash_serial
        );
        self.stash_serial += 1;
        Ok(())
    }

    fn stash_for_table(&self, columns: &[TableColumn]) -> Result<String> {
        if columns.is_empty() {
            return Err(GlideError::InvalidSchema(
                "at least one column must be provided".into(),
            ));
        }
        self.stash_id
            .clone()
            .ok_or_else(|| GlideError::InvalidSchema("no rows have been stashed".into()))
    }

    /// Create a new table from the stash, returning its table ID
    pub async fn create_table(&mut self, name: &str, columns: &[TableColumn]) -> Result<String> {
        debug!("creating table with columns: {:?}", columns);
        let stash_id = self.stash_for_table(columns)?;

        info!(
            "creating new table for table name '{}' using stash {}...",
            name, stash_id
        );
        let body = json!({
            "name": name,
            "schema": { "columns": columns },
            "rows": { "$stashID": stash_id },
        });
        let request = self.http_client.post(self.url("tables")).json(&body);
        let result = self
            .send(request, format!("create table '{}'", name))
            .await?;
        let table_id = data_field(&result, "tableID")?;

        info!("Creating table '{}' succeeded.", name);
        self.reset_stash();
        Ok(table_id)
    }

    /// Replace the schema and rows of an existing table with the stash
    pub async fn overwrite_table(
        &mut self,
        table_id: &str,
        columns: &[TableColumn],
    ) -> Result<()> {
        debug!("overwriting table with columns: {:?}", columns);
        let stash_id = self.stash_for_table(columns)?;

        let body = json!({
            "schema": { "columns": columns },
            "rows": { "$stashID": stash_id },
        });
        let request = self
            .http_client
            .put(self.url(&format!("tables/{}", table_id)))
            .json(&body);
        self.send(request, format!("overwrite table '{}'", table_id))
            .await?;

        info!("overwriting table '{}' succeeded.", table_id);
        self.reset_stash();
        Ok(())
    }
}

/// Extract `data.<field>` as a string from an API response
fn data_field(response: &Value, field: &str) -> Result<String> {
    response
        .get("data")
        .and_then(|data| data.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            GlideError::UnexpectedResponse(format!("response has no data.{}: {}", field, response))
        })
}
