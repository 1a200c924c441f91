use super::columns::ColumnMap;
use super::error::Result;
use super::mutations::{build_mutations, MutationBatch, MutationItem, MutationKind};
use super::transport::{Endpoint, HttpTransport, Transport};
use super::values::Row;
use crate::config::GlideConfig;
use log::{debug, info};

/// Client for one Glide app
///
/// Reads are implemented in `pagination.rs`; this file covers construction
/// and writes.
pub struct GlideClient<T: Transport = HttpTransport> {
    app_id: String,
    transport: T,
    max_pages: Option<usize>,
}

impl<T: Transport> GlideClient<T> {
    pub fn new(app_id: impl Into<String>, transport: T) -> Self {
        GlideClient {
            app_id: app_id.into(),
            transport,
            max_pages: None,
        }
    }

    /// Cap the number of pages a single table read may request
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    /// Send a prebuilt batch of mutations as a single request
    pub async fn mutate(&self, mutations: Vec<MutationItem>) -> Result<()> {
        let batch = MutationBatch {
            app_id: self.app_id.clone(),
            mutations,
        };
        let body = serde_json::to_value(&batch)?;
        debug!("Request body: {}", body);

        // Response body carries nothing we need beyond the success status
        self.transport.send(Endpoint::MutateTables, body).await?;
        Ok(())
    }

    /// Build and send one mutation batch for the given rows
    ///
    /// Nothing is sent if any row fails to build.
    pub async fn apply(
        &self,
        kind: MutationKind,
        table_name: &str,
        column_map: &ColumnMap,
        rows: &[Row],
    ) -> Result<()> {
        let mutations = build_mutations(rows, column_map, table_name, kind)?;

        info!("{} {} rows in table {}...", kind.verb(), rows.len(), table_name);
        self.mutate(mutations).await?;
        info!(
            "{} {} rows in table {} succeeded.",
            kind.verb(),
            rows.len(),
            table_name
        );
        Ok(())
    }

    pub async fn add_rows(
        &self,
        table_name: &str,
        column_map: &ColumnMap,
        rows: &[Row],
    ) -> Result<()> {
        self.apply(MutationKind::Add, table_name, column_map, rows).await
    }

    /// Overwrite the mapped columns of existing rows (each row needs `$rowID`)
    pub async fn set_columns_in_rows(
        &self,
        table_name: &str,
        column_map: &ColumnMap,
        rows: &[Row],
    ) -> Result<()> {
        self.apply(MutationKind::Update, table_name, column_map, rows).await
    }

    /// Delete rows by `$rowID`
    pub async fn delete_rows(&self, table_name: &str, rows: &[Row]) -> Result<()> {
        self.apply(MutationKind::Delete, table_name, &ColumnMap::new(), rows).await
    }
}

impl GlideClient<HttpTransport> {
    /// Create a client over HTTPS from loaded configuration
    pub fn from_config(config: &GlideConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_api_root(&config.api_root, &config.token);
        Ok(GlideClient::new(&config.app_id, transport).with_max_pages(config.max_pages))
    }

    /// Create a client from environment variables
    ///
    /// Required environment variables:
    /// - `GLIDE_TOKEN`: bearer token
    /// - `GLIDE_APP_ID`: application ID
    /// - `GLIDE_TABLE_NAME`: table name (validated here, used by callers)
    pub fn from_env() -> Result<Self> {
        Self::from_config(&GlideConfig::from_env()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glide::error::GlideError;
    use crate::glide::transport::mock::MockTransport;
    use serde_json::json;

    fn orders_map() -> ColumnMap {
        ColumnMap::new().with("c1", "orderid").with("c2", "qty")
    }

    #[tokio::test]
    async fn test_add_rows_sends_one_batch() {
        let transport = MockTransport::new().respond(json!({}));
        let client = GlideClient::new("app-1", transport);
        let rows = vec![
            Row::new().set("orderid", 7i64).set("qty", 2i64),
            Row::new().set("orderid", 8i64).set("qty", 1i64),
        ];

        client
            .add_rows("Orders", &orders_map(), &rows)
            .await
            .unwrap();

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Endpoint::MutateTables);
        assert_eq!(
            calls[0].1,
            json!({
                "appID": "app-1",
                "mutations": [
                    {"kind": "add-row-to-table", "tableName": "Orders", "columnValues": {"c1": "7", "c2": "2"}},
                    {"kind": "add-row-to-table", "tableName": "Orders", "columnValues": {"c1": "8", "c2": "1"}}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_missing_row_id_sends_nothing() {
        let client = GlideClient::new("app", MockTransport::new());
        let rows = vec![Row::with_id("r1"), Row::new()];

        let result = client.delete_rows("Orders", &rows).await;

        assert!(matches!(result, Err(GlideError::MissingRowId { index: 1 })));
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_share_endpoint() {
        let transport = MockTransport::new().respond(json!(null)).respond(json!(null));
        let client = GlideClient::new("app", transport);

        let update = vec![Row::with_id("r1").set("qty", 3i64)];
        client
            .set_columns_in_rows("Orders", &orders_map(), &update)
            .await
            .unwrap();
        client
            .delete_rows("Orders", &[Row::with_id("r1")])
            .await
            .unwrap();

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|(endpoint, _)| *endpoint == Endpoint::MutateTables));
        assert_eq!(calls[0].1["mutations"][0]["kind"], "set-columns-in-row");
        assert_eq!(calls[0].1["mutations"][0]["columnValues"]["c1"], "undefined");
        assert_eq!(
            calls[1].1["mutations"][0],
            json!({"kind": "delete-row", "tableName": "Orders", "rowID": "r1"})
        );
    }

    #[tokio::test]
    async fn test_http_error_surfaces() {
        let transport = MockTransport::new().fail(GlideError::Http {
            status: 401,
            status_text: "Unauthorized".into(),
        });
        let client = GlideClient::new("app", transport);

        let result = client
            .add_rows("Orders", &orders_map(), &[Row::new()])
            .await;
        assert!(matches!(result, Err(GlideError::Http { status: 401, .. })));
    }
}
