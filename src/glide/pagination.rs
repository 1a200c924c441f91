use super::client::GlideClient;
use super::error::{GlideError, Result};
use super::transport::{Endpoint, Transport};
use futures::stream::{self, Stream, TryStreamExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One table query inside a `queryTables` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableQuery {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
}

/// Request body for the `queryTables` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(rename = "appID")]
    pub app_id: String,
    pub queries: Vec<TableQuery>,
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(default)]
    pub next: Option<String>,
}

impl QueryPage {
    /// Continuation token, if another page follows
    ///
    /// An empty token is treated the same as a missing one.
    pub fn continuation(&self) -> Option<&str> {
        self.next.as_deref().filter(|token| !token.is_empty())
    }
}

/// Where the paginator is in the token chain
enum Cursor {
    Start,
    At(String),
    Done,
}

/// Table reads that follow continuation tokens until the final page
impl<T: Transport> GlideClient<T> {
    /// Fetch a single page starting at the given continuation token
    pub async fn fetch_page(
        &self,
        table_name: &str,
        start_at: Option<String>,
    ) -> Result<QueryPage> {
        info!(
            "Fetching data from table {} with startAt {}...",
            table_name,
            start_at.as_deref().unwrap_or("<none>")
        );

        let request = QueryRequest {
            app_id: self.app_id().to_string(),
            queries: vec![TableQuery {
                table_name: table_name.to_string(),
                start_at,
            }],
        };

        let response = self
            .transport()
            .send(Endpoint::QueryTables, serde_json::to_value(&request)?)
            .await?;

        let mut pages: Vec<QueryPage> = serde_json::from_value(response)?;
        if pages.is_empty() {
            return Err(GlideError::UnexpectedResponse(format!(
                "queryTables returned no result for table '{}'",
                table_name
            )));
        }
        let page = pages.swap_remove(0);

        info!("Fetched {} rows", page.rows.len());
        if let (Some(first), Some(last)) = (page.rows.first(), page.rows.last()) {
            debug!("First row: {}", first);
            debug!("Last row: {}", last);
        }
        debug!("Continuation token: {:?}", page.continuation());

        Ok(page)
    }

    /// Lazily stream pages in order
    ///
    /// Each page is requested only when the previous one has been consumed,
    /// since the next request needs its continuation token.
    pub fn pages<'a>(
        &'a self,
        table_name: &'a str,
    ) -> impl Stream<Item = Result<QueryPage>> + 'a {
        stream::try_unfold((Cursor::Start, 0usize), move |(cursor, fetched)| async move {
            let start_at = match cursor {
                Cursor::Start => None,
                Cursor::At(token) => Some(token),
                Cursor::Done => return Ok(None),
            };

            if let Some(max) = self.max_pages() {
                if fetched >= max {
                    return Err(GlideError::PageLimit(max));
                }
            }

            let page = self.fetch_page(table_name, start_at).await?;
            let cursor = match page.continuation() {
                Some(token) => Cursor::At(token.to_string()),
                None => Cursor::Done,
            };

            Ok::<_, GlideError>(Some((page, (cursor, fetched + 1))))
        })
    }

    /// Fetch every row of the table, in page order
    pub async fn fetch_all_rows(&self, table_name: &str) -> Result<Vec<Value>> {
        self.pages(table_name)
            .try_fold(Vec::new(), |mut rows, page| async move {
                rows.extend(page.rows);
                Ok::<_, GlideError>(rows)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glide::transport::mock::MockTransport;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_two_pages_concatenated() {
        let transport = MockTransport::new()
            .respond(json!([{"rows": [{"n": "a"}, {"n": "b"}], "next": "t1"}]))
            .respond(json!([{"rows": [{"n": "c"}]}]));
        let client = GlideClient::new("app-1", transport);

        let rows = client.fetch_all_rows("Orders").await.unwrap();
        assert_eq!(rows, vec![json!({"n": "a"}), json!({"n": "b"}), json!({"n": "c"})]);

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, Endpoint::QueryTables);
        assert_eq!(
            calls[0].1,
            json!({"appID": "app-1", "queries": [{"tableName": "Orders"}]})
        );
        assert_eq!(
            calls[1].1,
            json!({"appID": "app-1", "queries": [{"tableName": "Orders", "startAt": "t1"}]})
        );
    }

    #[tokio::test]
    async fn test_single_page_without_token() {
        let transport = MockTransport::new().respond(json!([{"rows": [1, 2, 3]}]));
        let client = GlideClient::new("app", transport);

        let rows = client.fetch_all_rows("T").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(client.transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_or_null_token_terminates() {
        let transport = MockTransport::new()
            .respond(json!([{"rows": [1], "next": null}]))
            .respond(json!([{"rows": [2], "next": ""}]));
        let client = GlideClient::new("app", transport);

        assert_eq!(client.fetch_all_rows("T").await.unwrap(), vec![json!(1)]);
        assert_eq!(client.fetch_all_rows("T").await.unwrap(), vec![json!(2)]);
        assert_eq!(client.transport().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_pages_are_lazy() {
        let transport = MockTransport::new()
            .respond(json!([{"rows": [1], "next": "t1"}]))
            .respond(json!([{"rows": [2]}]));
        let client = GlideClient::new("app", transport);

        let mut pages = Box::pin(client.pages("T"));
        let first = pages.next().await.unwrap().unwrap();
        assert_eq!(first.continuation(), Some("t1"));
        assert_eq!(client.transport().calls().len(), 1);

        let second = pages.next().await.unwrap().unwrap();
        assert_eq!(second.rows, vec![json!(2)]);
        assert!(pages.next().await.is_none());
        assert_eq!(client.transport().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_propagates() {
        let transport = MockTransport::new()
            .respond(json!([{"rows": [1], "next": "t1"}]))
            .fail(GlideError::Http {
                status: 503,
                status_text: "Service Unavailable".into(),
            });
        let client = GlideClient::new("app", transport);

        let result = client.fetch_all_rows("T").await;
        assert!(matches!(result, Err(GlideError::Http { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_empty_response_array() {
        let transport = MockTransport::new().respond(json!([]));
        let client = GlideClient::new("app", transport);

        let result = client.fetch_all_rows("T").await;
        assert!(matches!(result, Err(GlideError::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn test_page_limit() {
        let transport = MockTransport::new()
            .respond(json!([{"rows": [1], "next": "t1"}]))
            .respond(json!([{"rows": [2], "next": "t2"}]))
            .respond(json!([{"rows": [3], "next": "t3"}]));
        let client = GlideClient::new("app", transport).with_max_pages(Some(2));

        let result = client.fetch_all_rows("T").await;
        assert!(matches!(result, Err(GlideError::PageLimit(2))));
        assert_eq!(client.transport().calls().len(), 2);
    }
}
