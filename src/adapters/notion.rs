use crate::config::toml_config::SourceConfig;
use crate::domain::model::{Pagination, RawRecord, SourceBatch};
use crate::domain::ports::ContactSource;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// `POST /databases/{id}/query` 的回應，只取需要的欄位
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<RawRecord>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Notion database 讀取器
pub struct NotionSource {
    client: Client,
    base_url: String,
    database_id: String,
    token: String,
    api_version: String,
    max_pages: u32,
    pagination_hint: u32,
}

impl NotionSource {
    pub fn new(client: Client, config: &SourceConfig, pagination_hint: u32) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            database_id: config.database_id.clone(),
            token: config.token.clone(),
            api_version: config.api_version.clone(),
            max_pages: config.max_pages,
            pagination_hint,
        }
    }

    fn query_url(&self) -> String {
        format!("{}/databases/{}/query", self.base_url, self.database_id)
    }

    async fn query_page(&self, cursor: Option<&str>) -> Result<QueryResponse> {
        let payload = match cursor {
            Some(cursor) => json!({ "start_cursor": cursor }),
            None => json!({}),
        };

        let endpoint = self.query_url();
        tracing::debug!("📡 POST {} (cursor: {:?})", endpoint, cursor);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.api_version)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 Notion response status: {}", status);

        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .json::<QueryResponse>()
            .await
            .map_err(|e| SyncError::Decode {
                message: format!("Notion query response: {}", e),
            })
    }

    async fn read_latest_page(&self) -> Result<SourceBatch> {
        let page = self.query_page(None).await?;
        tracing::info!("📄 Latest page: {} records", page.results.len());

        Ok(SourceBatch {
            records: page.results,
            pages_fetched: None,
        })
    }

    /// 沿著 `next_cursor` 讀完所有頁面。任一頁失敗即停止，回傳已累積的紀錄。
    async fn read_all_pages(&self) -> Result<SourceBatch> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages: u32 = 0;

        loop {
            if pages >= self.max_pages {
                tracing::warn!(
                    "⚠️ Reached max_pages ({}), stopping pagination with {} records",
                    self.max_pages,
                    records.len()
                );
                break;
            }

            tracing::info!(
                "📄 Fetching page {}/{}",
                pages + 1,
                self.pagination_hint.max(pages + 1)
            );

            let page = match self.query_page(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Page {} failed, keeping the {} records already fetched: {}",
                        pages + 1,
                        records.len(),
                        e
                    );
                    break;
                }
            };

            pages += 1;
            records.extend(page.results);

            match page.next_cursor.filter(|next| !next.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!("📄 Fetched {} records over {} pages", records.len(), pages);

        Ok(SourceBatch {
            records,
            pages_fetched: Some(pages),
        })
    }
}

#[async_trait]
impl ContactSource for NotionSource {
    async fn read_database(&self, pagination: Pagination) -> Result<SourceBatch> {
        match pagination {
            Pagination::LatestPageOnly => self.read_latest_page().await,
            Pagination::Full => self.read_all_pages().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::PropertyNames;
    use httpmock::prelude::*;

    fn source_config(base_url: String, max_pages: u32) -> SourceConfig {
        SourceConfig {
            database_id: "db-1".to_string(),
            token: "secret_notion".to_string(),
            base_url,
            api_version: "2021-05-13".to_string(),
            max_pages,
            properties: PropertyNames::default(),
        }
    }

    #[tokio::test]
    async fn test_latest_page_sends_auth_and_version_headers() {
        let server = MockServer::start_async().await;
        let query_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/databases/db-1/query")
                    .header("Authorization", "Bearer secret_notion")
                    .header("Notion-Version", "2021-05-13")
                    .json_body(json!({}));
                then.status(200).json_body(json!({
                    "results": [{"id": "r1"}, {"id": "r2"}],
                    "next_cursor": "ignored-in-latest-mode"
                }));
            })
            .await;

        let source = NotionSource::new(Client::new(), &source_config(server.base_url(), 10), 1);
        let batch = source
            .read_database(Pagination::LatestPageOnly)
            .await
            .unwrap();

        query_mock.assert_async().await;
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.pages_fetched, None);
    }

    #[tokio::test]
    async fn test_latest_page_error_status_is_fatal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/databases/db-1/query");
                then.status(401).json_body(json!({"message": "unauthorized"}));
            })
            .await;

        let source = NotionSource::new(Client::new(), &source_config(server.base_url(), 10), 1);
        let result = source.read_database(Pagination::LatestPageOnly).await;

        assert!(matches!(
            result,
            Err(SyncError::HttpStatus { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_results_array_is_empty_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/databases/db-1/query");
                then.status(200).json_body(json!({"object": "list"}));
            })
            .await;

        let source = NotionSource::new(Client::new(), &source_config(server.base_url(), 10), 1);
        let batch = source.read_database(Pagination::Full).await.unwrap();

        assert!(batch.records.is_empty());
        assert_eq!(batch.pages_fetched, Some(1));
    }

    #[tokio::test]
    async fn test_full_pagination_stops_at_max_pages() {
        let server = MockServer::start_async().await;
        let loop_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/databases/db-1/query");
                then.status(200).json_body(json!({
                    "results": [{"id": "same"}],
                    "next_cursor": "forever"
                }));
            })
            .await;

        let source = NotionSource::new(Client::new(), &source_config(server.base_url(), 3), 1);
        let batch = source.read_database(Pagination::Full).await.unwrap();

        loop_mock.assert_hits_async(3).await;
        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.pages_fetched, Some(3));
    }

    #[tokio::test]
    async fn test_undecodable_page_keeps_previous_records() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/databases/db-1/query")
                    .json_body(json!({}));
                then.status(200).json_body(json!({
                    "results": [{"id": "r1"}],
                    "next_cursor": "c2"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/databases/db-1/query")
                    .json_body(json!({"start_cursor": "c2"}));
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let source = NotionSource::new(Client::new(), &source_config(server.base_url(), 10), 2);
        let batch = source.read_database(Pagination::Full).await.unwrap();

        assert_eq!(batch.records, vec![json!({"id": "r1"})]);
        assert_eq!(batch.pages_fetched, Some(1));
    }
}
