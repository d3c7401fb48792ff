//! Notion REST client.
//!
//! Implements [`RecordSource`] (database retrieve + query) and
//! [`BodyExporter`] (block children -> Markdown). The engine is synchronous,
//! so the client owns a tokio runtime and blocks on each request.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::runtime::Runtime;
use tracing::{debug, instrument};

use crate::model::RichText;
use crate::notion::blocks::{Block, BlockNode, render_markdown};
use crate::sync::{BodyExporter, CollectionInfo, RecordPage, RecordSource, SyncError, SyncResult};

/// Public API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";

/// API version sent in the `Notion-Version` header.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Block children page size (API maximum).
const BLOCK_PAGE_SIZE: u32 = 100;

/// Nesting depth beyond which child blocks are not fetched.
const MAX_BLOCK_DEPTH: usize = 8;

/// Transport-level errors.
#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notion API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseResponse {
    id: String,
    #[serde(default)]
    title: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
struct BlockListResponse {
    #[serde(default)]
    results: Vec<Block>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Notion API client.
pub struct NotionClient {
    client: reqwest::Client,
    runtime: Runtime,
    api_base: String,
    token: String,
    page_size: Option<u32>,
}

impl NotionClient {
    /// Create a client for the public API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or runtime cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self, NotionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("nsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            runtime: Runtime::new()?,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            page_size: None,
        })
    }

    /// Point the client at another base URL (proxies, tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Page size for database queries (`None` = API default).
    #[must_use]
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, NotionError> {
        let status = response.status();
        if !status.is_success() {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            });
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, NotionError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .query(query)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, NotionError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// All children of a block, across pages.
    async fn block_children(&self, block_id: &str) -> Result<Vec<Block>, NotionError> {
        let path = format!("blocks/{block_id}/children");
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", BLOCK_PAGE_SIZE.to_string())];
            if let Some(cursor) = &cursor {
                query.push(("start_cursor", cursor.clone()));
            }

            let page: BlockListResponse = self.get(&path, &query).await?;
            blocks.extend(page.results);

            match page.next_cursor.filter(|_| page.has_more) {
                Some(next) => cursor = Some(next),
                None => return Ok(blocks),
            }
        }
    }

    /// Fetch a block's children and, recursively, theirs.
    fn block_tree(&self, block_id: &str, depth: usize) -> Result<Vec<BlockNode>, NotionError> {
        let blocks = self.runtime.block_on(self.block_children(block_id))?;

        blocks
            .into_iter()
            .map(|block| -> Result<BlockNode, NotionError> {
                let children = if block.has_children && depth < MAX_BLOCK_DEPTH {
                    self.block_tree(&block.id, depth + 1)?
                } else {
                    Vec::new()
                };
                Ok(BlockNode { block, children })
            })
            .collect()
    }
}

/// Request body for `POST /databases/{id}/query`.
fn query_body(cursor: Option<&str>, page_size: Option<u32>) -> Value {
    let mut body = Map::new();
    if let Some(cursor) = cursor {
        body.insert("start_cursor".to_string(), json!(cursor));
    }
    if let Some(size) = page_size {
        body.insert("page_size".to_string(), json!(size));
    }
    Value::Object(body)
}

fn unavailable(collection_id: &str, err: &NotionError) -> SyncError {
    SyncError::SourceUnavailable {
        collection_id: collection_id.to_string(),
        message: err.to_string(),
    }
}

impl RecordSource for NotionClient {
    #[instrument(level = "debug", skip(self))]
    fn retrieve_collection(&self, collection_id: &str) -> SyncResult<CollectionInfo> {
        let database: DatabaseResponse = self
            .runtime
            .block_on(self.get(&format!("databases/{collection_id}"), &[]))
            .map_err(|e| unavailable(collection_id, &e))?;

        let title = RichText::join_plain(&database.title);
        Ok(CollectionInfo {
            id: database.id,
            title: (!title.is_empty()).then_some(title),
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn list_records(&self, collection_id: &str, cursor: Option<&str>) -> SyncResult<RecordPage> {
        let body = query_body(cursor, self.page_size);
        let page: RecordPage = self
            .runtime
            .block_on(self.post(&format!("databases/{collection_id}/query"), &body))
            .map_err(|e| unavailable(collection_id, &e))?;

        debug!(
            collection = collection_id,
            records = page.records.len(),
            has_more = page.has_more,
            "Fetched page"
        );
        Ok(page)
    }
}

impl BodyExporter for NotionClient {
    #[instrument(level = "debug", skip(self))]
    fn export_body(&self, record_id: &str) -> SyncResult<String> {
        let tree = self
            .block_tree(record_id, 0)
            .map_err(|e| SyncError::BodyExport {
                record_id: record_id.to_string(),
                message: e.to_string(),
            })?;
        Ok(render_markdown(&tree))
    }
}
