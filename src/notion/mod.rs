pub mod dto;
pub mod properties;

use std::env;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{info, warn};

use crate::error::SyncError;
use crate::http::{REQUEST_TIMEOUT, send_with_retry};
use crate::models::Assignment;

const NOTION_VERSION: &str = "2022-06-28";

#[derive(Clone, Debug)]
pub struct NotionConfig {
    pub api_token: String,
    pub parent_page_id: String,
    pub database_title: String,
}

impl NotionConfig {
    pub fn new_from_env() -> Result<Self, SyncError> {
        let api_token = env::var("NOTION_API_KEY")
            .map_err(|_| SyncError::Config("NOTION_API_KEY is not set".to_string()))?;
        let parent_page_id = env::var("NOTION_PARENT_PAGE_ID")
            .map_err(|_| SyncError::Config("NOTION_PARENT_PAGE_ID is not set".to_string()))?;
        let database_title = env::var("NOTION_DB_TITLE")
            .unwrap_or_else(|_| "Canvas Course - Track Assignments".to_string());

        Ok(Self {
            api_token,
            parent_page_id,
            database_title,
        })
    }
}

#[async_trait]
pub trait NotionClient: Send + Sync {
    /// Id of the non-archived child database under the parent page whose
    /// title matches the configured name, if one exists.
    async fn find_database(&self) -> Result<Option<String>, SyncError>;

    async fn archive_database(&self, database_id: &str) -> Result<(), SyncError>;

    /// Create the target database with the fixed schema. Returns its id.
    async fn create_database(&self) -> Result<String, SyncError>;

    async fn create_page(
        &self,
        database_id: &str,
        assignment: &Assignment,
    ) -> Result<(), SyncError>;
}

pub struct NotionHttpClient {
    client: Client,
    config: NotionConfig,
}

impl NotionHttpClient {
    pub fn new(config: NotionConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    fn post(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn patch(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.patch(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Read every assignment page out of a database. Used to verify a run
    /// against the live workspace.
    pub async fn query_assignments(&self, database_id: &str) -> Result<Vec<Assignment>, SyncError> {
        let url = format!("https://api.notion.com/v1/databases/{database_id}/query");
        let mut assignments = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let request_body = dto::QueryDatabaseRequest {
                filter: None,
                sorts: None,
                start_cursor: cursor.clone(),
                page_size: Some(100),
            };

            let response = send_with_retry(self.post(&url).json(&request_body)).await?;
            let response = ensure_success(response).await?;
            let body: dto::QueryDatabaseResponse = response.json().await?;

            for page in &body.results {
                match properties::assignment_from_properties(&page.properties) {
                    Ok(assignment) => assignments.push(assignment),
                    Err(e) => warn!("Failed to parse assignment from page {}: {}", page.id, e),
                }
            }

            if !body.has_more {
                break;
            }
            cursor = body.next_cursor;
            if cursor.is_none() {
                break;
            }
        }

        Ok(assignments)
    }
}

#[async_trait]
impl NotionClient for NotionHttpClient {
    async fn find_database(&self) -> Result<Option<String>, SyncError> {
        let mut cursor: Option<String> = None;

        loop {
            let mut url = format!(
                "https://api.notion.com/v1/blocks/{}/children?page_size=100",
                self.config.parent_page_id
            );
            if let Some(c) = &cursor {
                url.push_str("&start_cursor=");
                url.push_str(c);
            }

            let response = send_with_retry(self.get(&url)).await?;
            let response = ensure_success(response).await?;
            let body: dto::BlockChildrenResponse = response.json().await?;

            for block in body.results {
                if let dto::Block::ChildDatabase {
                    id,
                    archived,
                    child_database,
                } = block
                {
                    if !archived && child_database.title == self.config.database_title {
                        return Ok(Some(id));
                    }
                }
            }

            if !body.has_more {
                break;
            }
            cursor = body.next_cursor;
            if cursor.is_none() {
                break;
            }
        }

        Ok(None)
    }

    async fn archive_database(&self, database_id: &str) -> Result<(), SyncError> {
        let url = format!("https://api.notion.com/v1/databases/{database_id}");
        let request_body = serde_json::json!({ "archived": true });

        let response = send_with_retry(self.patch(&url).json(&request_body)).await?;
        ensure_success(response).await?;

        info!("Archived previous database {}", database_id);
        Ok(())
    }

    async fn create_database(&self) -> Result<String, SyncError> {
        let request_body = serde_json::json!({
            "parent": {
                "type": "page_id",
                "page_id": self.config.parent_page_id,
            },
            "title": properties::database_title(&self.config.database_title),
            "properties": properties::database_properties(),
        });

        let response = send_with_retry(
            self.post("https://api.notion.com/v1/databases")
                .json(&request_body),
        )
        .await?;
        let response = ensure_success(response).await?;
        let database: dto::Database = response.json().await?;

        info!("Created database {}", database.id);
        Ok(database.id)
    }

    async fn create_page(
        &self,
        database_id: &str,
        assignment: &Assignment,
    ) -> Result<(), SyncError> {
        let request_body = serde_json::json!({
            "parent": { "database_id": database_id },
            "properties": properties::page_properties(assignment),
        });

        let response = send_with_retry(
            self.post("https://api.notion.com/v1/pages")
                .json(&request_body),
        )
        .await?;
        ensure_success(response).await?;

        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(SyncError::Unauthorized { service: "Notion" });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::NotionApi { status, body });
    }
    Ok(response)
}

/// Write-free stand-in for dry runs: the Canvas side of the pipeline runs
/// in full, nothing in Notion is touched.
pub struct NoopNotionClient;

#[async_trait]
impl NotionClient for NoopNotionClient {
    async fn find_database(&self) -> Result<Option<String>, SyncError> {
        Ok(None)
    }

    async fn archive_database(&self, _database_id: &str) -> Result<(), SyncError> {
        Ok(())
    }

    async fn create_database(&self) -> Result<String, SyncError> {
        Ok("dry-run".to_string())
    }

    async fn create_page(
        &self,
        _database_id: &str,
        assignment: &Assignment,
    ) -> Result<(), SyncError> {
        info!(
            "Dry run: would write \"{}\" ({})",
            assignment.name, assignment.id
        );
        Ok(())
    }
}
