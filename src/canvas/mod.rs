pub mod dto;

use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::error::SyncError;
use crate::http::{REQUEST_TIMEOUT, send_with_retry};

#[derive(Clone, Debug)]
pub struct CanvasConfig {
    pub base_url: String,
    pub api_token: String,
    /// Optional allow-list of course ids. Empty means all active courses.
    pub course_ids: Vec<u64>,
}

impl CanvasConfig {
    pub fn new_from_env() -> Result<Self, SyncError> {
        let base_url = env::var("CANVAS_BASE_URL")
            .unwrap_or_else(|_| "https://canvas.instructure.com".to_string());
        let api_token = env::var("CANVAS_API_TOKEN")
            .map_err(|_| SyncError::Config("CANVAS_API_TOKEN is not set".to_string()))?;

        let mut course_ids = Vec::new();
        if let Ok(raw) = env::var("CANVAS_COURSE_IDS") {
            for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let id = part.parse::<u64>().map_err(|_| {
                    SyncError::Config(format!("CANVAS_COURSE_IDS has a non-numeric id: {part}"))
                })?;
                course_ids.push(id);
            }
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            course_ids,
        })
    }
}

#[async_trait]
pub trait CanvasClient: Send + Sync {
    /// Courses the run will mirror: the configured allow-list, or every
    /// course that is active for the authenticated user.
    async fn fetch_courses(&self) -> Result<Vec<dto::Course>, SyncError>;

    /// All assignments of one course, with the caller's own submission
    /// embedded, across pagination.
    async fn fetch_assignments(&self, course_id: u64) -> Result<Vec<dto::Assignment>, SyncError>;
}

pub struct CanvasHttpClient {
    client: Client,
    config: CanvasConfig,
}

impl CanvasHttpClient {
    pub fn new(config: CanvasConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<(T, Option<String>), SyncError> {
        let request = self
            .client
            .get(url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.config.api_token));

        let response = send_with_retry(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Unauthorized { service: "Canvas" });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::CanvasApi { status, body });
        }

        let next = response
            .headers()
            .get("Link")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link);

        let body = response.json::<T>().await?;
        Ok((body, next))
    }
}

#[async_trait]
impl CanvasClient for CanvasHttpClient {
    async fn fetch_courses(&self) -> Result<Vec<dto::Course>, SyncError> {
        let mut courses = Vec::new();

        if !self.config.course_ids.is_empty() {
            info!(
                "Fetching {} courses from the configured allow-list",
                self.config.course_ids.len()
            );
            for id in &self.config.course_ids {
                let url = format!("{}/api/v1/courses/{}", self.config.base_url, id);
                let (course, _) = self.get_json::<dto::Course>(&url, &[]).await?;
                if course.is_active() {
                    courses.push(course);
                } else {
                    debug!("Skipping course {} (not active)", id);
                }
            }
            return Ok(courses);
        }

        info!("No course allow-list set, fetching all active courses");
        let mut url = Some(format!("{}/api/v1/courses", self.config.base_url));
        let mut first_page = true;

        while let Some(page_url) = url {
            let query: &[(&str, &str)] = if first_page {
                &[
                    ("include[]", "term"),
                    ("state[]", "available"),
                    ("per_page", "100"),
                ]
            } else {
                // The Link header URL already carries the query string.
                &[]
            };
            first_page = false;

            let (batch, next) = self.get_json::<Vec<dto::Course>>(&page_url, query).await?;
            courses.extend(batch.into_iter().filter(dto::Course::is_active));
            url = next;
        }

        Ok(courses)
    }

    async fn fetch_assignments(&self, course_id: u64) -> Result<Vec<dto::Assignment>, SyncError> {
        let mut assignments = Vec::new();
        let mut url = Some(format!(
            "{}/api/v1/courses/{}/assignments",
            self.config.base_url, course_id
        ));
        let mut first_page = true;

        while let Some(page_url) = url {
            let query: &[(&str, &str)] = if first_page {
                &[("include[]", "submission"), ("per_page", "100")]
            } else {
                &[]
            };
            first_page = false;

            let (batch, next) = self
                .get_json::<Vec<dto::Assignment>>(&page_url, query)
                .await?;
            assignments.extend(batch);
            url = next;
        }

        debug!(
            "Fetched {} assignments for course {}",
            assignments.len(),
            course_id
        );
        Ok(assignments)
    }
}

/// Extract the `rel="next"` URL from an RFC 5988 `Link` header.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        if !part.contains(r#"rel="next""#) {
            return None;
        }
        let start = part.find('<')? + 1;
        let end = part.find('>')?;
        (start < end).then(|| part[start..end].to_string())
    })
}
