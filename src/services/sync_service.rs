use std::env;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use tracing::{info, warn};

use crate::canvas::CanvasClient;
use crate::error::SyncError;
use crate::models::{Assignment, SyncWindow};
use crate::notion::NotionClient;

/// Concurrent Notion page writes in flight at once.
const WRITE_CONCURRENCY: usize = 4;

#[derive(Clone, Debug, Default)]
pub struct SyncOptions {
    pub window: SyncWindow,
    /// Submission workflow states treated as started-but-not-submitted.
    pub started_states: Vec<String>,
}

impl SyncOptions {
    pub fn new_from_env() -> Result<Self, SyncError> {
        let start = parse_date_var("SYNC_START_DATE")?;
        let end = parse_date_var("SYNC_END_DATE")?;
        let include_undated = env::var("SYNC_INCLUDE_UNDATED")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let started_states = env::var("CANVAS_STARTED_STATES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            window: SyncWindow {
                start,
                end,
                include_undated,
            },
            started_states,
        })
    }
}

fn parse_date_var(name: &str) -> Result<Option<NaiveDate>, SyncError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| SyncError::Config(format!("{name} is not a YYYY-MM-DD date: {raw}")))?;
            Ok(Some(date))
        }
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    CourseFetch,
    Normalize,
    PageWrite,
}

#[derive(Debug, Serialize)]
pub struct RecordFailure {
    /// Assignment id, or course id for course-level fetch failures.
    pub id: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct RunResult {
    pub fetched: usize,
    pub filtered_out: usize,
    pub written: usize,
    pub failures: Vec<RecordFailure>,
}

pub struct SyncService {
    canvas: Arc<dyn CanvasClient>,
    notion: Arc<dyn NotionClient>,
    options: SyncOptions,
}

impl SyncService {
    pub fn new(
        canvas: Arc<dyn CanvasClient>,
        notion: Arc<dyn NotionClient>,
        options: SyncOptions,
    ) -> Self {
        Self {
            canvas,
            notion,
            options,
        }
    }

    /// One complete run: fetch, normalize, filter, recreate the database,
    /// write. `Err` means a fatal condition with no completed-database
    /// guarantee; recoverable failures are returned inside the result.
    pub async fn run(&self) -> Result<RunResult, SyncError> {
        self.options.window.validate()?;

        let mut result = RunResult::default();
        let now = Utc::now();

        info!("Step 1: Fetching Canvas courses");
        let courses = self.canvas.fetch_courses().await?;
        info!("Found {} candidate courses", courses.len());

        let mut canonical = Vec::new();
        let mut any_course_fetched = false;

        for course in &courses {
            let course_name = course.display_name();
            info!("Processing course {} ({})", course.id, course_name);

            let assignments = match self.canvas.fetch_assignments(course.id).await {
                Ok(assignments) => {
                    any_course_fetched = true;
                    assignments
                }
                Err(e @ SyncError::Unauthorized { .. }) => return Err(e),
                Err(e) => {
                    warn!("Skipping course {}: {}", course.id, e);
                    result.failures.push(RecordFailure {
                        id: course.id.to_string(),
                        kind: FailureKind::CourseFetch,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            result.fetched += assignments.len();

            for raw in assignments {
                let id = raw.id.to_string();
                match Assignment::from_raw(&course_name, raw, now, &self.options.started_states) {
                    Ok(assignment) => canonical.push(assignment),
                    Err(e) => {
                        warn!("Skipping assignment {}: {}", id, e);
                        result.failures.push(RecordFailure {
                            id,
                            kind: FailureKind::Normalize,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        // Never destroy the previous database when the fetch stage came
        // back empty-handed for every course.
        if !courses.is_empty() && !any_course_fetched {
            return Err(SyncError::NoCourseData);
        }

        let before = canonical.len();
        canonical.retain(|a| self.options.window.includes(a.due_date));
        result.filtered_out = before - canonical.len();
        info!(
            "Step 2: {} of {} assignments inside the due-date window",
            canonical.len(),
            before
        );

        info!("Step 3: Recreating the target database");
        if let Some(old_id) = self.notion.find_database().await? {
            if let Err(e) = self.notion.archive_database(&old_id).await {
                warn!("Failed to archive previous database {}: {}", old_id, e);
            }
        }
        let database_id = self.notion.create_database().await?;

        info!("Step 4: Writing {} assignments", canonical.len());
        let outcomes: Vec<(String, Result<(), SyncError>)> = stream::iter(canonical)
            .map(|assignment| {
                let notion = Arc::clone(&self.notion);
                let database_id = database_id.clone();
                async move {
                    let outcome = notion.create_page(&database_id, &assignment).await;
                    (assignment.id, outcome)
                }
            })
            .buffer_unordered(WRITE_CONCURRENCY)
            .collect()
            .await;

        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => result.written += 1,
                Err(e @ SyncError::Unauthorized { .. }) => return Err(e),
                Err(e) => {
                    warn!("Failed to write assignment {}: {}", id, e);
                    result.failures.push(RecordFailure {
                        id,
                        kind: FailureKind::PageWrite,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Sync completed: {} fetched, {} filtered out, {} written, {} failures",
            result.fetched,
            result.filtered_out,
            result.written,
            result.failures.len()
        );
        Ok(result)
    }
}
