use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::canvas::dto;
use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    NotStarted,
    InProgress,
    Completed,
    Overdue,
}

impl AssignmentStatus {
    /// The Notion select option name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::NotStarted => "Not Started",
            AssignmentStatus::InProgress => "In Progress",
            AssignmentStatus::Completed => "Completed",
            AssignmentStatus::Overdue => "Overdue",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Not Started" => Some(AssignmentStatus::NotStarted),
            "In Progress" => Some(AssignmentStatus::InProgress),
            "Completed" => Some(AssignmentStatus::Completed),
            "Overdue" => Some(AssignmentStatus::Overdue),
            _ => None,
        }
    }
}

/// What the student has done with an assignment, as reported by the
/// embedded Canvas submission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// Canvas returned no submission record at all.
    Missing,
    Unsubmitted,
    /// A workflow state the deployment listed as started-but-not-submitted.
    Started,
    Submitted,
    Graded,
}

impl SubmissionState {
    pub fn from_raw(
        submission: Option<&dto::Submission>,
        started_states: &[String],
    ) -> Result<Self, SyncError> {
        let Some(submission) = submission else {
            return Ok(SubmissionState::Missing);
        };

        let state = submission.workflow_state.as_str();
        if started_states.iter().any(|s| s == state) {
            return Ok(SubmissionState::Started);
        }

        match state {
            "graded" => Ok(SubmissionState::Graded),
            // pending_review means turned in and waiting on a grader.
            "submitted" | "pending_review" => Ok(SubmissionState::Submitted),
            "unsubmitted" => Ok(SubmissionState::Unsubmitted),
            other => Err(SyncError::UnrecognizedSubmission(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub name: String,
    pub course_name: String,
    pub due_date: Option<DateTime<Utc>>,
    pub description: String,
    pub updated_date: DateTime<Utc>,
    pub link: String,
    pub points_possible: Option<f64>,
    pub score: Option<f64>,
    pub status: AssignmentStatus,
    pub submitted_date: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Normalize one raw Canvas assignment. Pure: `now` is the run's clock.
    pub fn from_raw(
        course_name: &str,
        raw: dto::Assignment,
        now: DateTime<Utc>,
        started_states: &[String],
    ) -> Result<Self, SyncError> {
        let state = SubmissionState::from_raw(raw.submission.as_ref(), started_states)?;

        let status = match state {
            SubmissionState::Graded | SubmissionState::Submitted => AssignmentStatus::Completed,
            SubmissionState::Missing | SubmissionState::Unsubmitted | SubmissionState::Started => {
                match raw.due_at {
                    None => AssignmentStatus::NotStarted,
                    Some(due) if due < now => AssignmentStatus::Overdue,
                    Some(_) if state == SubmissionState::Started => AssignmentStatus::InProgress,
                    Some(_) => AssignmentStatus::NotStarted,
                }
            }
        };

        let submission = raw.submission.as_ref();

        Ok(Self {
            id: raw.id.to_string(),
            name: raw.name,
            course_name: course_name.to_string(),
            due_date: raw.due_at,
            description: raw
                .description
                .as_deref()
                .map(clean_description)
                .unwrap_or_default(),
            updated_date: raw.updated_at,
            link: raw.html_url,
            points_possible: raw.points_possible,
            score: submission.and_then(|s| s.score),
            status,
            submitted_date: submission.and_then(|s| s.submitted_at),
        })
    }
}

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Reduce a Canvas HTML description to plain text: strip markup, turn
/// non-breaking spaces into plain spaces, collapse whitespace. Idempotent —
/// tags are stripped to a fixed point, and only the nbsp entity is decoded
/// (decoding `&lt;`/`&gt;` would reintroduce strippable text).
pub fn clean_description(input: &str) -> String {
    let mut text = input.to_string();
    loop {
        let stripped = TAG.replace_all(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    let text = text.replace("&nbsp;", " ").replace('\u{a0}', " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}
