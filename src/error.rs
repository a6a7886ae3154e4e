use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} rejected the credentials")]
    Unauthorized { service: &'static str },

    #[error("Canvas API error {status}: {body}")]
    CanvasApi {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Notion API error {status}: {body}")]
    NotionApi {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unrecognized submission workflow state: {0}")]
    UnrecognizedSubmission(String),

    #[error("Missing property: {0}")]
    MissingProperty(String),

    #[error("Unknown status option: {0}")]
    UnknownStatus(String),

    #[error("Could not fetch assignments for any course")]
    NoCourseData,
}
