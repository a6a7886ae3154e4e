pub mod sync_service;

pub use sync_service::{FailureKind, RecordFailure, RunResult, SyncOptions, SyncService};
