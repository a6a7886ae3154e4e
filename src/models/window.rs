use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// The configured due-date inclusion range for one run. Bounds are
/// calendar dates compared against the UTC date of the due timestamp,
/// inclusive at both ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub include_undated: bool,
}

impl SyncWindow {
    pub fn validate(&self) -> Result<(), SyncError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(SyncError::Config(format!(
                    "Sync window start {start} is after end {end}"
                )));
            }
        }
        Ok(())
    }

    pub fn includes(&self, due_date: Option<DateTime<Utc>>) -> bool {
        match due_date {
            Some(due) => {
                let due = due.date_naive();
                self.start.is_none_or(|start| due >= start)
                    && self.end.is_none_or(|end| due <= end)
            }
            None => self.include_undated,
        }
    }
}
