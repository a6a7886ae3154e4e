pub mod assignment;
pub mod window;

pub use assignment::{Assignment, AssignmentStatus, SubmissionState, clean_description};
pub use window::SyncWindow;
