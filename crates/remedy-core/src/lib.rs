//! Core domain model for remedy: snapshots, scanning, and repo reports.

pub mod report;
pub mod scan;
pub mod snapshot;
pub mod summary;
pub mod util;

pub use report::{ExecutionError, ExecutionResult, RepoReport, ReportOptions};
pub use scan::RepoSnapshot;
pub use snapshot::FileSnapshot;
