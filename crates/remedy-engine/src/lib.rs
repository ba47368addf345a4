//! remedy-engine: execution, reporting, and the LLM-driven repair loops.
//!
//! `remedy-core` owns the pure pieces (scanning, snapshots, report
//! formatting); this crate owns everything with a side effect: running
//! Python files, talking to the model, and mutating the tree.

pub mod config;
pub mod edit;
pub mod exec;
pub mod inspect;
pub mod llm;
pub mod repair;

pub use config::Config;
pub use edit::{CodeEditService, EditFormat, FileEdit, LlmEditService, RepoEdit};
pub use exec::PythonExecutor;
pub use llm::LlmClient;
pub use repair::{fix_repository, iterative_engineering_process, FixOutcome};
