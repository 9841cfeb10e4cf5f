pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::LocalScriptStore;

pub use config::TomlJobConfig;
pub use core::{engine::SubmitEngine, workflow::ScriptWorkflow};
pub use domain::model::{ClusterSpec, DistributeStrategy, JobCommand, JobSpec, TableRef};
pub use utils::error::{Result, SubmitError};
