pub mod command;
pub mod engine;
pub mod parser;
pub mod template;
pub mod workflow;

pub use crate::domain::model::{JobSpec, RenderedScript};
pub use crate::domain::ports::{JobSource, ScriptStore, Workflow};
pub use crate::utils::error::Result;
