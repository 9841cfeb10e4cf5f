use crate::domain::model::{JobSpec, RenderedScript};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub trait ScriptStore: Send + Sync {
    fn read_script(&self, path: &str) -> impl std::future::Future<Output = Result<String>> + Send;
    fn write_script(
        &self,
        path: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait JobSource: Send + Sync {
    fn job(&self) -> Result<JobSpec>;
    fn placeholder_values(&self) -> BTreeMap<String, String>;
    fn output_path(&self) -> &str;
    fn script_filename(&self) -> &str;
}

#[async_trait]
pub trait Workflow: Send + Sync {
    async fn assemble(&self) -> Result<JobSpec>;
    async fn render(&self, spec: JobSpec) -> Result<RenderedScript>;
    async fn deliver(&self, script: RenderedScript) -> Result<String>;
}
