use crate::core::{command, template, template::TemplateContext};
use crate::domain::model::{JobSpec, RenderedScript};
use crate::domain::ports::{JobSource, ScriptStore, Workflow};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use async_trait::async_trait;

/// 從 JobSource 組裝規格、解析模板、渲染語句並寫出腳本
pub struct ScriptWorkflow<S: ScriptStore, C: JobSource> {
    store: S,
    config: C,
}

impl<S: ScriptStore, C: JobSource> ScriptWorkflow<S, C> {
    pub fn new(store: S, config: C) -> Self {
        Self { store, config }
    }
}

fn resolve_spec(spec: JobSpec, ctx: &TemplateContext) -> Result<JobSpec> {
    Ok(JobSpec {
        extension: spec.extension,
        project: spec
            .project
            .map(|v| ctx.substitute("project", &v))
            .transpose()?,
        cmd: spec.cmd,
        config: ctx.substitute("config", &spec.config)?,
        tables: spec
            .tables
            .iter()
            .map(|t| ctx.substitute("tables", t))
            .collect::<Result<_>>()?,
        distribute_strategy: spec.distribute_strategy,
        cluster: spec.cluster,
        arn: spec.arn.map(|v| ctx.substitute("arn", &v)).transpose()?,
        buckets: spec
            .buckets
            .map(|v| ctx.substitute("buckets", &v))
            .transpose()?,
        oss_host: spec
            .oss_host
            .map(|v| ctx.substitute("ossHost", &v))
            .transpose()?,
        extra: spec
            .extra
            .into_iter()
            .map(|(k, v)| {
                let resolved = ctx.substitute(&k, &v)?;
                Ok((k, resolved))
            })
            .collect::<Result<_>>()?,
    })
}

#[async_trait]
impl<S: ScriptStore, C: JobSource> Workflow for ScriptWorkflow<S, C> {
    async fn assemble(&self) -> Result<JobSpec> {
        let spec = self.config.job()?;
        // 先確認模板格式, 再做取值/形狀檢查
        for (field, value) in spec.templated_fields() {
            template::scan_placeholders(field, value)?;
        }
        spec.validate()?;
        tracing::debug!("Assembled job spec for '{}'", spec.extension);
        Ok(spec)
    }

    async fn render(&self, spec: JobSpec) -> Result<RenderedScript> {
        let ctx =
            TemplateContext::new(self.config.placeholder_values()).with_auto_timestamp();
        let resolved = resolve_spec(spec, &ctx)?;
        // 替換後的語句必須通過全部形狀檢查
        resolved.validate()?;
        let statement = command::render(&resolved)?;
        Ok(RenderedScript {
            statement,
            filename: self.config.script_filename().to_string(),
        })
    }

    async fn deliver(&self, script: RenderedScript) -> Result<String> {
        self.store
            .write_script(&script.filename, &script.statement)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalScriptStore;
    use crate::domain::model::{ClusterSpec, DistributeStrategy, JobCommand, RoleSpec};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct FixedSource {
        spec: JobSpec,
        values: BTreeMap<String, String>,
        output: String,
    }

    impl JobSource for FixedSource {
        fn job(&self) -> Result<JobSpec> {
            Ok(self.spec.clone())
        }

        fn placeholder_values(&self) -> BTreeMap<String, String> {
            self.values.clone()
        }

        fn output_path(&self) -> &str {
            &self.output
        }

        fn script_filename(&self) -> &str {
            "submit_train.sql"
        }
    }

    fn templated_spec() -> JobSpec {
        JobSpec {
            extension: "easy_rec_ext".to_string(),
            project: None,
            cmd: JobCommand::Train,
            config: "oss://{OSS_BUCKET_NAME}/{EXP_NAME}/pipeline.config".to_string(),
            tables: vec!["odps://pai_online/tables/dwd_avazu_ctr_train".to_string()],
            distribute_strategy: Some(DistributeStrategy::Ess),
            cluster: Some(ClusterSpec {
                ps: Some(RoleSpec {
                    count: 1,
                    cpu: Some(800),
                    gpu: None,
                    memory: Some(20000),
                }),
                worker: Some(RoleSpec {
                    count: 3,
                    cpu: Some(1600),
                    gpu: Some(100),
                    memory: Some(40000),
                }),
            }),
            arn: None,
            buckets: Some("oss://{OSS_BUCKET_NAME}/".to_string()),
            oss_host: Some("oss-cn-beijing-internal.aliyuncs.com".to_string()),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_workflow_resolves_and_writes_script() {
        tokio_test::block_on(async {
            let temp_dir = TempDir::new().unwrap();
            let output = temp_dir.path().to_str().unwrap().to_string();

            let mut values = BTreeMap::new();
            values.insert("OSS_BUCKET_NAME".to_string(), "easyrec-demo".to_string());
            values.insert("EXP_NAME".to_string(), "dwd_avazu_ctr".to_string());

            let source = FixedSource {
                spec: templated_spec(),
                values,
                output: output.clone(),
            };
            let workflow = ScriptWorkflow::new(LocalScriptStore::new(output), source);

            let spec = workflow.assemble().await.unwrap();
            let script = workflow.render(spec).await.unwrap();
            assert!(script
                .statement
                .contains("-Dconfig=oss://easyrec-demo/dwd_avazu_ctr/pipeline.config"));
            assert!(script.statement.contains("-Dbuckets=oss://easyrec-demo/"));
            assert_eq!(script.filename, "submit_train.sql");

            let path = workflow.deliver(script).await.unwrap();
            assert!(path.ends_with("submit_train.sql"));

            let reader = LocalScriptStore::new(temp_dir.path().to_str().unwrap().to_string());
            let written = reader.read_script("submit_train.sql").await.unwrap();
            assert!(written.ends_with(";"));
        });
    }

    #[test]
    fn test_workflow_rejects_brace_in_placeholder_value() {
        tokio_test::block_on(async {
            let temp_dir = TempDir::new().unwrap();
            let output = temp_dir.path().to_str().unwrap().to_string();

            let mut values = BTreeMap::new();
            values.insert("OSS_BUCKET_NAME".to_string(), "bad{bucket".to_string());
            values.insert("EXP_NAME".to_string(), "dwd_avazu_ctr".to_string());

            let source = FixedSource {
                spec: templated_spec(),
                values,
                output: output.clone(),
            };
            let workflow = ScriptWorkflow::new(LocalScriptStore::new(output), source);

            let spec = workflow.assemble().await.unwrap();
            let err = workflow.render(spec).await.unwrap_err();
            assert!(matches!(
                err,
                crate::utils::error::SubmitError::InvalidConfigValueError { .. }
            ));

            // 不得寫出殘缺腳本
            assert!(!temp_dir.path().join("submit_train.sql").exists());
        });
    }

    #[test]
    fn test_workflow_fails_on_missing_placeholder() {
        tokio_test::block_on(async {
            let temp_dir = TempDir::new().unwrap();
            let output = temp_dir.path().to_str().unwrap().to_string();

            let source = FixedSource {
                spec: templated_spec(),
                values: BTreeMap::new(), // 未提供 OSS_BUCKET_NAME/EXP_NAME
                output: output.clone(),
            };
            let workflow = ScriptWorkflow::new(LocalScriptStore::new(output), source);

            let spec = workflow.assemble().await.unwrap();
            let err = workflow.render(spec).await.unwrap_err();
            assert!(matches!(
                err,
                crate::utils::error::SubmitError::UnknownPlaceholderError { .. }
            ));
        });
    }
}
