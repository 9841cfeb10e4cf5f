use crate::domain::model::{ClusterSpec, DistributeStrategy, JobCommand, JobSpec};
use crate::domain::ports::JobSource;
use crate::utils::error::{Result, SubmitError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlJobConfig {
    pub job: JobSection,
    pub inputs: InputsSection,
    pub distribution: Option<DistributionSection>,
    pub cluster: Option<ClusterSpec>,
    pub access: Option<AccessSection>,
    pub template: Option<BTreeMap<String, String>>,
    pub options: Option<BTreeMap<String, String>>,
    pub output: Option<OutputSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSection {
    /// PAI 擴展模組名 (pai -name <name>)
    pub name: String,
    pub project: Option<String>,
    pub cmd: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsSection {
    pub config: String,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSection {
    pub strategy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessSection {
    pub arn: Option<String>,
    pub buckets: Option<String>,
    pub oss_host: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
    pub filename: Option<String>,
}

impl TomlJobConfig {
    /// 從 TOML 檔案載入任務定義
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SubmitError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析任務定義
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SubmitError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ALIYUN_UID}); 未設定的變數原樣保留
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 把任務定義轉成結構化的 JobSpec
    pub fn build_job(&self) -> Result<JobSpec> {
        let cmd: JobCommand = self.job.cmd.parse()?;
        let distribute_strategy = self
            .distribution
            .as_ref()
            .map(|d| d.strategy.parse::<DistributeStrategy>())
            .transpose()?;

        Ok(JobSpec {
            extension: self.job.name.clone(),
            project: self.job.project.clone(),
            cmd,
            config: self.inputs.config.clone(),
            tables: self.inputs.tables.clone(),
            distribute_strategy,
            cluster: self.cluster.clone(),
            arn: self.access.as_ref().and_then(|a| a.arn.clone()),
            buckets: self.access.as_ref().and_then(|a| a.buckets.clone()),
            oss_host: self.access.as_ref().and_then(|a| a.oss_host.clone()),
            extra: self.options.clone().unwrap_or_default(),
        })
    }

    /// 驗證任務定義的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("job.name", &self.job.name)?;
        validation::validate_non_empty_string("output.path", self.output_path())?;
        validation::validate_non_empty_string("output.filename", self.script_filename())?;

        // [template] 的鍵必須是合法佔位符名稱
        if let Some(template) = &self.template {
            for name in template.keys() {
                crate::core::template::scan_placeholders("template", &format!("{{{}}}", name))?;
            }
        }

        self.build_job()?.validate()
    }

    /// 取得腳本輸出目錄
    pub fn output_path(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.path.as_deref())
            .unwrap_or("./scripts")
    }

    /// 取得腳本檔名
    pub fn script_filename(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.filename.as_deref())
            .unwrap_or("submit.sql")
    }

    pub fn set_placeholder(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.template
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
    }

    pub fn set_output_path(&mut self, path: impl Into<String>) {
        self.output.get_or_insert_with(OutputSection::default).path = Some(path.into());
    }
}

impl JobSource for TomlJobConfig {
    fn job(&self) -> Result<JobSpec> {
        self.build_job()
    }

    fn placeholder_values(&self) -> BTreeMap<String, String> {
        self.template.clone().unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        self.output_path()
    }

    fn script_filename(&self) -> &str {
        self.script_filename()
    }
}

impl Validate for TomlJobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
