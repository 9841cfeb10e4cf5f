use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{Result, SubmitError};
use crate::utils::validation::{self, Validate};

/// PAI 任務的操作指令 (easy_rec_ext 支援的四種模式)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCommand {
    Train,
    Evaluate,
    Export,
    Predict,
}

impl JobCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobCommand::Train => "train",
            JobCommand::Evaluate => "evaluate",
            JobCommand::Export => "export",
            JobCommand::Predict => "predict",
        }
    }
}

impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobCommand {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(JobCommand::Train),
            "evaluate" => Ok(JobCommand::Evaluate),
            "export" => Ok(JobCommand::Export),
            "predict" => Ok(JobCommand::Predict),
            other => Err(SubmitError::InvalidConfigValueError {
                field: "cmd".to_string(),
                value: other.to_string(),
                reason: "Supported commands: train, evaluate, export, predict".to_string(),
            }),
        }
    }
}

/// 分散式訓練策略選擇器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributeStrategy {
    /// ParameterServer 同步策略 (預設)
    Ps,
    /// ExascaleStrategy, 彈性大規模稀疏訓練
    Ess,
    Mirrored,
    Collective,
}

impl DistributeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributeStrategy::Ps => "ps",
            DistributeStrategy::Ess => "ess",
            DistributeStrategy::Mirrored => "mirrored",
            DistributeStrategy::Collective => "collective",
        }
    }
}

impl fmt::Display for DistributeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributeStrategy {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ps" => Ok(DistributeStrategy::Ps),
            "ess" => Ok(DistributeStrategy::Ess),
            "mirrored" => Ok(DistributeStrategy::Mirrored),
            "collective" => Ok(DistributeStrategy::Collective),
            other => Err(SubmitError::InvalidConfigValueError {
                field: "distribute_strategy".to_string(),
                value: other.to_string(),
                reason: "Supported strategies: ps, ess, mirrored, collective".to_string(),
            }),
        }
    }
}

/// ODPS 表引用 (odps://<project>/tables/<table>[/<partition>])
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub project: String,
    pub table: String,
    pub partition: Option<String>,
}

impl TableRef {
    pub fn parse(uri: &str) -> Result<Self> {
        validation::validate_odps_table("tables", uri)?;

        let rest = uri.trim_start_matches("odps://");
        let mut parts = rest.splitn(3, '/');
        let project = parts.next().unwrap_or_default().to_string();
        let mut tail = parts.nth(1).unwrap_or_default().splitn(2, '/');
        let table = tail.next().unwrap_or_default().to_string();
        let partition = tail.next().map(str::to_string);

        Ok(Self {
            project,
            table,
            partition,
        })
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "odps://{}/tables/{}", self.project, self.table)?;
        if let Some(partition) = &self.partition {
            write!(f, "/{}", partition)?;
        }
        Ok(())
    }
}

/// 單一角色的資源規格。cpu/gpu 以百分之一核/卡為單位 (cpu=1600 即 16 核),
/// memory 以 MB 為單位。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,
}

impl RoleSpec {
    fn validate_role(&self, role: &str) -> Result<()> {
        validation::validate_positive_number(&format!("cluster.{}.count", role), self.count, 1)?;
        if let Some(cpu) = self.cpu {
            validation::validate_range(&format!("cluster.{}.cpu", role), cpu, 50, 6400)?;
        }
        if let Some(gpu) = self.gpu {
            validation::validate_range(&format!("cluster.{}.gpu", role), gpu, 0, 800)?;
        }
        if let Some(memory) = self.memory {
            validation::validate_range(&format!("cluster.{}.memory", role), memory, 1024, 262144)?;
        }
        Ok(())
    }
}

/// -Dcluster 選項攜帶的叢集拓撲
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ps: Option<RoleSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<RoleSpec>,
}

impl ClusterSpec {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Validate for ClusterSpec {
    fn validate(&self) -> Result<()> {
        if self.ps.is_none() && self.worker.is_none() {
            return Err(SubmitError::ConfigValidationError {
                field: "cluster".to_string(),
                message: "Cluster must define at least one role (ps or worker)".to_string(),
            });
        }
        if let Some(ps) = &self.ps {
            ps.validate_role("ps")?;
        }
        if let Some(worker) = &self.worker {
            worker.validate_role("worker")?;
        }
        Ok(())
    }
}

/// 一條完整提交語句的結構化表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// 擴展模組名 (pai -name <extension>)
    pub extension: String,
    pub project: Option<String>,
    pub cmd: JobCommand,
    /// 模型/訓練配置檔位置 (-Dconfig)
    pub config: String,
    /// 輸入表 URI 列表 (-Dtables, 逗號分隔)
    pub tables: Vec<String>,
    pub distribute_strategy: Option<DistributeStrategy>,
    pub cluster: Option<ClusterSpec>,
    pub arn: Option<String>,
    pub buckets: Option<String>,
    pub oss_host: Option<String>,
    /// 其他原樣透傳的 -D 選項
    pub extra: BTreeMap<String, String>,
}

/// 值中帶有 {PLACEHOLDER} 時跳過形狀檢查, 交由模板層驗證
fn is_templated(value: &str) -> bool {
    value.contains('{')
}

impl Validate for JobSpec {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("name", &self.extension)?;
        validation::validate_non_empty_string("config", &self.config)?;
        if !is_templated(&self.config) {
            validation::validate_oss_uri("config", &self.config)?;
        }

        if self.tables.is_empty() {
            return Err(SubmitError::MissingConfigError {
                field: "tables".to_string(),
            });
        }
        for table in &self.tables {
            if !is_templated(table) {
                TableRef::parse(table)?;
            }
        }

        match &self.cluster {
            Some(cluster) => cluster.validate()?,
            None => {
                return Err(SubmitError::MissingConfigError {
                    field: "cluster".to_string(),
                })
            }
        }

        if let Some(arn) = &self.arn {
            if !is_templated(arn) {
                validation::validate_arn("arn", arn)?;
            }
        }
        if let Some(buckets) = &self.buckets {
            if !is_templated(buckets) {
                validation::validate_oss_uri("buckets", buckets)?;
            }
        }
        if let Some(host) = &self.oss_host {
            if !is_templated(host) {
                validation::validate_oss_host("ossHost", host)?;
            }
        }

        Ok(())
    }
}

impl JobSpec {
    /// 語句中可能含模板佔位符的欄位值, 按渲染順序
    pub fn templated_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields: Vec<(&'static str, &str)> = Vec::new();
        if let Some(project) = &self.project {
            fields.push(("project", project));
        }
        fields.push(("config", &self.config));
        for table in &self.tables {
            fields.push(("tables", table));
        }
        for value in self.extra.values() {
            fields.push(("extra", value));
        }
        if let Some(arn) = &self.arn {
            fields.push(("arn", arn));
        }
        if let Some(buckets) = &self.buckets {
            fields.push(("buckets", buckets));
        }
        if let Some(host) = &self.oss_host {
            fields.push(("ossHost", host));
        }
        fields
    }
}

/// 渲染完成的提交腳本
#[derive(Debug, Clone)]
pub struct RenderedScript {
    pub statement: String,
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_round_trip() {
        let table = TableRef::parse("odps://pai_online/tables/dwd_avazu_ctr_train").unwrap();
        assert_eq!(table.project, "pai_online");
        assert_eq!(table.table, "dwd_avazu_ctr_train");
        assert_eq!(table.partition, None);
        assert_eq!(
            table.to_string(),
            "odps://pai_online/tables/dwd_avazu_ctr_train"
        );
    }

    #[test]
    fn test_table_ref_with_partition() {
        let table = TableRef::parse("odps://prj/tables/clicks/ds=20220301").unwrap();
        assert_eq!(table.partition.as_deref(), Some("ds=20220301"));
        assert_eq!(table.to_string(), "odps://prj/tables/clicks/ds=20220301");
    }

    #[test]
    fn test_cluster_json_omits_absent_fields() {
        let cluster = ClusterSpec {
            ps: Some(RoleSpec {
                count: 2,
                cpu: Some(1600),
                gpu: None,
                memory: Some(40000),
            }),
            worker: Some(RoleSpec {
                count: 8,
                cpu: Some(1600),
                gpu: Some(100),
                memory: Some(40000),
            }),
        };

        let json = cluster.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"ps":{"count":2,"cpu":1600,"memory":40000},"worker":{"count":8,"cpu":1600,"gpu":100,"memory":40000}}"#
        );

        let parsed = ClusterSpec::from_json(&json).unwrap();
        assert_eq!(parsed, cluster);
    }

    #[test]
    fn test_cluster_requires_a_role() {
        let empty = ClusterSpec::default();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_cluster_resource_bounds() {
        let cluster = ClusterSpec {
            ps: None,
            worker: Some(RoleSpec {
                count: 1,
                cpu: Some(10),
                gpu: None,
                memory: None,
            }),
        };
        assert!(cluster.validate().is_err());
    }

    #[test]
    fn test_command_and_strategy_parsing() {
        assert_eq!("train".parse::<JobCommand>().unwrap(), JobCommand::Train);
        assert!("fit".parse::<JobCommand>().is_err());
        assert_eq!(
            "ess".parse::<DistributeStrategy>().unwrap(),
            DistributeStrategy::Ess
        );
        assert!("horovod".parse::<DistributeStrategy>().is_err());
    }

    #[test]
    fn test_templated_values_skip_shape_checks() {
        let spec = JobSpec {
            extension: "easy_rec_ext".to_string(),
            project: None,
            cmd: JobCommand::Train,
            config: "oss://{OSS_BUCKET_NAME}/{EXP_NAME}/pipeline.config".to_string(),
            tables: vec!["odps://prj/tables/train".to_string()],
            distribute_strategy: Some(DistributeStrategy::Ess),
            cluster: Some(ClusterSpec {
                ps: None,
                worker: Some(RoleSpec {
                    count: 1,
                    cpu: Some(800),
                    gpu: None,
                    memory: Some(4096),
                }),
            }),
            arn: None,
            buckets: None,
            oss_host: None,
            extra: BTreeMap::new(),
        };
        assert!(spec.validate().is_ok());
    }
}
