use crate::domain::model::JobSpec;
use crate::utils::error::{Result, SubmitError};

/// 值含空白時加單引號 (叢集 JSON 固定加引號)。
/// 引號字元無法再被引用或裸渲染後解析回來, 一律拒絕。
fn format_value(field: &str, value: &str) -> Result<String> {
    if value.contains('\'') || value.contains('"') {
        return Err(SubmitError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Option values may not contain quote characters".to_string(),
        });
    }
    if value.contains(char::is_whitespace) {
        Ok(format!("'{}'", value))
    } else {
        Ok(value.to_string())
    }
}

/// 把 JobSpec 渲染成規範形式的 PAI 提交語句。
/// 選項順序固定: config, cmd, tables, distribute_strategy, cluster,
/// 透傳選項, arn, buckets, ossHost, 最後以 `;` 結尾。
pub fn render(spec: &JobSpec) -> Result<String> {
    let mut lines = vec![format!("pai -name {}", spec.extension)];

    if let Some(project) = &spec.project {
        lines.push(format!("-project {}", project));
    }

    lines.push(format!("-Dconfig={}", format_value("config", &spec.config)?));
    lines.push(format!("-Dcmd={}", spec.cmd));
    lines.push(format!(
        "-Dtables={}",
        format_value("tables", &spec.tables.join(","))?
    ));

    if let Some(strategy) = &spec.distribute_strategy {
        lines.push(format!("-Ddistribute_strategy={}", strategy));
    }
    if let Some(cluster) = &spec.cluster {
        lines.push(format!("-Dcluster='{}'", cluster.to_json()?));
    }
    for (key, value) in &spec.extra {
        lines.push(format!("-D{}={}", key, format_value(key, value)?));
    }
    if let Some(arn) = &spec.arn {
        lines.push(format!("-Darn={}", format_value("arn", arn)?));
    }
    if let Some(buckets) = &spec.buckets {
        lines.push(format!("-Dbuckets={}", format_value("buckets", buckets)?));
    }
    if let Some(host) = &spec.oss_host {
        lines.push(format!("-DossHost={}", format_value("ossHost", host)?));
    }

    Ok(format!("{};", lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        ClusterSpec, DistributeStrategy, JobCommand, RoleSpec,
    };
    use std::collections::BTreeMap;

    fn sample_spec() -> JobSpec {
        JobSpec {
            extension: "easy_rec_ext".to_string(),
            project: Some("algo_public".to_string()),
            cmd: JobCommand::Train,
            config: "oss://easyrec-demo/dwd_avazu_ctr/pipeline.config".to_string(),
            tables: vec![
                "odps://pai_online/tables/dwd_avazu_ctr_train".to_string(),
                "odps://pai_online/tables/dwd_avazu_ctr_test".to_string(),
            ],
            distribute_strategy: Some(DistributeStrategy::Ess),
            cluster: Some(ClusterSpec {
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
            }),
            arn: Some("acs:ram::1234567890:role/aliyunodpspaidefaultrole".to_string()),
            buckets: Some("oss://easyrec-demo/".to_string()),
            oss_host: Some("oss-cn-beijing-internal.aliyuncs.com".to_string()),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_render_canonical_statement() {
        let statement = render(&sample_spec()).unwrap();

        assert!(statement.starts_with("pai -name easy_rec_ext\n-project algo_public\n"));
        assert!(statement.contains("-Dconfig=oss://easyrec-demo/dwd_avazu_ctr/pipeline.config"));
        assert!(statement.contains("-Dcmd=train"));
        assert!(statement.contains(
            "-Dtables=odps://pai_online/tables/dwd_avazu_ctr_train,odps://pai_online/tables/dwd_avazu_ctr_test"
        ));
        assert!(statement.contains("-Ddistribute_strategy=ess"));
        assert!(statement.contains(
            r#"-Dcluster='{"ps":{"count":2,"cpu":1600,"memory":40000},"worker":{"count":8,"cpu":1600,"gpu":100,"memory":40000}}'"#
        ));
        assert!(statement.contains("-DossHost=oss-cn-beijing-internal.aliyuncs.com"));
        assert!(statement.ends_with(";"));
    }

    #[test]
    fn test_render_each_option_once() {
        let statement = render(&sample_spec()).unwrap();
        for option in ["-Dconfig=", "-Dcmd=", "-Dtables=", "-Dcluster="] {
            assert_eq!(statement.matches(option).count(), 1, "{}", option);
        }
    }

    #[test]
    fn test_render_skips_absent_options() {
        let mut spec = sample_spec();
        spec.project = None;
        spec.distribute_strategy = None;
        spec.arn = None;
        spec.buckets = None;
        spec.oss_host = None;

        let statement = render(&spec).unwrap();
        assert!(!statement.contains("-project"));
        assert!(!statement.contains("-Ddistribute_strategy"));
        assert!(!statement.contains("-Darn"));
    }

    #[test]
    fn test_render_quotes_whitespace_value_and_round_trips() {
        let mut spec = sample_spec();
        spec.extra
            .insert("edit_config_json".to_string(), "lr: 0.001".to_string());

        let statement = render(&spec).unwrap();
        assert!(statement.contains("-Dedit_config_json='lr: 0.001'"));

        let reparsed = crate::core::parser::parse(&statement).unwrap();
        assert_eq!(reparsed, spec);
    }

    #[test]
    fn test_render_rejects_quote_in_value() {
        let mut spec = sample_spec();
        spec.arn = Some("acs:ram::1:role/it's broken".to_string());

        let err = render(&spec).unwrap_err();
        assert!(matches!(
            err,
            crate::utils::error::SubmitError::InvalidConfigValueError { field, .. }
                if field == "arn"
        ));
    }

    #[test]
    fn test_render_extra_options() {
        let mut spec = sample_spec();
        spec.extra
            .insert("with_evaluator".to_string(), "1".to_string());
        spec.extra
            .insert("eval_method".to_string(), "separate".to_string());

        let statement = render(&spec).unwrap();
        assert!(statement.contains("-Deval_method=separate"));
        assert!(statement.contains("-Dwith_evaluator=1"));
    }
}
