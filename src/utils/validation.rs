use crate::utils::error::{Result, SubmitError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u32, min_value: u32) -> Result<()> {
    if value < min_value {
        return Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 驗證 ODPS 表 URI (odps://<project>/tables/<table>[/<partition>])
pub fn validate_odps_table(field_name: &str, uri: &str) -> Result<()> {
    validate_non_empty_string(field_name, uri)?;

    let rest = uri.strip_prefix("odps://").ok_or_else(|| {
        SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: uri.to_string(),
            reason: "Table reference must start with odps://".to_string(),
        }
    })?;

    let mut parts = rest.splitn(3, '/');
    let project = parts.next().unwrap_or("");
    let keyword = parts.next().unwrap_or("");
    let table = parts.next().unwrap_or("");

    if project.is_empty() || keyword != "tables" || table.is_empty() {
        return Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: uri.to_string(),
            reason: "Expected odps://<project>/tables/<table>".to_string(),
        });
    }

    Ok(())
}

/// 驗證 OSS URI (oss://<bucket>/...)
pub fn validate_oss_uri(field_name: &str, uri: &str) -> Result<()> {
    validate_non_empty_string(field_name, uri)?;

    match Url::parse(uri) {
        Ok(url) if url.scheme() == "oss" => {
            if url.host_str().map(str::is_empty).unwrap_or(true) {
                return Err(SubmitError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: uri.to_string(),
                    reason: "OSS URI has no bucket name".to_string(),
                });
            }
            Ok(())
        }
        Ok(url) => Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: uri.to_string(),
            reason: format!("Unsupported URI scheme: {}", url.scheme()),
        }),
        Err(e) => Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: uri.to_string(),
            reason: format!("Invalid URI format: {}", e),
        }),
    }
}

/// 驗證 RAM 角色 ARN (acs:ram::<uid>:role/<name>)
pub fn validate_arn(field_name: &str, arn: &str) -> Result<()> {
    validate_non_empty_string(field_name, arn)?;

    let valid = arn
        .strip_prefix("acs:ram::")
        .map(|rest| {
            let mut parts = rest.splitn(2, ':');
            let uid = parts.next().unwrap_or("");
            let role = parts.next().unwrap_or("");
            !uid.is_empty() && role.starts_with("role/") && role.len() > "role/".len()
        })
        .unwrap_or(false);

    if !valid {
        return Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: arn.to_string(),
            reason: "Expected acs:ram::<account-id>:role/<role-name>".to_string(),
        });
    }

    Ok(())
}

/// 驗證 OSS endpoint 主機名 (例如 oss-cn-beijing-internal.aliyuncs.com)
pub fn validate_oss_host(field_name: &str, host: &str) -> Result<()> {
    validate_non_empty_string(field_name, host)?;

    if host.contains('/') || host.contains(':') {
        return Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: host.to_string(),
            reason: "OSS host must be a bare hostname, without scheme or path".to_string(),
        });
    }

    let parsed = Url::parse(&format!("https://{}", host));
    let is_hostname = matches!(&parsed, Ok(url) if url.host_str() == Some(host));
    if !is_hostname || !host.ends_with(".aliyuncs.com") {
        return Err(SubmitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: host.to_string(),
            reason: "Expected an *.aliyuncs.com endpoint hostname".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| SubmitError::MissingConfigError {
        field: field_name.to_string(),
    })
}
