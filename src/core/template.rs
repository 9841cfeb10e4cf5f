use crate::utils::error::{Result, SubmitError};
use regex::Regex;
use std::collections::BTreeMap;

/// 佔位符名稱白名單之外的名稱必須由 [template] 表或 --set 提供
pub const BUILTIN_PLACEHOLDERS: &[&str] = &[
    "OSS_BUCKET_NAME",
    "EXP_NAME",
    "TIME_STAMP",
    "ALIYUN_UID",
    "ROLE_ARN",
    "ODPS_PROJ",
];

fn name_pattern() -> Regex {
    Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap()
}

fn snippet_of(value: &str) -> String {
    const MAX: usize = 40;
    if value.len() <= MAX {
        value.to_string()
    } else {
        let mut end = MAX;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &value[..end])
    }
}

/// 掃描一個欄位值中的 {NAME} 佔位符。
/// 不成對的大括號或非 UPPER_SNAKE_CASE 名稱視為格式錯誤。
pub fn scan_placeholders(field: &str, value: &str) -> Result<Vec<String>> {
    let pattern = name_pattern();
    let mut names = Vec::new();
    let mut chars = value.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                let rest = &value[i + 1..];
                let close = rest.find(&['{', '}'][..]);
                match close {
                    Some(j) if rest.as_bytes()[j] == b'}' => {
                        let name = &rest[..j];
                        if !pattern.is_match(name) {
                            return Err(SubmitError::InvalidConfigValueError {
                                field: field.to_string(),
                                value: value.to_string(),
                                reason: format!(
                                    "Placeholder name '{}' must be UPPER_SNAKE_CASE",
                                    name
                                ),
                            });
                        }
                        names.push(name.to_string());
                        // 跳到 '}' 之後
                        while let Some(&(k, _)) = chars.peek() {
                            if k > i + j + 1 {
                                break;
                            }
                            chars.next();
                        }
                    }
                    _ => {
                        return Err(SubmitError::UnbalancedBracesError {
                            field: field.to_string(),
                            snippet: snippet_of(value),
                        })
                    }
                }
            }
            '}' => {
                return Err(SubmitError::UnbalancedBracesError {
                    field: field.to_string(),
                    snippet: snippet_of(value),
                })
            }
            _ => {}
        }
    }

    Ok(names)
}

/// 佔位符取值環境。TIME_STAMP 未提供時自動以當前時間補上。
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn with_auto_timestamp(mut self) -> Self {
        self.values.entry("TIME_STAMP".to_string()).or_insert_with(|| {
            chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
        });
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// 名稱是內建佔位符或已有取值
    pub fn is_known(&self, name: &str) -> bool {
        self.values.contains_key(name) || BUILTIN_PLACEHOLDERS.contains(&name)
    }

    /// 嚴格替換: 未知佔位符直接報錯。
    /// 單趟重建, 取值不會被二次替換; 含大括號的取值一律拒絕,
    /// 保證結果中不殘留 `{` / `}`。
    pub fn substitute(&self, field: &str, value: &str) -> Result<String> {
        scan_placeholders(field, value)?;

        let mut result = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find('{') {
            result.push_str(&rest[..start]);
            let close = match rest[start..].find('}') {
                Some(j) => start + j,
                None => {
                    return Err(SubmitError::UnbalancedBracesError {
                        field: field.to_string(),
                        snippet: snippet_of(value),
                    })
                }
            };
            let name = &rest[start + 1..close];
            let replacement = self.values.get(name).ok_or_else(|| {
                SubmitError::UnknownPlaceholderError {
                    name: name.to_string(),
                }
            })?;
            if replacement.contains('{') || replacement.contains('}') {
                return Err(SubmitError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: replacement.clone(),
                    reason: format!("Value for {{{}}} may not contain braces", name),
                });
            }
            result.push_str(replacement);
            rest = &rest[close + 1..];
        }
        result.push_str(rest);

        Ok(result)
    }

    /// dry-run 分析用: 回報尚未有取值的佔位符 (按出現順序, 每個名稱一次)
    pub fn missing_in(&self, field: &str, value: &str) -> Result<Vec<String>> {
        let mut missing: Vec<String> = Vec::new();
        for name in scan_placeholders(field, value)? {
            if !self.values.contains_key(&name) && !missing.contains(&name) {
                missing.push(name);
            }
        }
        Ok(missing)
    }
}
