use crate::domain::model::{ClusterSpec, DistributeStrategy, JobCommand, JobSpec};
use crate::utils::error::{Result, SubmitError};
use std::collections::BTreeMap;

#[derive(Debug)]
struct Token {
    text: String,
    pos: usize,
}

/// 按空白切詞, 引號內保留原文, `#` 到行尾為註解, `;` 自成一詞
fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    let mut quote_pos = 0usize;
    let mut in_comment = false;

    let mut flush = |current: &mut String, start: usize, tokens: &mut Vec<Token>| {
        if !current.is_empty() {
            tokens.push(Token {
                text: std::mem::take(current),
                pos: start,
            });
        }
    };

    for (i, c) in input.char_indices() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => match c {
                '\'' | '"' => {
                    if current.is_empty() {
                        start = i;
                    }
                    quote = Some(c);
                    quote_pos = i;
                }
                '#' => {
                    flush(&mut current, start, &mut tokens);
                    in_comment = true;
                }
                ';' => {
                    flush(&mut current, start, &mut tokens);
                    tokens.push(Token {
                        text: ";".to_string(),
                        pos: i,
                    });
                }
                c if c.is_whitespace() => flush(&mut current, start, &mut tokens),
                _ => {
                    if current.is_empty() {
                        start = i;
                    }
                    current.push(c);
                }
            },
        }
    }

    if quote.is_some() {
        return Err(SubmitError::ParseError {
            position: quote_pos,
            message: "Unterminated quote".to_string(),
        });
    }
    flush(&mut current, start, &mut tokens);

    Ok(tokens)
}

fn insert_option(
    options: &mut BTreeMap<String, String>,
    key: &str,
    value: String,
) {
    if options.insert(key.to_string(), value).is_some() {
        tracing::warn!("Duplicate option -D{}, last value wins", key);
    }
}

/// 把一條 PAI 提交語句解析回 JobSpec。
/// 只做語法層面的解析; 選項齊全與取值合理性交由 Validate 檢查
/// (`config`/`cmd` 除外, 缺了它們連 JobSpec 都組不出來)。
pub fn parse(input: &str) -> Result<JobSpec> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SubmitError::ParseError {
            position: 0,
            message: "Empty statement".to_string(),
        });
    }
    if tokens[0].text != "pai" {
        return Err(SubmitError::ParseError {
            position: tokens[0].pos,
            message: format!("Statement must start with 'pai', found '{}'", tokens[0].text),
        });
    }

    let mut extension: Option<String> = None;
    let mut project: Option<String> = None;
    let mut options: BTreeMap<String, String> = BTreeMap::new();
    let mut terminated = false;

    let mut i = 1;
    while i < tokens.len() {
        let token = &tokens[i];

        if token.text == ";" {
            if i != tokens.len() - 1 {
                return Err(SubmitError::ParseError {
                    position: tokens[i + 1].pos,
                    message: "Content after terminating ';'".to_string(),
                });
            }
            terminated = true;
            i += 1;
            continue;
        }

        if token.text == "-name" || token.text == "-project" {
            let value = match tokens.get(i + 1) {
                Some(next) if next.text != ";" => next.text.clone(),
                _ => {
                    return Err(SubmitError::ParseError {
                        position: token.pos,
                        message: format!("Option {} requires a value", token.text),
                    })
                }
            };
            if token.text == "-name" {
                if extension.replace(value).is_some() {
                    tracing::warn!("Duplicate -name option, last value wins");
                }
            } else if project.replace(value).is_some() {
                tracing::warn!("Duplicate -project option, last value wins");
            }
            i += 2;
            continue;
        }

        if let Some(rest) = token.text.strip_prefix("-D") {
            let (key, value) = rest.split_once('=').ok_or_else(|| SubmitError::ParseError {
                position: token.pos,
                message: format!("Expected -Dkey=value, found '{}'", token.text),
            })?;
            if key.is_empty() {
                return Err(SubmitError::ParseError {
                    position: token.pos,
                    message: "Option key cannot be empty".to_string(),
                });
            }
            insert_option(&mut options, key, value.to_string());
            i += 1;
            continue;
        }

        return Err(SubmitError::ParseError {
            position: token.pos,
            message: format!("Unexpected token '{}'", token.text),
        });
    }

    if !terminated {
        return Err(SubmitError::ParseError {
            position: input.len(),
            message: "Statement must end with ';'".to_string(),
        });
    }

    let extension = extension.ok_or_else(|| SubmitError::MissingConfigError {
        field: "name".to_string(),
    })?;
    let config = options
        .remove("config")
        .ok_or_else(|| SubmitError::MissingConfigError {
            field: "config".to_string(),
        })?;
    let cmd: JobCommand = options
        .remove("cmd")
        .ok_or_else(|| SubmitError::MissingConfigError {
            field: "cmd".to_string(),
        })?
        .parse()?;

    let tables = options
        .remove("tables")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let distribute_strategy = options
        .remove("distribute_strategy")
        .map(|raw| raw.parse::<DistributeStrategy>())
        .transpose()?;
    let cluster = options
        .remove("cluster")
        .map(|raw| ClusterSpec::from_json(&raw))
        .transpose()?;

    let arn = options.remove("arn");
    let buckets = options.remove("buckets");
    let oss_host = options.remove("ossHost");

    Ok(JobSpec {
        extension,
        project,
        cmd,
        config,
        tables,
        distribute_strategy,
        cluster,
        arn,
        buckets,
        oss_host,
        extra: options,
    })
}
