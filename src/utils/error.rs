use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required option: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Statement parse error at byte {position}: {message}")]
    ParseError { position: usize, message: String },

    #[error("Unknown placeholder: {{{name}}}")]
    UnknownPlaceholderError { name: String },

    #[error("Unbalanced braces in {field}: {snippet}")]
    UnbalancedBracesError { field: String, snippet: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Template,
    Parse,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SubmitError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SubmitError::IoError(_) => ErrorCategory::System,
            SubmitError::SerializationError(_) => ErrorCategory::System,
            SubmitError::ConfigValidationError { .. }
            | SubmitError::MissingConfigError { .. }
            | SubmitError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            SubmitError::ParseError { .. } => ErrorCategory::Parse,
            SubmitError::UnknownPlaceholderError { .. }
            | SubmitError::UnbalancedBracesError { .. } => ErrorCategory::Template,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SubmitError::IoError(_) => ErrorSeverity::Critical,
            SubmitError::SerializationError(_) => ErrorSeverity::High,
            SubmitError::ConfigValidationError { .. }
            | SubmitError::MissingConfigError { .. }
            | SubmitError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            SubmitError::ParseError { .. } => ErrorSeverity::High,
            SubmitError::UnknownPlaceholderError { .. } => ErrorSeverity::Medium,
            SubmitError::UnbalancedBracesError { .. } => ErrorSeverity::Medium,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SubmitError::IoError(_) => {
                "Check that the config file and output directory exist and are writable".to_string()
            }
            SubmitError::SerializationError(_) => {
                "The cluster topology could not be serialized; check role counts and resources"
                    .to_string()
            }
            SubmitError::ConfigValidationError { field, .. } => {
                format!("Fix the '{}' section of the job definition", field)
            }
            SubmitError::MissingConfigError { field } => {
                format!("Add the required '{}' option to the job definition", field)
            }
            SubmitError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the job definition", field)
            }
            SubmitError::ParseError { .. } => {
                "Check the statement syntax: 'pai -name <ext> -Dkey=value ... ;'".to_string()
            }
            SubmitError::UnknownPlaceholderError { name } => {
                format!(
                    "Provide a value for '{}' in the [template] table or with --set {}=...",
                    name, name
                )
            }
            SubmitError::UnbalancedBracesError { .. } => {
                "Placeholders must look like {NAME}; close every opening brace".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SubmitError::IoError(e) => format!("File operation failed: {}", e),
            SubmitError::SerializationError(_) => "Could not build the cluster JSON".to_string(),
            SubmitError::ConfigValidationError { field, message } => {
                format!("Job definition problem ({}): {}", field, message)
            }
            SubmitError::MissingConfigError { field } => {
                format!("The job definition is missing '{}'", field)
            }
            SubmitError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("'{}' is not a valid {} ({})", value, field, reason),
            SubmitError::ParseError { position, message } => {
                format!("The statement is malformed near byte {}: {}", position, message)
            }
            SubmitError::UnknownPlaceholderError { name } => {
                format!("No value provided for placeholder {{{}}}", name)
            }
            SubmitError::UnbalancedBracesError { field, snippet } => {
                format!("Braces do not match in {} ('{}')", field, snippet)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SubmitError>;
