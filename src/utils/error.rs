use thiserror::Error;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Recipient source error ({source_name}): {message}")]
    SourceError {
        source_name: String,
        message: String,
    },

    #[error("No usable recipients found in any source")]
    NoRecipients,

    #[error("SMTP setup failed: {message}")]
    SmtpSetupError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Transport,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CampaignError {
    pub fn config(message: impl Into<String>) -> Self {
        CampaignError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CampaignError::ConfigError { .. }
            | CampaignError::MissingConfigError { .. }
            | CampaignError::InvalidConfigValueError { .. }
            | CampaignError::TomlError(_) => ErrorCategory::Configuration,
            CampaignError::CsvError(_)
            | CampaignError::SerializationError(_)
            | CampaignError::SourceError { .. }
            | CampaignError::NoRecipients => ErrorCategory::Data,
            CampaignError::SmtpSetupError { .. } => ErrorCategory::Transport,
            CampaignError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            CampaignError::NoRecipients => {
                "Check that at least one of --winners, --participants, --organizers or a [[groups]] entry points to a file with records".to_string()
            }
            CampaignError::MissingConfigError { field } => {
                format!("Set {} on the command line, in .env or in the campaign file", field)
            }
            CampaignError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of {} and re-run", field)
            }
            CampaignError::TomlError(_) | CampaignError::ConfigError { .. } => {
                "Make sure the campaign file exists and is valid TOML".to_string()
            }
            CampaignError::CsvError(_) | CampaignError::SerializationError(_) => {
                "Recipient files need name and email columns (CSV) or an array of objects (JSON)".to_string()
            }
            CampaignError::SourceError { source_name, .. } => {
                format!("Inspect {} for malformed records", source_name)
            }
            CampaignError::SmtpSetupError { .. } => {
                "Verify SMTP_SERVER, SMTP_PORT and the sender address".to_string()
            }
            CampaignError::IoError(_) => "Check file permissions and paths".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CampaignError::NoRecipients => "沒有可寄送的收件人 (no recipients to send to)".to_string(),
            other => format!("{}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CampaignError>;
