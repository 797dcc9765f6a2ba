#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::{Category, Recipient, RetryScope};
use crate::utils::error::{CampaignError, Result};
use crate::utils::validation::{
    validate_email_shape, validate_file_extension, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_EVENT_NAME: &str = "Code Feast 4.0";
pub const DEFAULT_ORGANIZATION_NAME: &str = "Programmers Club";

/// Pacing and retry policy for one run. Built once at startup, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub per_email_delay_seconds: u64,
    pub per_group_delay_seconds: u64,
    pub max_batch_size: usize,
    pub retry_on_encoding_error: bool,
    pub max_retries: u32,
    pub retry_scope: RetryScope,
    pub send_timeout_seconds: u64,
    pub dry_run: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            per_email_delay_seconds: 30,
            per_group_delay_seconds: 60,
            max_batch_size: 50,
            retry_on_encoding_error: true,
            max_retries: 1,
            retry_scope: RetryScope::Subject,
            send_timeout_seconds: 60,
            dry_run: false,
        }
    }
}

impl BatchConfig {
    pub fn per_email_delay(&self) -> Duration {
        Duration::from_secs(self.per_email_delay_seconds)
    }

    pub fn per_group_delay(&self) -> Duration {
        Duration::from_secs(self.per_group_delay_seconds)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_seconds)
    }

    /// Encoding retries actually allowed for one recipient.
    pub fn encoding_retries(&self) -> u32 {
        if self.retry_on_encoding_error {
            self.max_retries
        } else {
            0
        }
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("max_batch_size", self.max_batch_size, 1)?;
        validate_positive_number("send_timeout_seconds", self.send_timeout_seconds as usize, 1)?;
        validate_range("max_retries", self.max_retries, 0, 5)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender_email: String,
    #[serde(skip_serializing)]
    pub sender_password: String,
    pub sender_name: String,
    /// 部分舊 relay 不支援 SMTPUTF8，開啟後非 ASCII 主旨會回報 encoding error
    pub ascii_only: bool,
    pub timeout_seconds: u64,
}

impl SmtpSettings {
    /// Port 465 speaks TLS from the first byte; anything else upgrades with STARTTLS.
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branding {
    pub event_name: String,
    pub organization_name: String,
    pub year: i32,
}

impl Branding {
    pub fn new(event_name: impl Into<String>, organization_name: impl Into<String>) -> Self {
        use chrono::Datelike;
        Self {
            event_name: event_name.into(),
            organization_name: organization_name.into(),
            year: chrono::Utc::now().year(),
        }
    }
}

impl Default for Branding {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_NAME, DEFAULT_ORGANIZATION_NAME)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    File(PathBuf),
    Inline(Vec<Recipient>),
}

/// 一個類別對應的收件人來源
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub category: Category,
    pub kind: SourceKind,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub batch: BatchConfig,
    pub smtp: SmtpSettings,
    pub branding: Branding,
    pub sources: Vec<SourceSpec>,
    pub certificates_dir: PathBuf,
    pub report_path: Option<PathBuf>,
    pub failed_csv_path: Option<PathBuf>,
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.batch.validate()?;

        validate_non_empty_string("event_name", &self.branding.event_name)?;
        validate_non_empty_string("smtp.server", &self.smtp.server)?;
        validate_range("smtp.port", self.smtp.port, 1, u16::MAX)?;

        // dry run 不連線，不需要帳密
        if !self.batch.dry_run {
            if self.smtp.sender_email.trim().is_empty() {
                return Err(CampaignError::MissingConfigError {
                    field: "SENDER_EMAIL".to_string(),
                });
            }
            validate_email_shape("sender_email", &self.smtp.sender_email)?;
            if self.smtp.sender_password.is_empty() {
                return Err(CampaignError::MissingConfigError {
                    field: "SENDER_PASSWORD".to_string(),
                });
            }
        }

        if self.sources.is_empty() {
            return Err(CampaignError::NoRecipients);
        }
        for source in &self.sources {
            if let SourceKind::File(path) = &source.kind {
                let field = format!("{}_file", source.category);
                let path = path.to_string_lossy();
                validate_path(&field, &path)?;
                validate_file_extension(&field, &path, &["csv", "json"])?;
            }
        }

        if let Some(path) = &self.report_path {
            validate_path("report", &path.to_string_lossy())?;
        }
        if let Some(path) = &self.failed_csv_path {
            validate_path("failed_csv", &path.to_string_lossy())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            batch: BatchConfig::default(),
            smtp: SmtpSettings {
                server: DEFAULT_SMTP_SERVER.to_string(),
                port: DEFAULT_SMTP_PORT,
                sender_email: "club@example.com".to_string(),
                sender_password: "secret".to_string(),
                sender_name: "Code Feast 4.0 Team".to_string(),
                ascii_only: false,
                timeout_seconds: 30,
            },
            branding: Branding::default(),
            sources: vec![SourceSpec {
                category: Category::Winner,
                kind: SourceKind::File(PathBuf::from("data/winners.json")),
            }],
            certificates_dir: PathBuf::from("."),
            report_path: None,
            failed_csv_path: None,
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(settings().validate().is_ok());
        assert!(BatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut s = settings();
        s.batch.max_batch_size = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_missing_password_only_matters_outside_dry_run() {
        let mut s = settings();
        s.smtp.sender_password.clear();
        assert!(matches!(
            s.validate(),
            Err(CampaignError::MissingConfigError { .. })
        ));

        s.batch.dry_run = true;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_no_sources_is_fatal() {
        let mut s = settings();
        s.sources.clear();
        assert!(matches!(s.validate(), Err(CampaignError::NoRecipients)));
    }

    #[test]
    fn test_unsupported_source_extension() {
        let mut s = settings();
        s.sources[0].kind = SourceKind::File(PathBuf::from("winners.xlsx"));
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_encoding_retries_respects_flag() {
        let mut batch = BatchConfig::default();
        assert_eq!(batch.encoding_retries(), 1);
        batch.retry_on_encoding_error = false;
        assert_eq!(batch.encoding_retries(), 0);
        assert!(SmtpSettings {
            port: 465,
            ..settings().smtp
        }
        .implicit_tls());
    }
}
