use crate::domain::model::{Category, Recipient, RetryScope};
use crate::utils::error::{CampaignError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 對應 campaign.toml 的結構，所有區段皆為選填
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignFile {
    #[serde(default)]
    pub campaign: CampaignSection,
    #[serde(default)]
    pub smtp: SmtpSection,
    #[serde(default)]
    pub pacing: PacingSection,
    #[serde(default)]
    pub groups: Vec<GroupSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignSection {
    pub event_name: Option<String>,
    pub organization_name: Option<String>,
    pub certificates_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmtpSection {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub sender_name: Option<String>,
    pub ascii_only: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacingSection {
    pub delay_between_emails: Option<u64>,
    pub delay_between_groups: Option<u64>,
    pub max_batch_size: Option<usize>,
    pub retry_on_encoding_error: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_scope: Option<RetryScope>,
    pub send_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSection {
    pub category: Category,
    pub file: Option<String>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

impl CampaignFile {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CampaignError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        let file: CampaignFile = toml::from_str(&processed_content)?;
        file.check_groups()?;
        Ok(file)
    }

    /// 替換環境變數 (例如 ${SENDER_PASSWORD})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CampaignError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn check_groups(&self) -> Result<()> {
        for (index, group) in self.groups.iter().enumerate() {
            if group.file.is_some() && !group.recipients.is_empty() {
                return Err(CampaignError::InvalidConfigValueError {
                    field: format!("groups[{}]", index),
                    value: group.category.to_string(),
                    reason: "a group takes either `file` or inline `recipients`, not both"
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_campaign_file() {
        std::env::set_var("CERT_MAILER_TEST_PASSWORD", "hunter2");
        let content = r#"
[campaign]
event_name = "MERN Workshop"
organization_name = "Programmers Club"

[smtp]
server = "smtp.example.com"
port = 587
sender_email = "club@example.com"
sender_password = "${CERT_MAILER_TEST_PASSWORD}"

[pacing]
delay_between_emails = 5
max_batch_size = 10
retry_scope = "all"

[[groups]]
category = "winner"
file = "data/winners.json"

[[groups]]
category = "organizers"

[[groups.recipients]]
name = "Faiz Ahmed"
email = "faiz@example.com"
certificate_path = "certificates/organizers/faizahmed.jpg"
event_stats = { total_participants = 30, completion_rate = "80%" }
"#;

        let file = CampaignFile::from_toml_str(content).unwrap();
        assert_eq!(file.campaign.event_name.as_deref(), Some("MERN Workshop"));
        assert_eq!(file.smtp.port, Some(587));
        assert_eq!(file.smtp.sender_password.as_deref(), Some("hunter2"));
        assert_eq!(file.pacing.delay_between_emails, Some(5));
        assert_eq!(file.pacing.retry_scope, Some(RetryScope::All));
        assert_eq!(file.groups.len(), 2);
        assert_eq!(file.groups[0].category, Category::Winner);
        assert_eq!(file.groups[1].category, Category::Organizer);
        assert_eq!(file.groups[1].recipients[0].event_stats.len(), 2);
    }

    #[test]
    fn test_unknown_env_var_left_untouched() {
        let content = r#"
[smtp]
sender_password = "${CERT_MAILER_DEFINITELY_UNSET}"
"#;
        let file = CampaignFile::from_toml_str(content).unwrap();
        assert_eq!(
            file.smtp.sender_password.as_deref(),
            Some("${CERT_MAILER_DEFINITELY_UNSET}")
        );
    }

    #[test]
    fn test_empty_file_is_valid() {
        let file = CampaignFile::from_toml_str("").unwrap();
        assert!(file.groups.is_empty());
    }

    #[test]
    fn test_group_with_file_and_inline_rejected() {
        let content = r#"
[[groups]]
category = "winner"
file = "winners.csv"

[[groups.recipients]]
name = "A"
email = "a@example.com"
"#;
        assert!(CampaignFile::from_toml_str(content).is_err());
    }

    #[test]
    fn test_invalid_toml_reports_error() {
        let result = CampaignFile::from_toml_str("[pacing\nmax_batch_size = 3");
        assert!(matches!(result, Err(CampaignError::TomlError(_))));
    }
}
