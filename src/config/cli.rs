use super::toml_config::CampaignFile;
use super::{
    BatchConfig, Branding, Settings, SmtpSettings, SourceKind, SourceSpec, DEFAULT_EVENT_NAME,
    DEFAULT_ORGANIZATION_NAME, DEFAULT_SMTP_PORT, DEFAULT_SMTP_SERVER,
};
use crate::domain::model::{Category, RetryScope};
use crate::utils::error::Result;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Command line surface. Every option falls back to an environment variable
/// (a `.env` file is loaded first), then to the campaign file, then to the default.
#[derive(Debug, Clone, Parser)]
#[command(name = "cert-mailer")]
#[command(about = "Send certificate emails to winners, participants and organizers")]
pub struct CliConfig {
    /// Path to a TOML campaign file
    #[arg(short, long, env = "CAMPAIGN_FILE")]
    pub config: Option<PathBuf>,

    /// Winners recipient file (.csv or .json)
    #[arg(long, env = "WINNERS_FILE")]
    pub winners: Option<PathBuf>,

    /// Participants recipient file (.csv or .json)
    #[arg(long, env = "PARTICIPANTS_FILE")]
    pub participants: Option<PathBuf>,

    /// Organizers recipient file (.csv or .json)
    #[arg(long, env = "ORGANIZERS_FILE")]
    pub organizers: Option<PathBuf>,

    /// Send order of the categories given as files
    #[arg(long, value_delimiter = ',', default_value = "winner,participant,organizer")]
    pub order: Vec<Category>,

    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    #[arg(long, env = "SENDER_PASSWORD", hide_env_values = true)]
    pub sender_password: Option<String>,

    /// Display name in the From header (defaults to "<event> Team")
    #[arg(long, env = "SENDER_NAME")]
    pub sender_name: Option<String>,

    #[arg(long, env = "SMTP_SERVER")]
    pub smtp_server: Option<String>,

    #[arg(long, env = "SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// Report non-ASCII subjects as encoding errors (for relays without SMTPUTF8)
    #[arg(long, env = "SMTP_ASCII_ONLY", value_parser = BoolishValueParser::new())]
    pub smtp_ascii_only: Option<bool>,

    #[arg(long, env = "EVENT_NAME")]
    pub event_name: Option<String>,

    #[arg(long, env = "ORGANIZATION_NAME")]
    pub organization_name: Option<String>,

    /// Base directory certificate paths are resolved against
    #[arg(long, env = "CERTIFICATES_DIR")]
    pub certificates_dir: Option<PathBuf>,

    /// Seconds to wait after each successful email
    #[arg(long, env = "DELAY_BETWEEN_EMAILS")]
    pub delay_between_emails: Option<u64>,

    /// Seconds to wait between batches and between categories
    #[arg(long, env = "DELAY_BETWEEN_GROUPS")]
    pub delay_between_groups: Option<u64>,

    #[arg(long, env = "MAX_BATCH_SIZE")]
    pub max_batch_size: Option<usize>,

    #[arg(long, env = "RETRY_ON_ENCODING_ERROR", value_parser = BoolishValueParser::new())]
    pub retry_on_encoding_error: Option<bool>,

    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// subject | all
    #[arg(long, env = "RETRY_SCOPE")]
    pub retry_scope: Option<RetryScope>,

    #[arg(long, env = "SEND_TIMEOUT_SECONDS")]
    pub send_timeout_seconds: Option<u64>,

    /// Render and log every email without connecting to the SMTP server
    #[arg(long, env = "DRY_RUN", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub dry_run: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write failed recipients as CSV (re-runnable as a source file)
    #[arg(long)]
    pub failed_csv: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(short, long, env = "DEBUG_MODE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入 campaign 檔（若有）並合併成最終設定
    pub fn resolve(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading campaign file from: {}", path.display());
                CampaignFile::from_file(path)?
            }
            None => CampaignFile::default(),
        };
        Ok(self.resolve_with(file))
    }

    /// 優先順序：命令列 / 環境變數 > campaign 檔 > 預設值
    pub fn resolve_with(&self, file: CampaignFile) -> Settings {
        let defaults = BatchConfig::default();
        let pacing = &file.pacing;

        let batch = BatchConfig {
            per_email_delay_seconds: self
                .delay_between_emails
                .or(pacing.delay_between_emails)
                .unwrap_or(defaults.per_email_delay_seconds),
            per_group_delay_seconds: self
                .delay_between_groups
                .or(pacing.delay_between_groups)
                .unwrap_or(defaults.per_group_delay_seconds),
            max_batch_size: self
                .max_batch_size
                .or(pacing.max_batch_size)
                .unwrap_or(defaults.max_batch_size),
            retry_on_encoding_error: self
                .retry_on_encoding_error
                .or(pacing.retry_on_encoding_error)
                .unwrap_or(defaults.retry_on_encoding_error),
            max_retries: self
                .max_retries
                .or(pacing.max_retries)
                .unwrap_or(defaults.max_retries),
            retry_scope: self
                .retry_scope
                .or(pacing.retry_scope)
                .unwrap_or(defaults.retry_scope),
            send_timeout_seconds: self
                .send_timeout_seconds
                .or(pacing.send_timeout_seconds)
                .unwrap_or(defaults.send_timeout_seconds),
            dry_run: self.dry_run,
        };

        let event_name = pick(&self.event_name, &file.campaign.event_name)
            .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string());
        let organization_name = pick(&self.organization_name, &file.campaign.organization_name)
            .unwrap_or_else(|| DEFAULT_ORGANIZATION_NAME.to_string());

        let smtp = SmtpSettings {
            server: pick(&self.smtp_server, &file.smtp.server)
                .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            port: self.smtp_port.or(file.smtp.port).unwrap_or(DEFAULT_SMTP_PORT),
            sender_email: pick(&self.sender_email, &file.smtp.sender_email).unwrap_or_default(),
            sender_password: pick(&self.sender_password, &file.smtp.sender_password)
                .unwrap_or_default(),
            sender_name: pick(&self.sender_name, &file.smtp.sender_name)
                .unwrap_or_else(|| format!("{} Team", event_name)),
            ascii_only: self
                .smtp_ascii_only
                .or(file.smtp.ascii_only)
                .unwrap_or(false),
            timeout_seconds: file.smtp.timeout_seconds.unwrap_or(batch.send_timeout_seconds),
        };

        let certificates_dir = self
            .certificates_dir
            .clone()
            .or_else(|| file.campaign.certificates_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Settings {
            batch,
            smtp,
            branding: Branding::new(event_name, organization_name),
            sources: self.sources(file),
            certificates_dir,
            report_path: self.report.clone(),
            failed_csv_path: self.failed_csv.clone(),
        }
    }

    /// 命令列給了任何來源檔，就取代 campaign 檔中的 groups
    fn sources(&self, file: CampaignFile) -> Vec<SourceSpec> {
        let cli_files: Vec<SourceSpec> = self
            .order
            .iter()
            .filter_map(|category| {
                let path = match category {
                    Category::Winner => self.winners.as_ref(),
                    Category::Participant => self.participants.as_ref(),
                    Category::Organizer => self.organizers.as_ref(),
                }?;
                Some(SourceSpec {
                    category: *category,
                    kind: SourceKind::File(path.clone()),
                })
            })
            .collect();

        if !cli_files.is_empty() {
            return cli_files;
        }

        file.groups
            .into_iter()
            .map(|group| SourceSpec {
                category: group.category,
                kind: match group.file {
                    Some(path) => SourceKind::File(PathBuf::from(path)),
                    None => SourceKind::Inline(group.recipients),
                },
            })
            .collect()
    }
}

fn pick(cli: &Option<String>, file: &Option<String>) -> Option<String> {
    cli.clone()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| file.clone().filter(|v| !v.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["cert-mailer"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_overrides_campaign_file() {
        let file = CampaignFile::from_toml_str(
            r#"
[campaign]
event_name = "MERN Workshop"

[pacing]
delay_between_emails = 10
max_batch_size = 20
"#,
        )
        .unwrap();

        let cli = parse(&[
            "--delay-between-emails",
            "3",
            "--winners",
            "winners.json",
            "--retry-on-encoding-error",
            "false",
        ]);
        let settings = cli.resolve_with(file);

        assert_eq!(settings.batch.per_email_delay_seconds, 3);
        assert_eq!(settings.batch.max_batch_size, 20);
        assert!(!settings.batch.retry_on_encoding_error);
        assert_eq!(settings.branding.event_name, "MERN Workshop");
        assert_eq!(settings.smtp.sender_name, "MERN Workshop Team");
        assert_eq!(settings.sources.len(), 1);
    }

    #[test]
    fn test_order_controls_cli_sources() {
        let cli = parse(&[
            "--winners",
            "w.csv",
            "--organizers",
            "o.json",
            "--participants",
            "p.csv",
            "--order",
            "organizer,winner,participant",
        ]);
        let settings = cli.resolve_with(CampaignFile::default());
        let categories: Vec<Category> = settings.sources.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![Category::Organizer, Category::Winner, Category::Participant]
        );
    }

    #[test]
    fn test_campaign_groups_used_without_cli_sources() {
        let file = CampaignFile::from_toml_str(
            r#"
[[groups]]
category = "participant"

[[groups.recipients]]
name = "Sahil Ansari"
email = "sahil@example.com"
"#,
        )
        .unwrap();
        let settings = parse(&[]).resolve_with(file);
        assert_eq!(settings.sources.len(), 1);
        assert!(matches!(&settings.sources[0].kind, SourceKind::Inline(r) if r.len() == 1));
    }

    #[test]
    fn test_defaults_applied() {
        let settings = parse(&["--dry-run"]).resolve_with(CampaignFile::default());
        assert_eq!(settings.smtp.server, DEFAULT_SMTP_SERVER);
        assert_eq!(settings.smtp.port, DEFAULT_SMTP_PORT);
        assert_eq!(settings.batch.per_email_delay_seconds, 30);
        assert_eq!(settings.batch.per_group_delay_seconds, 60);
        assert!(settings.batch.dry_run);
        assert_eq!(settings.branding.event_name, DEFAULT_EVENT_NAME);
    }

    #[test]
    fn test_boolean_env_flags_accept_boolish_values() {
        // 只有這個測試動到 DRY_RUN / DEBUG_MODE
        for (value, expected) in [("1", true), ("yes", true), ("on", true), ("0", false), ("no", false)] {
            std::env::set_var("DRY_RUN", value);
            std::env::set_var("DEBUG_MODE", value);
            let parsed = CliConfig::try_parse_from(["cert-mailer"]);
            std::env::remove_var("DRY_RUN");
            std::env::remove_var("DEBUG_MODE");

            let cli = parsed.unwrap_or_else(|e| panic!("DRY_RUN={} rejected: {}", value, e));
            assert_eq!(cli.dry_run, expected, "DRY_RUN={}", value);
            assert_eq!(cli.verbose, expected, "DEBUG_MODE={}", value);
        }
    }
}
