use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 收件人類別，決定使用哪一份模板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Winner,
    Participant,
    Organizer,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Winner, Category::Participant, Category::Organizer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Winner => "winner",
            Category::Participant => "participant",
            Category::Organizer => "organizer",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winner" | "winners" => Ok(Category::Winner),
            "participant" | "participants" => Ok(Category::Participant),
            "organizer" | "organizers" | "organiser" | "organisers" => Ok(Category::Organizer),
            other => Err(format!(
                "unknown category '{}', expected winner, participant or organizer",
                other
            )),
        }
    }
}

/// Which parts of a message the encoding retry rewrites into ASCII-safe form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryScope {
    #[default]
    Subject,
    All,
}

impl FromStr for RetryScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subject" => Ok(RetryScope::Subject),
            "all" | "subject+body" | "body" => Ok(RetryScope::All),
            other => Err(format!(
                "unknown retry scope '{}', expected 'subject' or 'all'",
                other
            )),
        }
    }
}

// 接受單複數與大小寫變化，例如 "Organizers"
impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_position: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub event_stats: BTreeMap<String, serde_json::Value>,
}

impl Recipient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            certificate_path: None,
            rank_position: None,
            event_stats: BTreeMap::new(),
        }
    }

    pub fn with_certificate(mut self, path: impl Into<String>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    pub fn with_rank(mut self, rank: impl Into<String>) -> Self {
        self.rank_position = Some(rank.into());
        self
    }

    pub fn with_stat(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.event_stats.insert(key.into(), value);
        self
    }

    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }

    /// 以 email 作為身分識別（不分大小寫）
    pub fn identity(&self) -> String {
        self.email.trim().to_ascii_lowercase()
    }
}

/// 同一類別的一組收件人，依輸入順序寄送
#[derive(Debug, Clone, PartialEq)]
pub struct RecipientGroup {
    pub category: Category,
    pub recipients: Vec<Recipient>,
}

impl RecipientGroup {
    pub fn new(category: Category, recipients: Vec<Recipient>) -> Self {
        Self {
            category,
            recipients,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRecipient {
    pub name: String,
    pub email: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecipient {
    pub name: String,
    pub reason: String,
}

/// Terminal result of one attempted recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptOutcome {
    pub name: String,
    pub email: String,
    pub succeeded: bool,
    pub retried: bool,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 單一類別的寄送結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub category: Category,
    pub total: usize,
    pub attempted: usize,
    pub success_count: usize,
    pub failed: Vec<FailedRecipient>,
    pub skipped: Vec<SkippedRecipient>,
    pub outcomes: Vec<AttemptOutcome>,
    pub not_attempted: usize,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn new(category: Category, total: usize) -> Self {
        Self {
            category,
            total,
            attempted: 0,
            success_count: 0,
            failed: Vec::new(),
            skipped: Vec::new(),
            outcomes: Vec::new(),
            not_attempted: 0,
            cancelled: false,
        }
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// 整個 campaign 的彙總結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub dry_run: bool,
    pub reports: Vec<BatchReport>,
    pub total_attempted: usize,
    pub total_succeeded: usize,
    pub failed: Vec<FailedRecipient>,
    pub skipped: Vec<SkippedRecipient>,
    pub not_attempted: usize,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        let now = chrono::Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            dry_run,
            reports: Vec::new(),
            total_attempted: 0,
            total_succeeded: 0,
            failed: Vec::new(),
            skipped: Vec::new(),
            not_attempted: 0,
            cancelled: false,
        }
    }

    /// 併入一個類別的結果；失敗名單跨類別仍以 email 去重
    pub fn absorb(&mut self, report: BatchReport) {
        self.total_attempted += report.attempted;
        self.total_succeeded += report.success_count;
        for failure in &report.failed {
            let key = failure.email.trim().to_ascii_lowercase();
            if !self
                .failed
                .iter()
                .any(|f| f.email.trim().to_ascii_lowercase() == key)
            {
                self.failed.push(failure.clone());
            }
        }
        self.skipped.extend(report.skipped.iter().cloned());
        self.not_attempted += report.not_attempted;
        self.cancelled |= report.cancelled;
        self.reports.push(report);
    }

    /// Records rejected before they reached the controller (e.g. by a source loader).
    pub fn record_skips(&mut self, skipped: impl IntoIterator<Item = SkippedRecipient>) {
        self.skipped.extend(skipped);
    }

    pub fn finish(&mut self) {
        self.finished_at = chrono::Utc::now();
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_attempted == 0 {
            return 0.0;
        }
        self.total_succeeded as f64 / self.total_attempted as f64 * 100.0
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}
