use crate::config::{SourceKind, SourceSpec};
use crate::domain::model::{Recipient, RecipientGroup, SkippedRecipient};
use crate::utils::error::{CampaignError, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// 來源載入結果：可寄送的收件人與被過濾掉的紀錄
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRecipients {
    pub recipients: Vec<Recipient>,
    pub skipped: Vec<SkippedRecipient>,
}

impl LoadedRecipients {
    fn push(&mut self, record: Recipient, source_name: &str) {
        let name = record.name.trim().to_string();
        let email = record.email.trim().to_string();

        let reason = match (name.is_empty(), email.is_empty()) {
            (true, true) => Some("missing name and email"),
            (true, false) => Some("missing name"),
            (false, true) => Some("missing email"),
            (false, false) => None,
        };

        if let Some(reason) = reason {
            let label = if name.is_empty() { email.clone() } else { name.clone() };
            tracing::warn!("⚠️ [SKIP] {} in {}: {}", label, source_name, reason);
            self.skipped.push(SkippedRecipient {
                name: label,
                reason: format!("{} ({})", reason, source_name),
            });
            return;
        }

        self.recipients.push(Recipient {
            name,
            email,
            certificate_path: record
                .certificate_path
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            rank_position: record
                .rank_position
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            event_stats: record.event_stats,
        });
    }
}

/// Loads one configured source. A missing file is logged and yields nothing.
pub fn load_source(spec: &SourceSpec) -> Result<LoadedRecipients> {
    match &spec.kind {
        SourceKind::Inline(records) => Ok(sanitize(records.clone(), "inline list")),
        SourceKind::File(path) => {
            if !path.exists() {
                tracing::error!(
                    "❌ {} file {} not found, skipping this group",
                    spec.category,
                    path.display()
                );
                return Ok(LoadedRecipients::default());
            }
            let loaded = load_file(path)?;
            tracing::info!(
                "📥 Loaded {} {} recipient(s) from {} ({} skipped)",
                loaded.recipients.len(),
                spec.category,
                path.display(),
                loaded.skipped.len()
            );
            Ok(loaded)
        }
    }
}

/// Loads every source into one group per entry, keeping configured order.
pub fn load_groups(specs: &[SourceSpec]) -> Result<(Vec<RecipientGroup>, Vec<SkippedRecipient>)> {
    let mut groups = Vec::with_capacity(specs.len());
    let mut skipped = Vec::new();
    for spec in specs {
        let loaded = load_source(spec)?;
        skipped.extend(loaded.skipped);
        groups.push(RecipientGroup::new(spec.category, loaded.recipients));
    }
    Ok((groups, skipped))
}

pub fn load_file(path: &Path) -> Result<LoadedRecipients> {
    let source_name = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => {
            let content = std::fs::read_to_string(path)?;
            from_json_str(&content, &source_name)
        }
        Some("csv") => {
            let file = std::fs::File::open(path)?;
            from_csv_reader(file, &source_name)
        }
        _ => Err(CampaignError::SourceError {
            source_name,
            message: "expected a .csv or .json file".to_string(),
        }),
    }
}

pub fn sanitize(records: Vec<Recipient>, source_name: &str) -> LoadedRecipients {
    let mut loaded = LoadedRecipients::default();
    for record in records {
        loaded.push(record, source_name);
    }
    loaded
}

/// JSON 格式：物件陣列，欄位同 `Recipient`
pub fn from_json_str(content: &str, source_name: &str) -> Result<LoadedRecipients> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => {
            return Err(CampaignError::SourceError {
                source_name: source_name.to_string(),
                message: "top-level JSON value must be an array of recipients".to_string(),
            })
        }
    };

    let mut loaded = LoadedRecipients::default();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Recipient>(item) {
            Ok(record) => loaded.push(record, source_name),
            Err(e) => {
                tracing::warn!("⚠️ [SKIP] record #{} in {}: {}", index + 1, source_name, e);
                loaded.skipped.push(SkippedRecipient {
                    name: format!("record #{}", index + 1),
                    reason: format!("malformed record ({}): {}", source_name, e),
                });
            }
        }
    }
    Ok(loaded)
}

/// CSV 格式：需有 name、email 欄位，其他未知欄位放進 event_stats
pub fn from_csv_reader<R: Read>(reader: R, source_name: &str) -> Result<LoadedRecipients> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    for required in ["name", "email"] {
        if !headers.iter().any(|h| h == required) {
            return Err(CampaignError::SourceError {
                source_name: source_name.to_string(),
                message: format!("missing required column '{}'", required),
            });
        }
    }

    let mut loaded = LoadedRecipients::default();
    for row in csv_reader.records() {
        let row = row?;
        let mut record = Recipient::new("", "");
        let mut stats = BTreeMap::new();

        for (header, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            match header.as_str() {
                "name" => record.name = cell.to_string(),
                "email" => record.email = cell.to_string(),
                "certificate_path" | "certificate" => {
                    record.certificate_path = Some(cell.to_string())
                }
                "rank_position" | "rank" => record.rank_position = Some(cell.to_string()),
                other => {
                    stats.insert(other.to_string(), stat_value(cell));
                }
            }
        }

        record.event_stats = stats;
        loaded.push(record, source_name);
    }
    Ok(loaded)
}

fn stat_value(cell: &str) -> serde_json::Value {
    if let Ok(n) = cell.parse::<i64>() {
        return serde_json::Value::from(n);
    }
    if let Ok(f) = cell.parse::<f64>() {
        if f.is_finite() {
            return serde_json::Value::from(f);
        }
    }
    serde_json::Value::String(cell.to_string())
}
