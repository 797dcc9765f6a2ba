use crate::domain::model::Recipient;
use crate::domain::ports::{Attachment, CertificateStore};
use std::path::Path;

/// `{Name}_{Event}_Certificate.{ext}`，空白換成底線
pub fn certificate_filename(recipient_name: &str, event_name: &str, path: &str) -> String {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "pdf".to_string());
    format!(
        "{}_{}_Certificate.{}",
        underscored(recipient_name),
        underscored(event_name),
        extension
    )
}

fn underscored(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("_")
}

pub fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Loads the recipient's certificate. A missing or unreadable file is logged
/// and the email goes out without an attachment.
pub async fn load_attachment<S: CertificateStore>(
    store: &S,
    event_name: &str,
    recipient: &Recipient,
) -> Option<Attachment> {
    let path = recipient.certificate_path.as_deref()?;

    if !store.exists(path).await {
        tracing::warn!("⚠️ Certificate file not found: {}", path);
        return None;
    }

    match store.read_file(path).await {
        Ok(bytes) => {
            let filename = certificate_filename(&recipient.name, event_name, path);
            tracing::debug!("Certificate attached: {} ({} bytes)", filename, bytes.len());
            Some(Attachment {
                filename,
                content_type: content_type_for(path).to_string(),
                bytes,
            })
        }
        Err(e) => {
            tracing::error!("❌ Error reading certificate {}: {}", path, e);
            None
        }
    }
}

/// Attachment name for the dry-run audit line, without reading the file.
pub async fn describe_attachment<S: CertificateStore>(
    store: &S,
    event_name: &str,
    recipient: &Recipient,
) -> String {
    match recipient.certificate_path.as_deref() {
        None => "none".to_string(),
        Some(path) if store.exists(path).await => {
            certificate_filename(&recipient.name, event_name, path)
        }
        Some(path) => format!("missing ({})", path),
    }
}
