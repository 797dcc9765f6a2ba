use crate::config::BatchConfig;
use crate::core::attachment::{describe_attachment, load_attachment};
use crate::domain::model::{
    AttemptOutcome, BatchReport, Category, FailedRecipient, Recipient, SkippedRecipient,
};
use crate::domain::ports::{
    CertificateStore, Mailer, OutgoingEmail, Pacer, PauseKind, PauseOutcome, Renderer, SendError,
};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Drives one send attempt per recipient with pacing, chunking, the
/// encoding retry and failure bookkeeping. Sends are strictly sequential.
pub struct BatchController<M: Mailer, R: Renderer, S: CertificateStore, P: Pacer> {
    mailer: M,
    renderer: R,
    store: S,
    pacer: P,
    config: BatchConfig,
    event_name: String,
    cancel: CancellationToken,
}

impl<M: Mailer, R: Renderer, S: CertificateStore, P: Pacer> BatchController<M, R, S, P> {
    pub fn new(
        mailer: M,
        renderer: R,
        store: S,
        pacer: P,
        config: BatchConfig,
        event_name: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            renderer,
            store,
            pacer,
            config,
            event_name: event_name.into(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Sends one category. Recipients are attempted in input order; the
    /// returned report holds the success count, the de-duplicated failure
    /// list and the skip log.
    pub async fn run(&self, category: Category, recipients: &[Recipient]) -> BatchReport {
        let total = recipients.len();
        let mut report = BatchReport::new(category, total);
        if total == 0 {
            return report;
        }

        let chunk_size = self.config.max_batch_size.max(1);
        let chunk_count = total.div_ceil(chunk_size);
        let estimate = estimated_seconds(&self.config, total, chunk_count);

        tracing::info!("📨 Starting batch email send for {}s...", category);
        tracing::info!(
            "📊 Total emails to send: {} in {} batch(es) of up to {}",
            total,
            chunk_count,
            chunk_size
        );
        tracing::info!(
            "⏱️ Estimated time: {} seconds ({} minutes {} seconds)",
            estimate,
            estimate / 60,
            estimate % 60
        );

        let mut failed_identities: HashSet<String> = HashSet::new();

        'chunks: for (chunk_index, chunk) in recipients.chunks(chunk_size).enumerate() {
            let chunk_start = chunk_index * chunk_size;

            if chunk_index > 0 {
                tracing::info!(
                    "⏰ Batch {}/{} finished, waiting {} seconds before the next batch...",
                    chunk_index,
                    chunk_count,
                    self.config.per_group_delay_seconds
                );
                let outcome = self
                    .pause(PauseKind::BetweenChunks, self.config.per_group_delay())
                    .await;
                if outcome == PauseOutcome::Cancelled {
                    report.cancelled = true;
                    report.not_attempted = total - chunk_start;
                    break 'chunks;
                }
            }

            for (offset, recipient) in chunk.iter().enumerate() {
                let position = chunk_start + offset;

                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    report.not_attempted = total - position;
                    break 'chunks;
                }

                if !recipient.has_email() {
                    tracing::warn!("⚠️ [SKIP] Missing email for {}, skipping.", recipient.name);
                    report.skipped.push(SkippedRecipient {
                        name: recipient.name.clone(),
                        reason: "missing email".to_string(),
                    });
                    continue;
                }

                let Some(outcome) = self.attempt(category, recipient).await else {
                    tracing::warn!(
                        "🛑 Cancelled before the ASCII-safe retry for {}, not counted as a failure",
                        recipient.name
                    );
                    report.cancelled = true;
                    report.not_attempted = total - position;
                    break 'chunks;
                };
                report.attempted += 1;

                let succeeded = outcome.succeeded;
                if succeeded {
                    report.success_count += 1;
                    tracing::info!(
                        "✅ [PROGRESS] {}/{} emails sent successfully{}",
                        position + 1,
                        total,
                        if outcome.retried { " (retry)" } else { "" }
                    );
                } else {
                    let error = outcome.error.clone().unwrap_or_default();
                    tracing::error!("❌ Failed to send to {}: {}", recipient.name, error);
                    if failed_identities.insert(recipient.identity()) {
                        report.failed.push(FailedRecipient {
                            name: recipient.name.clone(),
                            email: recipient.email.trim().to_string(),
                            error,
                        });
                    }
                }
                report.outcomes.push(outcome);

                if succeeded && position + 1 < total {
                    tracing::info!(
                        "⏳ [WAIT] Waiting {} seconds before next email...",
                        self.config.per_email_delay_seconds
                    );
                    let pause = self
                        .pause(PauseKind::BetweenEmails, self.config.per_email_delay())
                        .await;
                    if pause == PauseOutcome::Cancelled {
                        report.cancelled = true;
                        report.not_attempted = total - position - 1;
                        break 'chunks;
                    }
                }
            }
        }

        if report.cancelled {
            tracing::warn!(
                "🛑 {} batch cancelled, {} recipient(s) not attempted",
                category,
                report.not_attempted
            );
        }
        tracing::info!(
            "📋 [SUMMARY] {}/{} {} emails sent successfully",
            report.success_count,
            report.attempted,
            category
        );

        report
    }

    /// Pacing pause shared by the email, chunk and group boundaries.
    pub(crate) async fn pause(&self, kind: PauseKind, duration: Duration) -> PauseOutcome {
        if self.cancel.is_cancelled() {
            return PauseOutcome::Cancelled;
        }
        if self.config.dry_run {
            tracing::debug!("[DRY RUN] Skipping {:?} pause of {:?}", kind, duration);
            return PauseOutcome::Completed;
        }
        self.pacer.pause(kind, duration, &self.cancel).await
    }

    /// `None` when the run was cancelled before a pending encoding retry could
    /// go out; the recipient then counts as not attempted.
    async fn attempt(&self, category: Category, recipient: &Recipient) -> Option<AttemptOutcome> {
        let rendered = self.renderer.render(category, recipient);
        let email_address = recipient.email.trim().to_string();

        if self.config.dry_run {
            let attachment = describe_attachment(&self.store, &self.event_name, recipient).await;
            tracing::info!(
                "🔍 [DRY RUN] Would send '{}' to {} <{}> (attachment: {})",
                rendered.subject,
                recipient.name,
                email_address,
                attachment
            );
            return Some(AttemptOutcome {
                name: recipient.name.clone(),
                email: email_address,
                succeeded: true,
                retried: false,
                dry_run: true,
                error: None,
            });
        }

        let mut email = OutgoingEmail {
            to_name: recipient.name.clone(),
            to_email: email_address.clone(),
            subject: rendered.subject.clone(),
            html_body: rendered.html.clone(),
            attachment: load_attachment(&self.store, &self.event_name, recipient).await,
        };

        let outcome = |succeeded: bool, retried: bool, error: Option<String>| {
            Some(AttemptOutcome {
                name: recipient.name.clone(),
                email: email_address.clone(),
                succeeded,
                retried,
                dry_run: false,
                error,
            })
        };

        let first_error = match self.deliver(&email).await {
            Ok(()) => {
                tracing::info!("📤 Email sent to {} ({})", recipient.name, email_address);
                return outcome(true, false, None);
            }
            Err(e) => e,
        };

        let retries = self.config.encoding_retries();
        if !first_error.is_encoding() || retries == 0 {
            return outcome(false, false, Some(first_error.to_string()));
        }

        tracing::warn!(
            "⚠️ Encoding error for {}: {}; retrying with ASCII-safe content ({:?})",
            recipient.name,
            first_error,
            self.config.retry_scope
        );
        let safe = rendered.ascii_safe(self.config.retry_scope);
        email.subject = safe.subject;
        email.html_body = safe.html;

        let mut last_error = String::from("retry not attempted");
        for attempt in 1..=retries {
            if self.cancel.is_cancelled() {
                if attempt == 1 {
                    return None;
                }
                last_error = format!("{}; run cancelled before further retries", last_error);
                break;
            }
            match self.deliver(&email).await {
                Ok(()) => {
                    tracing::info!(
                        "📤 Email sent to {} ({}) on retry {}",
                        recipient.name,
                        email_address,
                        attempt
                    );
                    return outcome(true, true, None);
                }
                Err(e) => {
                    tracing::warn!("Retry {}/{} for {} failed: {}", attempt, retries, recipient.name, e);
                    last_error = e.to_string();
                }
            }
        }

        outcome(
            false,
            true,
            Some(format!("{}; ASCII-safe retry failed: {}", first_error, last_error)),
        )
    }

    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), SendError> {
        let limit = self.config.send_timeout();
        match tokio::time::timeout(limit, self.mailer.send(email)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Timeout(limit)),
        }
    }
}

/// Pacing time the batch will spend, saturating on very large delays.
fn estimated_seconds(config: &BatchConfig, total: usize, chunk_count: usize) -> u64 {
    let email_pauses = (total as u64).saturating_sub(1);
    let chunk_pauses = (chunk_count as u64).saturating_sub(1);
    config
        .per_email_delay_seconds
        .saturating_mul(email_pauses)
        .saturating_add(config.per_group_delay_seconds.saturating_mul(chunk_pauses))
}
