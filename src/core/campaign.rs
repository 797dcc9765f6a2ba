use crate::core::controller::BatchController;
use crate::domain::model::{RecipientGroup, RunSummary};
use crate::domain::ports::{CertificateStore, Mailer, Pacer, PauseKind, PauseOutcome, Renderer};

impl<M: Mailer, R: Renderer, S: CertificateStore, P: Pacer> BatchController<M, R, S, P> {
    /// Sends every group in the given order. Empty groups are skipped without
    /// a pause; non-empty groups are separated by the group delay.
    pub async fn run_campaign(&self, groups: &[RecipientGroup]) -> RunSummary {
        let mut summary = RunSummary::new(self.config().dry_run);
        let active: Vec<&RecipientGroup> = groups.iter().filter(|g| !g.is_empty()).collect();

        for group in groups.iter().filter(|g| g.is_empty()) {
            tracing::info!("No {} recipients, skipping this group", group.category);
        }

        tracing::info!(
            "🚀 Starting campaign: {} group(s), {} recipient(s){}",
            active.len(),
            active.iter().map(|g| g.recipients.len()).sum::<usize>(),
            if self.config().dry_run { " [DRY RUN]" } else { "" }
        );

        for (index, group) in active.iter().enumerate() {
            if index > 0 {
                tracing::info!(
                    "⏰ Waiting {} seconds before sending {} emails...",
                    self.config().per_group_delay_seconds,
                    group.category
                );
                let outcome = self
                    .pause(PauseKind::BetweenGroups, self.config().per_group_delay())
                    .await;
                if outcome == PauseOutcome::Cancelled {
                    stop_remaining(&mut summary, &active[index..]);
                    break;
                }
            }

            let report = self.run(group.category, &group.recipients).await;
            let cancelled = report.cancelled;
            summary.absorb(report);

            if cancelled {
                stop_remaining(&mut summary, &active[index + 1..]);
                break;
            }
        }

        summary.finish();
        tracing::info!(
            "🏁 Campaign finished: {}/{} sent, {} failed, {} skipped",
            summary.total_succeeded,
            summary.total_attempted,
            summary.failed.len(),
            summary.skipped.len()
        );
        summary
    }
}

fn stop_remaining(summary: &mut RunSummary, remaining: &[&RecipientGroup]) {
    let untouched: usize = remaining.iter().map(|g| g.recipients.len()).sum();
    summary.not_attempted += untouched;
    summary.cancelled = true;
    tracing::warn!(
        "🛑 Campaign cancelled, {} recipient(s) in later groups not attempted",
        untouched
    );
}

#[cfg(test)]
mod tests {
    use crate::core::controller::tests::{
        controller, recipients, test_config, MockMailer, MockStore, RecordingPacer,
    };
    use crate::domain::model::{Category, Recipient, RecipientGroup};
    use crate::domain::ports::{PauseKind, SendError};
    use std::time::Duration;

    #[tokio::test]
    async fn test_groups_run_in_caller_order_with_group_pauses() {
        let mailer = MockMailer::new();
        let pacer = RecordingPacer::default();
        let c = controller(mailer.clone(), pacer.clone(), MockStore::default(), test_config());
        let groups = vec![
            RecipientGroup::new(Category::Organizer, vec![Recipient::new("O", "o@x.com")]),
            RecipientGroup::new(Category::Winner, vec![Recipient::new("W", "w@x.com")]),
            RecipientGroup::new(Category::Participant, vec![Recipient::new("P", "p@x.com")]),
        ];

        let summary = c.run_campaign(&groups).await;

        assert_eq!(mailer.calls().await, vec!["o@x.com", "w@x.com", "p@x.com"]);
        assert_eq!(summary.total_succeeded, 3);
        assert_eq!(summary.reports.len(), 3);
        assert_eq!(pacer.count(PauseKind::BetweenGroups).await, 2);
        assert!(pacer
            .pauses()
            .await
            .iter()
            .filter(|(k, _)| *k == PauseKind::BetweenGroups)
            .all(|(_, d)| *d == Duration::from_secs(60)));
        assert!(summary.is_clean());
    }

    #[tokio::test]
    async fn test_empty_groups_skipped_without_pause() {
        let pacer = RecordingPacer::default();
        let c = controller(MockMailer::new(), pacer.clone(), MockStore::default(), test_config());
        let groups = vec![
            RecipientGroup::new(Category::Winner, vec![]),
            RecipientGroup::new(Category::Participant, recipients(2)),
            RecipientGroup::new(Category::Organizer, vec![]),
        ];

        let summary = c.run_campaign(&groups).await;

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.total_succeeded, 2);
        assert_eq!(pacer.count(PauseKind::BetweenGroups).await, 0);
    }

    #[tokio::test]
    async fn test_mixed_outcome_scenario() {
        // A 成功、B 缺 email、C 寄送失敗
        let mailer = MockMailer::new().failing(
            "c@example.com",
            SendError::Delivery("550 no such user".to_string()),
        );
        let pacer = RecordingPacer::default();
        let c = controller(mailer.clone(), pacer.clone(), MockStore::default(), test_config());
        let groups = vec![RecipientGroup::new(
            Category::Participant,
            vec![
                Recipient::new("A", "a@example.com"),
                Recipient::new("B", ""),
                Recipient::new("C", "c@example.com"),
            ],
        )];

        let summary = c.run_campaign(&groups).await;

        assert_eq!(summary.total_succeeded, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].name, "C");
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].name, "B");
        assert_eq!(pacer.count(PauseKind::BetweenEmails).await, 1);
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn test_failures_deduplicated_across_groups() {
        let mailer = MockMailer::new().failing(
            "same@example.com",
            SendError::Delivery("rejected".to_string()),
        );
        let c = controller(mailer, RecordingPacer::default(), MockStore::default(), test_config());
        let groups = vec![
            RecipientGroup::new(Category::Winner, vec![Recipient::new("S", "same@example.com")]),
            RecipientGroup::new(
                Category::Participant,
                vec![Recipient::new("S", "same@example.com")],
            ),
        ];

        let summary = c.run_campaign(&groups).await;
        assert_eq!(summary.total_attempted, 2);
        assert_eq!(summary.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_between_groups_counts_remaining() {
        let c = controller(
            MockMailer::new(),
            RecordingPacer::default(),
            MockStore::default(),
            test_config(),
        );
        let groups = vec![
            RecipientGroup::new(Category::Winner, recipients(2)),
            RecipientGroup::new(Category::Participant, recipients(3)),
        ];
        c.cancellation_token().cancel();

        let summary = c.run_campaign(&groups).await;

        assert!(summary.cancelled);
        assert_eq!(summary.total_attempted, 0);
        assert_eq!(summary.not_attempted, 5);
    }

    #[tokio::test]
    async fn test_dry_run_campaign() {
        let mailer = MockMailer::new();
        let pacer = RecordingPacer::default();
        let mut config = test_config();
        config.dry_run = true;
        let c = controller(mailer.clone(), pacer.clone(), MockStore::default(), config);
        let groups = vec![
            RecipientGroup::new(Category::Winner, recipients(3)),
            RecipientGroup::new(Category::Participant, recipients(7)),
        ];

        let summary = c.run_campaign(&groups).await;

        assert!(summary.dry_run);
        assert_eq!(summary.total_succeeded, 10);
        assert!(mailer.calls().await.is_empty());
        assert!(pacer.pauses().await.is_empty());
        assert!(summary.finished_at >= summary.started_at);
    }
}
