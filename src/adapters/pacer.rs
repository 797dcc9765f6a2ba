use crate::domain::ports::{Pacer, PauseKind, PauseOutcome};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Real pacing: sleeps on the tokio timer and wakes early on cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(
        &self,
        kind: PauseKind,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> PauseOutcome {
        if duration.is_zero() {
            return PauseOutcome::Completed;
        }
        tracing::debug!("Pausing {:?} ({:?})", duration, kind);
        tokio::select! {
            _ = tokio::time::sleep(duration) => PauseOutcome::Completed,
            _ = cancel.cancelled() => PauseOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_pause_completes() {
        let cancel = CancellationToken::new();
        let outcome = TokioPacer
            .pause(PauseKind::BetweenEmails, Duration::from_secs(30), &cancel)
            .await;
        assert_eq!(outcome, PauseOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_interrupted_by_cancel() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let outcome = TokioPacer
            .pause(PauseKind::BetweenGroups, Duration::from_secs(600), &cancel)
            .await;
        assert_eq!(outcome, PauseOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(600));
    }
}
