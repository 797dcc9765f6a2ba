use crate::domain::model::{FailedRecipient, RunSummary};
use crate::utils::error::Result;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Console summary printed after the campaign.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let total = summary.total_attempted;
    let elapsed = (summary.finished_at - summary.started_at).num_seconds().max(0);

    let _ = writeln!(out, "{}", "=".repeat(60));
    if summary.dry_run {
        let _ = writeln!(out, "🔍 DRY RUN COMPLETE (no emails were sent)");
    } else {
        let _ = writeln!(out, "📊 EMAIL CAMPAIGN COMPLETE");
    }
    let _ = writeln!(out, "{}", "=".repeat(60));

    for report in &summary.reports {
        let _ = writeln!(
            out,
            "[{}] {}/{} sent, {} failed, {} skipped",
            report.category,
            report.success_count,
            report.attempted,
            report.failure_count(),
            report.skipped.len()
        );
    }

    let _ = writeln!(out, "📧 Total attempted: {}", total);
    let _ = writeln!(out, "✅ Successfully sent: {}", summary.total_succeeded);
    let _ = writeln!(out, "❌ Failed to send: {}", summary.failed.len());
    let _ = writeln!(out, "📈 Success rate: {:.1}%", summary.success_rate());
    let _ = writeln!(out, "⏱️ Duration: {}m {}s", elapsed / 60, elapsed % 60);

    if summary.cancelled {
        let _ = writeln!(
            out,
            "\n🛑 [CANCELLED] Run stopped early, {} recipient(s) not attempted",
            summary.not_attempted
        );
    }

    if !summary.skipped.is_empty() {
        let _ = writeln!(out, "\n⚠️ [SKIPPED] {} record(s):", summary.skipped.len());
        for skipped in &summary.skipped {
            let _ = writeln!(out, "   - {}: {}", skipped.name, skipped.reason);
        }
    }

    if !summary.failed.is_empty() {
        let _ = writeln!(
            out,
            "\n🚨 [FAILED EMAILS SUMMARY] {} emails need attention:",
            summary.failed.len()
        );
        let _ = writeln!(out, "{}", "-".repeat(60));
        for (i, failed) in summary.failed.iter().enumerate() {
            let _ = writeln!(out, "{}. Name: {}", i + 1, failed.name);
            let _ = writeln!(out, "   Email: {}", failed.email);
            let _ = writeln!(out, "   Error: {}", failed.error);
        }
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(
            out,
            "💡 [RETRY SUGGESTION] Re-run with the failed list (--failed-csv) as the source, or send these manually."
        );
    } else if !summary.cancelled && total > 0 {
        let _ = writeln!(
            out,
            "\n🎉 [PERFECT SUCCESS] All {} emails sent successfully!",
            total
        );
    }

    out
}

pub fn print_summary(summary: &RunSummary) {
    println!("{}", render_summary(summary));
}

/// Full run report as pretty JSON.
pub fn write_json_report(path: &Path, summary: &RunSummary) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    tracing::info!("📁 Run report saved to: {}", path.display());
    Ok(())
}

/// 失敗名單輸出成 CSV（name,email,error），可直接當作下一次的來源檔
pub fn write_failed_csv(path: &Path, failed: &[FailedRecipient]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["name", "email", "error"])?;
    for failure in failed {
        writer.write_record([&failure.name, &failure.email, &failure.error])?;
    }
    writer.flush()?;
    tracing::info!(
        "📁 {} failed recipient(s) saved to: {}",
        failed.len(),
        path.display()
    );
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
