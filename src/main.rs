use cert_mailer::adapters::source::load_groups;
use cert_mailer::adapters::DisabledMailer;
use cert_mailer::app::report;
use cert_mailer::config::cli::LogFormat;
use cert_mailer::domain::ports::Mailer;
use cert_mailer::utils::error::CampaignError;
use cert_mailer::utils::{logger, validation::Validate};
use cert_mailer::{
    BatchController, CliConfig, HtmlRenderer, LocalCertificateStore, RecipientGroup, RunSummary,
    Settings, SmtpMailer, TokioPacer,
};
use clap::Parser;
use tokio_util::sync::CancellationToken;

const EXIT_CONFIG: i32 = 1;
const EXIT_FAILURES: i32 = 2;
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    // .env 先載入，clap 的 env fallback 才讀得到
    dotenv::dotenv().ok();

    let cli = CliConfig::parse();
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting cert-mailer");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let settings = match cli.resolve().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };

    let (groups, source_skips) = match load_groups(&settings.sources) {
        Ok(loaded) => loaded,
        Err(e) => exit_with(&e),
    };
    if groups.iter().all(RecipientGroup::is_empty) {
        exit_with(&CampaignError::NoRecipients);
    }

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupt received, finishing the current send and stopping...");
            signal_token.cancel();
        }
    });

    let mut summary = if settings.batch.dry_run {
        tracing::info!("🔍 DRY RUN mode: no emails will be sent");
        run(DisabledMailer, &settings, &groups, cancel).await
    } else {
        let mailer = match SmtpMailer::new(&settings.smtp) {
            Ok(mailer) => mailer,
            Err(e) => exit_with(&e),
        };
        run(mailer, &settings, &groups, cancel).await
    };
    summary.record_skips(source_skips);

    report::print_summary(&summary);

    if let Some(path) = &settings.report_path {
        if let Err(e) = report::write_json_report(path, &summary) {
            tracing::error!("❌ Could not write run report: {}", e);
        }
    }
    if let Some(path) = &settings.failed_csv_path {
        if !summary.failed.is_empty() {
            if let Err(e) = report::write_failed_csv(path, &summary.failed) {
                tracing::error!("❌ Could not write failed list: {}", e);
            }
        }
    }

    let code = if summary.cancelled {
        EXIT_CANCELLED
    } else if !summary.failed.is_empty() {
        EXIT_FAILURES
    } else {
        0
    };
    std::process::exit(code);
}

async fn run<M: Mailer>(
    mailer: M,
    settings: &Settings,
    groups: &[RecipientGroup],
    cancel: CancellationToken,
) -> RunSummary {
    let controller = BatchController::new(
        mailer,
        HtmlRenderer::new(settings.branding.clone()),
        LocalCertificateStore::new(settings.certificates_dir.clone()),
        TokioPacer,
        settings.batch.clone(),
        settings.branding.event_name.clone(),
    )
    .with_cancellation(cancel);

    controller.run_campaign(groups).await
}

fn exit_with(e: &CampaignError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(EXIT_CONFIG);
}
