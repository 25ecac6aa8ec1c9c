use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cardiregen_application::{AnalysisOrchestrator, AnalysisService, StatusUpdate};
use cardiregen_core::config::AppConfig;
use cardiregen_core::phase::Phase;
use cardiregen_core::report::ClinicalReport;
use cardiregen_core::session::{Session, SessionStatus};
use cardiregen_infrastructure::load_frame;
use cardiregen_interaction::HttpFrameSubmitter;
use clap::Args;
use colored::Colorize;
use tokio::sync::mpsc;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Analysis service base URL (e.g. the ngrok URL of the Colab backend)
    #[arg(long)]
    endpoint: Option<String>,

    /// End-diastole frame (.nii / .nii.gz)
    #[arg(long)]
    ed: Option<PathBuf>,

    /// End-systole frame (.nii / .nii.gz)
    #[arg(long)]
    es: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: AnalyzeArgs, config: &AppConfig) -> Result<ExitCode> {
    let endpoint = args
        .endpoint
        .or_else(|| config.endpoint.clone())
        .unwrap_or_default();
    let timeout = Duration::from_secs(args.timeout_secs.unwrap_or(config.request_timeout_secs));

    let submitter = Arc::new(HttpFrameSubmitter::new().with_timeout(timeout));
    let (status_tx, mut status_rx) = mpsc::unbounded_channel::<StatusUpdate>();
    let orchestrator = AnalysisOrchestrator::new(submitter).with_status_channel(status_tx);
    let service = AnalysisService::new(Session::new(&endpoint), orchestrator);

    for (phase, path) in [(Phase::Ed, args.ed), (Phase::Es, args.es)] {
        if let Some(path) = path {
            let blob = load_frame(&path)
                .await
                .with_context(|| format!("Failed to load {phase} frame from {}", path.display()))?;
            service.select_frame(phase, blob).await;
        }
    }

    let quiet = args.json;
    let progress = tokio::spawn(async move {
        while let Some(update) = status_rx.recv().await {
            if !quiet && update.status.is_running() {
                eprintln!("{}", update.status.describe().cyan());
            }
        }
    });

    let session = service.run().await?;
    let report = ClinicalReport::from_session(&session);
    // Dropping the service closes the status channel.
    drop(service);
    progress.await.context("Progress reporter panicked")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    match &session.status {
        SessionStatus::Failed(reason) => {
            eprintln!("{} {}", "Error:".red().bold(), reason);
            Ok(ExitCode::FAILURE)
        }
        _ => {
            if !args.json {
                eprintln!("{}", "Analysis complete".green().bold());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
