use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;
use scanreport::config::ScanConfig;
use scanreport::models::report::Report;
use scanreport::parsers::ParserRegistry;
use scanreport::services::orchestrator::ReportOrchestrator;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Per-directory entry in the JSON written to stdout.
#[derive(Debug, Serialize)]
struct RootOutcome {
    root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the reports; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "scanreport=info".into()))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let config = ScanConfig::from_env().context("REPORT_DIRS is not set")?;
    if config.report_dirs.is_empty() {
        anyhow::bail!("REPORT_DIRS must list at least one directory");
    }

    let options = config.parse_options();
    let orchestrator = ReportOrchestrator::new(Arc::new(ParserRegistry::default()));
    tracing::info!(
        roots = config.report_dirs.len(),
        adapters = orchestrator.registry().len(),
        tools = ?orchestrator.registry(),
        "Starting report normalization"
    );

    let mut tasks = tokio::task::JoinSet::new();
    for (index, root) in config.report_dirs.iter().cloned().enumerate() {
        let orchestrator = orchestrator.clone();
        let options = options.clone();
        tasks.spawn_blocking(move || {
            let result = orchestrator.parse(&root, &options);
            (index, root, result)
        });
    }

    let mut outcomes = Vec::with_capacity(config.report_dirs.len());
    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        let (index, root, result) = joined.context("Report normalization task panicked")?;
        let outcome = match result {
            Ok(report) => RootOutcome {
                root,
                report: Some(report),
                error: None,
            },
            Err(e) => {
                tracing::error!(root = %root.display(), error = %e, "Report normalization failed");
                failed += 1;
                RootOutcome {
                    root,
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push((index, outcome));
    }

    outcomes.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<RootOutcome> = outcomes.into_iter().map(|(_, outcome)| outcome).collect();
    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    if failed > 0 {
        anyhow::bail!("{failed} of {} report directories failed", outcomes.len());
    }
    Ok(())
}
