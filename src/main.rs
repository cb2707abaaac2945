//! usenet-ul command line entry point

mod cli;

use clap::Parser;
use cli::Cli;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use usenet_ul::config::read_raw_dump_dir;
use usenet_ul::pipeline::{EXIT_FAILURES, EXIT_FATAL, PipelineOptions};
use usenet_ul::{
    Config, Event, NyuuPoster, ParParGenerator, ResumeLedger, Result, RunReport, UploadPipeline,
    cancel_on_signal,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let code = match run(cli).await {
        Ok(report) => report.exit_code(),
        Err(e) => {
            error!(error = %e, "aborting");
            EXIT_FATAL
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<RunReport> {
    let config = Config::load(&cli.config)?;
    config.validate()?;
    config.ensure_dirs()?;

    let mode = cli.mode();
    let scope = cli.scope();
    let posting = config.posting_config(scope).to_path_buf();
    let raw_dump_dir = read_raw_dump_dir(&posting)?;

    let root = match &cli.path {
        Some(path) => std::path::absolute(path)?,
        None => PathBuf::new(),
    };
    // Receipt subdirectories are relative to the directory being uploaded
    let source_root = if root.is_file() {
        root.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        root.clone()
    };

    let work_dir = if mode.works_in_place() {
        None
    } else {
        config.work_dir().map(Path::to_path_buf)
    };
    let capture = !cli.debug;

    let generator = ParParGenerator::new(config.tools.parpar_path()?, config.tools.parpar_args.clone())
        .with_work_dir(work_dir.clone())
        .with_capture_output(capture);
    let poster = NyuuPoster::new(
        config.tools.nyuu_path()?,
        posting,
        source_root,
        config.output.nzb_output_path.clone(),
        scope,
    )
    .with_work_dir(work_dir)
    .with_bundle_naming(cli.bundles())
    .with_collision(config.output.receipt_collision)
    .with_capture_output(capture);

    let ledger = if cli.no_resume {
        ResumeLedger::disabled(config.resume_file())
    } else {
        ResumeLedger::new(config.resume_file())
    };

    let options = PipelineOptions {
        selection: cli.selection(&config),
        root,
        scope,
        mode,
        related_extensions: config.discovery.related_extensions.clone(),
        raw_dump_dir,
    };

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let (event_tx, _) = broadcast::channel(1000);
    let pipeline = UploadPipeline::new(
        event_tx,
        options,
        Arc::new(generator),
        Arc::new(poster),
        ledger,
    )
    .with_cancellation(cancel.clone());

    let events = pipeline.subscribe();
    let progress = tokio::spawn(print_progress(events));

    let report = pipeline.run().await;
    // Stops the signal task and, once the pipeline is dropped, the printer
    cancel.cancel();
    drop(pipeline);
    progress.await.ok();

    let report = report?;
    summarize(&report);
    Ok(report)
}

/// Operator-facing progress lines
async fn print_progress(mut events: broadcast::Receiver<Event>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            Event::ScanComplete {
                matched,
                non_empty,
                pending,
            } => println!("{matched} matched, {non_empty} with content, {pending} to upload"),
            Event::Skipped { name } => println!("already uploaded: {name}"),
            Event::Generating { name } => println!("generating parity: {name}"),
            Event::GenerateComplete {
                name,
                success: false,
                ..
            } => println!("parity generation failed: {name}"),
            Event::Uploading { name } => println!("uploading: {name}"),
            Event::UploadComplete { name, nzb, partial } => {
                let note = if partial { " (some articles skipped)" } else { "" };
                println!("uploaded: {name} -> {}{note}", nzb.display());
            }
            Event::UploadFailed { name, exit_code } => {
                println!("upload failed: {name} (exit code {exit_code:?})")
            }
            Event::RepostComplete { article, success } => {
                let result = if success { "reposted" } else { "repost failed" };
                println!("{result}: {article}");
            }
            Event::Cancelled { remaining } => {
                println!("stopped, {remaining} item(s) not attempted")
            }
            Event::GenerateComplete { .. } => {}
        }
    }
}

fn summarize(report: &RunReport) {
    for item in report.items.iter().filter(|i| i.outcome.is_failure()) {
        error!(item = %item.name, outcome = ?item.outcome, "failed");
    }
    for repost in report.reposts.iter().filter(|r| !r.success) {
        error!(article = ?repost.article, exit_code = ?repost.exit_code, "repost failed");
    }

    info!(
        status = ?report.status,
        uploaded = report.uploaded(),
        skipped = report.skipped(),
        failures = report.failures(),
        moved = report.moved.len(),
        cleared = report.cleared_articles,
        "done"
    );
    if report.exit_code() == EXIT_FAILURES {
        error!("some items failed and will be retried on the next run");
    }
}
