use super::*;
use crate::error::Error;
use crate::types::{NamingMode, ProcessOutput};
use crate::upload::{RawOutput, UploadReceipt};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Shared record of every tool call, in order
#[derive(Default)]
struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

fn output(code: i32) -> ProcessOutput {
    ProcessOutput {
        args: vec!["fake".into()],
        exit_code: Some(code),
        stdout: Some(String::new()),
        stderr: Some(String::new()),
    }
}

struct FakeGenerator {
    log: Arc<CallLog>,
    scratch: PathBuf,
    fail: HashSet<String>,
    spawn_error: HashSet<String>,
    cancel_on_call: Option<CancellationToken>,
}

impl FakeGenerator {
    fn new(log: Arc<CallLog>, scratch: &Path) -> Self {
        Self {
            log,
            scratch: scratch.to_path_buf(),
            fail: HashSet::new(),
            spawn_error: HashSet::new(),
            cancel_on_call: None,
        }
    }
}

#[async_trait]
impl ParityGenerator for FakeGenerator {
    async fn generate(
        &self,
        item: &WorkItem,
        _related: &[PathBuf],
    ) -> crate::Result<ParityArtifactSet> {
        let name = item.name();
        self.log.push(format!("generate:{name}"));
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        if self.spawn_error.contains(&name) {
            return Err(Error::ExternalTool("Failed to execute parpar".into()));
        }

        fs::create_dir_all(&self.scratch).unwrap();
        let par2 = self.scratch.join(format!("{name}.par2"));
        fs::write(&par2, b"par2").unwrap();
        let success = !self.fail.contains(&name);

        Ok(ParityArtifactSet {
            parity_files: vec![par2],
            naming_mode: NamingMode::for_kind(item.kind()),
            base_path: item.path().parent().unwrap().to_path_buf(),
            success,
            output: output(if success { 0 } else { 1 }),
        })
    }

    fn name(&self) -> &'static str {
        "fake-parity"
    }
}

struct FakePoster {
    log: Arc<CallLog>,
    out: PathBuf,
    exit_codes: HashMap<String, i32>,
    repost_fail: HashSet<String>,
}

impl FakePoster {
    fn new(log: Arc<CallLog>, out: &Path) -> Self {
        Self {
            log,
            out: out.to_path_buf(),
            exit_codes: HashMap::new(),
            repost_fail: HashSet::new(),
        }
    }
}

#[async_trait]
impl Poster for FakePoster {
    async fn upload(
        &self,
        item: &WorkItem,
        parity_files: &[PathBuf],
        related: &[PathBuf],
    ) -> crate::Result<UploadReceipt> {
        let name = item.name();
        self.log.push(format!(
            "upload:{name}:parity={}:related={}",
            parity_files.len(),
            related.len()
        ));

        let code = self.exit_codes.get(&name).copied().unwrap_or(0);
        let status = UploadStatus::from_exit_code(Some(code));
        if !status.is_success() {
            return Ok(UploadReceipt {
                nzb: None,
                status,
                output: output(code),
            });
        }

        fs::create_dir_all(&self.out).unwrap();
        let nzb = self.out.join(format!("{name}.nzb"));
        fs::write(&nzb, b"<nzb/>").unwrap();
        for file in parity_files {
            fs::remove_file(file).ok();
        }

        Ok(UploadReceipt {
            nzb: Some(nzb),
            status,
            output: output(code),
        })
    }

    async fn repost_raw(&self, article: &Path) -> crate::Result<RawOutput> {
        let name = article.file_name().unwrap().to_string_lossy().into_owned();
        self.log.push(format!("repost:{name}"));

        let code = if self.repost_fail.contains(&name) {
            1
        } else {
            fs::remove_file(article).unwrap();
            0
        };
        Ok(RawOutput {
            article: article.to_path_buf(),
            status: UploadStatus::from_exit_code(Some(code)),
            output: output(code),
        })
    }

    fn name(&self) -> &'static str {
        "fake-poster"
    }
}

/// Temp tree with a source root, raw drop dir, output dir and ledger
struct Fixture {
    temp: TempDir,
    log: Arc<CallLog>,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("root")).unwrap();
        Self {
            temp,
            log: Arc::new(CallLog::default()),
        }
    }

    fn root(&self) -> PathBuf {
        self.temp.path().join("root")
    }

    fn raw_dir(&self) -> PathBuf {
        self.temp.path().join("raw")
    }

    fn out(&self) -> PathBuf {
        self.temp.path().join("out")
    }

    fn ledger(&self) -> ResumeLedger {
        ResumeLedger::new(self.temp.path().join("state/uploads.resume"))
    }

    fn file(&self, relative: &str, len: usize) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, vec![b'x'; len]).unwrap();
        path
    }

    fn raw_article(&self, name: &str) -> PathBuf {
        fs::create_dir_all(self.raw_dir()).unwrap();
        let path = self.raw_dir().join(name);
        fs::write(&path, b"article").unwrap();
        path
    }

    fn generator(&self) -> FakeGenerator {
        FakeGenerator::new(self.log.clone(), &self.temp.path().join("scratch"))
    }

    fn poster(&self) -> FakePoster {
        FakePoster::new(self.log.clone(), &self.out())
    }

    fn options(&self, mode: RunMode) -> PipelineOptions {
        PipelineOptions {
            root: self.root(),
            selection: Selection::Extensions(vec!["mkv".into()]),
            scope: Scope::Private,
            mode,
            related_extensions: vec!["srt".into()],
            raw_dump_dir: self.raw_dir(),
        }
    }

    fn pipeline_with(
        &self,
        options: PipelineOptions,
        generator: FakeGenerator,
        poster: FakePoster,
    ) -> UploadPipeline {
        let (tx, _rx) = broadcast::channel(100);
        UploadPipeline::new(tx, options, Arc::new(generator), Arc::new(poster), self.ledger())
    }

    fn pipeline(&self, mode: RunMode) -> UploadPipeline {
        self.pipeline_with(self.options(mode), self.generator(), self.poster())
    }
}

/// Formatted log output of the current thread
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route `WARN` and above on this thread into the buffer until the guard drops
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn outcomes(report: &RunReport) -> Vec<(String, ItemOutcome)> {
    report
        .items
        .iter()
        .map(|i| (i.name.clone(), i.outcome.clone()))
        .collect()
}

#[tokio::test]
async fn test_full_run_then_rerun_is_idempotent() {
    let fx = Fixture::new();
    fx.file("show/ep1.mkv", 500);
    fx.file("show/ep2.mkv", 0);

    let report = fx.pipeline(RunMode::Full).run().await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(
        outcomes(&report),
        vec![(
            "ep1.mkv".to_string(),
            ItemOutcome::Uploaded {
                nzb: fx.out().join("ep1.mkv.nzb")
            }
        )]
    );
    assert_eq!(report.exit_code(), EXIT_OK);

    let records = fx.ledger().load().await.unwrap();
    assert_eq!(
        records,
        vec![ResumeRecord {
            name: "ep1.mkv".into(),
            size: 500,
            count: 1,
            scope: Scope::Private,
        }]
    );

    let report = fx.pipeline(RunMode::Full).run().await.unwrap();
    assert_eq!(
        report.status,
        RunStatus::NothingToDo(NothingToDo::AllUploaded)
    );
    assert_eq!(
        outcomes(&report),
        vec![("ep1.mkv".to_string(), ItemOutcome::Skipped)]
    );
    assert_eq!(report.exit_code(), EXIT_OK);
    assert_eq!(fx.log.count("generate:"), 1);
    assert_eq!(fx.log.count("upload:"), 1);
}

#[tokio::test]
async fn test_parity_failure_skips_upload_and_keeps_item_pending() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.file("ep2.mkv", 10);

    let mut generator = fx.generator();
    generator.fail.insert("ep1.mkv".into());
    let report = fx
        .pipeline_with(fx.options(RunMode::Full), generator, fx.poster())
        .run()
        .await
        .unwrap();

    assert_eq!(
        outcomes(&report)[0],
        (
            "ep1.mkv".to_string(),
            ItemOutcome::ParityFailed {
                exit_code: Some(1),
                error: None
            }
        )
    );
    assert!(matches!(
        report.items[1].outcome,
        ItemOutcome::Uploaded { .. }
    ));
    assert_eq!(report.exit_code(), EXIT_FAILURES);
    assert!(
        !fx.log
            .entries()
            .iter()
            .any(|e| e.starts_with("upload:ep1.mkv"))
    );

    let records = fx.ledger().load().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "ep2.mkv");

    // The failed item is retried next time
    let report = fx.pipeline(RunMode::Full).run().await.unwrap();
    assert!(matches!(
        report.items.iter().find(|i| i.name == "ep1.mkv").unwrap().outcome,
        ItemOutcome::Uploaded { .. }
    ));
    assert_eq!(fx.log.count("generate:ep1.mkv"), 2);
}

#[tokio::test]
async fn test_spawn_error_is_a_per_item_failure() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.file("ep2.mkv", 10);

    let mut generator = fx.generator();
    generator.spawn_error.insert("ep1.mkv".into());
    let report = fx
        .pipeline_with(fx.options(RunMode::SkipRepost), generator, fx.poster())
        .run()
        .await
        .unwrap();

    match &report.items[0].outcome {
        ItemOutcome::ParityFailed { exit_code, error } => {
            assert_eq!(*exit_code, None);
            assert!(error.as_deref().unwrap().contains("parpar"));
        }
        other => panic!("expected ParityFailed, got {other:?}"),
    }
    assert!(matches!(
        report.items[1].outcome,
        ItemOutcome::Uploaded { .. }
    ));
}

#[tokio::test]
async fn test_upload_failure_is_not_recorded_and_batch_continues() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.file("ep2.mkv", 10);

    let mut poster = fx.poster();
    poster.exit_codes.insert("ep1.mkv".into(), 5);
    let report = fx
        .pipeline_with(fx.options(RunMode::Full), fx.generator(), poster)
        .run()
        .await
        .unwrap();

    assert_eq!(
        report.items[0].outcome,
        ItemOutcome::UploadFailed {
            exit_code: Some(5),
            error: None
        }
    );
    assert!(matches!(
        report.items[1].outcome,
        ItemOutcome::Uploaded { .. }
    ));
    let names: Vec<String> = fx
        .ledger()
        .load()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["ep2.mkv"]);

    // Parity files of the failed upload stay for inspection
    assert!(fx.temp.path().join("scratch/ep1.mkv.par2").exists());
    assert!(!fx.temp.path().join("scratch/ep2.mkv.par2").exists());
}

#[tokio::test]
async fn test_partial_success_counts_as_uploaded() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);

    let mut poster = fx.poster();
    poster
        .exit_codes
        .insert("ep1.mkv".into(), crate::upload::PARTIAL_SUCCESS_EXIT_CODE);
    let pipeline = fx.pipeline_with(fx.options(RunMode::Full), fx.generator(), poster);
    let mut events = pipeline.subscribe();
    let report = pipeline.run().await.unwrap();

    assert_eq!(
        report.items[0].outcome,
        ItemOutcome::UploadedPartial {
            nzb: fx.out().join("ep1.mkv.nzb")
        }
    );
    assert_eq!(report.exit_code(), EXIT_OK);
    assert_eq!(fx.ledger().load().await.unwrap().len(), 1);

    let mut saw_partial = false;
    while let Ok(event) = events.try_recv() {
        if let Event::UploadComplete { partial, .. } = event {
            saw_partial = partial;
        }
    }
    assert!(saw_partial);
}

#[tokio::test]
async fn test_raw_articles_are_reposted_before_the_batch() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.raw_article("a1");
    fx.raw_article("a2");

    let mut poster = fx.poster();
    poster.repost_fail.insert("a1".into());
    let report = fx
        .pipeline_with(fx.options(RunMode::Full), fx.generator(), poster)
        .run()
        .await
        .unwrap();

    let log = fx.log.entries();
    assert_eq!(log[0], "repost:a1");
    assert_eq!(log[1], "repost:a2");
    assert_eq!(log[2], "generate:ep1.mkv");
    assert_eq!(report.reposts.len(), 2);
    assert!(!report.reposts[0].success);
    assert!(report.reposts[1].success);
    assert!(matches!(
        report.items[0].outcome,
        ItemOutcome::Uploaded { .. }
    ));
    assert_eq!(report.exit_code(), EXIT_FAILURES);
    assert!(fx.raw_dir().join("a1").exists());
    assert!(!fx.raw_dir().join("a2").exists());
}

#[tokio::test]
async fn test_skip_repost_leaves_raw_articles_alone() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.raw_article("a1");

    let report = fx.pipeline(RunMode::SkipRepost).run().await.unwrap();
    assert!(report.reposts.is_empty());
    assert_eq!(fx.log.count("repost:"), 0);
    assert!(fx.raw_dir().join("a1").exists());
}

#[tokio::test]
async fn test_repost_only() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);

    let report = fx.pipeline(RunMode::RepostOnly).run().await.unwrap();
    assert_eq!(
        report.status,
        RunStatus::NothingToDo(NothingToDo::NoRawArticles)
    );

    fx.raw_article("a1");
    let report = fx.pipeline(RunMode::RepostOnly).run().await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.reposts.len(), 1);
    assert!(report.items.is_empty());
    assert_eq!(fx.log.count("generate:"), 0);
}

#[tokio::test]
async fn test_generate_only_does_not_upload_or_record() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);

    let report = fx.pipeline(RunMode::GenerateOnly).run().await.unwrap();
    assert_eq!(
        report.items[0].outcome,
        ItemOutcome::Generated { parity_files: 1 }
    );
    assert_eq!(fx.log.count("upload:"), 0);
    assert!(fx.ledger().load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_only_uses_existing_parity_files() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.file("ep1.mkv.par2", 1);
    fx.file("ep1.mkv.vol0+1.par2", 1);
    fx.file("ep1.srt", 1);

    let report = fx.pipeline(RunMode::UploadOnly).run().await.unwrap();
    assert!(matches!(
        report.items[0].outcome,
        ItemOutcome::Uploaded { .. }
    ));
    assert_eq!(fx.log.count("generate:"), 0);
    assert_eq!(fx.log.entries(), vec!["upload:ep1.mkv:parity=2:related=1"]);
    assert_eq!(fx.ledger().load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_only_without_parity_files_warns_and_uploads() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.file("ep2.mkv", 10);
    fx.file("ep2.mkv.par2", 1);
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let report = fx.pipeline(RunMode::UploadOnly).run().await.unwrap();
    assert_eq!(report.uploaded(), 2);
    assert_eq!(
        fx.log.entries(),
        vec![
            "upload:ep1.mkv:parity=0:related=0",
            "upload:ep2.mkv:parity=1:related=0",
        ]
    );

    let warnings: Vec<String> = logs
        .text()
        .lines()
        .filter(|line| line.contains("uploading without recovery data"))
        .map(str::to_string)
        .collect();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("WARN"));
    assert!(warnings[0].contains("ep1.mkv"));
}

#[tokio::test]
async fn test_cancelled_before_start_attempts_nothing() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.file("ep2.mkv", 10);

    let pipeline = fx.pipeline(RunMode::SkipRepost);
    let mut events = pipeline.subscribe();
    pipeline.cancellation_token().cancel();
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.exit_code(), EXIT_INTERRUPTED);
    assert!(fx.log.entries().is_empty());

    let mut remaining = None;
    while let Ok(event) = events.try_recv() {
        if let Event::Cancelled { remaining: r } = event {
            remaining = Some(r);
        }
    }
    assert_eq!(remaining, Some(2));
}

#[tokio::test]
async fn test_cancel_mid_run_finishes_current_item() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.file("ep2.mkv", 10);

    let token = CancellationToken::new();
    let mut generator = fx.generator();
    generator.cancel_on_call = Some(token.clone());
    let report = fx
        .pipeline_with(fx.options(RunMode::SkipRepost), generator, fx.poster())
        .with_cancellation(token)
        .run()
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.items.len(), 1);
    assert!(matches!(
        report.items[0].outcome,
        ItemOutcome::Uploaded { .. }
    ));
    let records = fx.ledger().load().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(fx.log.count("generate:ep2.mkv"), 0);
}

#[tokio::test]
async fn test_duplicate_identity_in_one_batch_is_uploaded_once() {
    let fx = Fixture::new();
    fx.file("a/ep1.mkv", 10);
    fx.file("b/ep1.mkv", 10);

    let report = fx.pipeline(RunMode::Full).run().await.unwrap();
    assert_eq!(report.uploaded(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.items[1].path, fx.root().join("b/ep1.mkv"));
    assert_eq!(fx.log.count("upload:"), 1);
}

#[tokio::test]
async fn test_disabled_ledger_reuploads() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.pipeline(RunMode::Full).run().await.unwrap();

    let (tx, _rx) = broadcast::channel(100);
    let report = UploadPipeline::new(
        tx,
        fx.options(RunMode::Full),
        Arc::new(fx.generator()),
        Arc::new(fx.poster()),
        ResumeLedger::disabled(fx.ledger().path()),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.uploaded(), 1);
    assert_eq!(fx.log.count("upload:"), 2);
    assert_eq!(fx.ledger().load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_nothing_matched_and_all_empty() {
    let fx = Fixture::new();
    let report = fx.pipeline(RunMode::Full).run().await.unwrap();
    assert_eq!(report.status, RunStatus::NothingToDo(NothingToDo::NoMatches));
    assert_eq!(report.exit_code(), EXIT_NO_INPUT);

    fx.file("ep1.mkv", 0);
    let report = fx.pipeline(RunMode::Full).run().await.unwrap();
    assert_eq!(report.status, RunStatus::NothingToDo(NothingToDo::AllEmpty));
    assert_eq!(report.exit_code(), EXIT_NO_INPUT);
    assert!(fx.log.entries().is_empty());
}

#[tokio::test]
async fn test_missing_root_is_fatal() {
    let fx = Fixture::new();
    let mut options = fx.options(RunMode::Full);
    options.root = fx.temp.path().join("missing");

    let err = fx
        .pipeline_with(options, fx.generator(), fx.poster())
        .run()
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_bundles_are_processed_as_directories() {
    let fx = Fixture::new();
    fx.file("A/DISC_01/BDMV/index.bdmv", 10);
    fx.file("B/DISC_01/BDMV/index.bdmv", 20);

    let mut options = fx.options(RunMode::Full);
    options.selection = Selection::Bdmv(vec!["*/".into()]);
    let report = fx
        .pipeline_with(options, fx.generator(), fx.poster())
        .run()
        .await
        .unwrap();

    let paths: Vec<PathBuf> = report.items.iter().map(|i| i.path.clone()).collect();
    assert_eq!(
        paths,
        vec![fx.root().join("A/DISC_01"), fx.root().join("B/DISC_01")]
    );
    // Same name, different size: distinct identities
    assert_eq!(report.uploaded(), 2);
    assert_eq!(
        fx.log.entries(),
        vec![
            "generate:DISC_01",
            "upload:DISC_01:parity=1:related=0",
            "generate:DISC_01",
            "upload:DISC_01:parity=1:related=0",
        ]
    );
}

#[tokio::test]
async fn test_move_mode() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);

    let report = fx.pipeline(RunMode::Move).run().await.unwrap();
    assert_eq!(report.moved, vec![fx.root().join("ep1/ep1.mkv")]);
    assert!(fx.root().join("ep1/ep1.mkv").is_file());
    assert!(fx.log.entries().is_empty());
}

#[tokio::test]
async fn test_clear_modes() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.pipeline(RunMode::Full).run().await.unwrap();
    fx.raw_article("a1");

    let report = fx.pipeline(RunMode::ClearRaw).run().await.unwrap();
    assert_eq!(report.status, RunStatus::Cleared);
    assert_eq!(report.cleared_articles, 1);
    assert!(!fx.raw_dir().join("a1").exists());

    let report = fx.pipeline(RunMode::ClearResume).run().await.unwrap();
    assert_eq!(report.status, RunStatus::Cleared);
    assert!(!fx.ledger().path().exists());
}

#[tokio::test]
async fn test_scan_event_counts() {
    let fx = Fixture::new();
    fx.file("ep1.mkv", 10);
    fx.file("ep2.mkv", 0);
    fx.file("ep3.mkv", 10);
    fx.pipeline(RunMode::Full).run().await.unwrap();
    fx.file("ep4.mkv", 10);

    let pipeline = fx.pipeline(RunMode::Full);
    let mut events = pipeline.subscribe();
    pipeline.run().await.unwrap();

    let mut scan = None;
    let mut skipped = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            Event::ScanComplete { .. } => scan = Some(event),
            Event::Skipped { name } => skipped.push(name),
            _ => {}
        }
    }
    assert_eq!(
        scan,
        Some(Event::ScanComplete {
            matched: 4,
            non_empty: 3,
            pending: 1,
        })
    );
    assert_eq!(skipped, vec!["ep1.mkv", "ep3.mkv"]);
}
