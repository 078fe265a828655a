use prelaunch_cli::config::{RunContext, SourceKind, UpdaterConfig};
use prelaunch_cli::core::UpdaterError;
use prelaunch_cli::pipeline::{Phase, SyncOutcome, UpdatePipeline};
use prelaunch_cli::sync::{FetchReason, SyncDecision};
use prelaunch_cli::test_utils::{MockBackend, RecordingObserver, ZipFixture, init_test_logging};
use std::path::Path;
use tempfile::TempDir;

const METADATA_URL: &str = "https://updates.example.com/arena/latest.json";
const ARCHIVE_URL: &str = "https://updates.example.com/arena/builds/arena.zip";
const LISTING_URL: &str = "https://cdn.example.com/arena/releases/";

fn metadata_context(root: &Path) -> RunContext {
    let mut config = UpdaterConfig::default();
    config.source.kind = SourceKind::Metadata;
    config.source.url = Some(METADATA_URL.to_string());
    RunContext::resolve(&config, root).unwrap()
}

fn metadata_document() -> String {
    r#"{"version": "3.0", "url": "builds/arena.zip", "notes": "Balance changes"}"#.to_string()
}

fn plugin_archive() -> Vec<u8> {
    ZipFixture::new()
        .dir("BepInEx/plugins/")
        .file("BepInEx/plugins/Arena.dll", "binary")
        .file("BepInEx/config/arena.cfg", "[General]\nEnabled = true\n")
        .build()
}

#[tokio::test]
async fn test_metadata_source_full_run() {
    init_test_logging(None);
    let root = TempDir::new().unwrap();
    let ctx = metadata_context(root.path());
    let backend = MockBackend::new()
        .with_text(METADATA_URL, metadata_document())
        .with_bytes(ARCHIVE_URL, plugin_archive());

    let observer = RecordingObserver::new();
    let report = UpdatePipeline::new(&ctx, &backend).run(&observer).await;

    assert!(report.is_success(), "{:?}", report.error());
    assert_eq!(
        observer.phases(),
        vec![
            Phase::Start,
            Phase::Locating,
            Phase::Deciding,
            Phase::Fetching,
            Phase::Installing,
            Phase::Sweeping,
            Phase::Done
        ]
    );
    assert_eq!(report.extracted, 2);
    assert!(report.entry_failures.is_empty());
    assert!(root.path().join("BepInEx/plugins/Arena.dll").is_file());
    assert_eq!(
        std::fs::read_to_string(root.path().join("BepInEx/config/arena.cfg")).unwrap(),
        "[General]\nEnabled = true\n"
    );
    assert!(ctx.download_dir.join("arena-3.0.zip").is_file());

    let events = observer.events();
    assert!(!events.is_empty());
    assert_eq!(events.last().and_then(|e| e.percent), Some(100));

    let marker = std::fs::read_to_string(&ctx.success_marker).unwrap();
    assert!(marker.contains("3.0"));
    assert!(!ctx.error_log.exists());
}

#[tokio::test]
async fn test_current_archive_is_not_downloaded_again() {
    let root = TempDir::new().unwrap();
    let ctx = metadata_context(root.path());
    let archive = plugin_archive();
    std::fs::create_dir_all(&ctx.download_dir).unwrap();
    std::fs::write(ctx.download_dir.join("arena-3.0.zip"), &archive).unwrap();
    let backend = MockBackend::new()
        .with_text(METADATA_URL, metadata_document())
        .with_bytes(ARCHIVE_URL, archive);

    let report = UpdatePipeline::new(&ctx, &backend).run(&RecordingObserver::new()).await;

    assert!(report.is_success());
    assert!(matches!(report.outcome, SyncOutcome::AlreadyCurrent { .. }));
    assert_eq!(report.transitions, vec![Phase::Start, Phase::Locating, Phase::Deciding, Phase::Skip, Phase::Done]);
    assert_eq!(backend.stream_count(), 0);
    // Skipping never touches the game directory
    assert!(!root.path().join("BepInEx").exists());
    assert!(std::fs::read_to_string(&ctx.success_marker).unwrap().contains("already current"));
}

#[tokio::test]
async fn test_size_change_triggers_redownload() {
    let root = TempDir::new().unwrap();
    let ctx = metadata_context(root.path());
    std::fs::create_dir_all(&ctx.download_dir).unwrap();
    std::fs::write(ctx.download_dir.join("arena-3.0.zip"), "truncated").unwrap();
    let backend = MockBackend::new()
        .with_text(METADATA_URL, metadata_document())
        .with_bytes(ARCHIVE_URL, plugin_archive());

    let (_, decision) = UpdatePipeline::new(&ctx, &backend).check().await.unwrap();
    assert!(matches!(
        decision,
        SyncDecision::Fetch {
            reason: FetchReason::SizeMismatch { local: 9, .. },
            ..
        }
    ));

    let report = UpdatePipeline::new(&ctx, &backend).run(&RecordingObserver::new()).await;
    assert!(matches!(report.outcome, SyncOutcome::Downloaded { .. }));
    assert_eq!(
        std::fs::metadata(ctx.download_dir.join("arena-3.0.zip")).unwrap().len(),
        plugin_archive().len() as u64
    );
}

#[tokio::test]
async fn test_hostile_entry_is_skipped_without_failing_run() {
    let root = TempDir::new().unwrap();
    let ctx = metadata_context(root.path());
    let archive = ZipFixture::new().file("../../outside.txt", "nope").file("readme.txt", "ok").build();
    let backend = MockBackend::new()
        .with_text(METADATA_URL, metadata_document())
        .with_bytes(ARCHIVE_URL, archive);

    let report = UpdatePipeline::new(&ctx, &backend).run(&RecordingObserver::new()).await;

    assert!(report.is_success(), "{:?}", report.error());
    assert_eq!(report.extracted, 1);
    assert_eq!(report.entry_failures.len(), 1);
    assert!(matches!(report.entry_failures[0], UpdaterError::EntryWriteError { .. }));
    assert!(root.path().join("readme.txt").is_file());
}

#[tokio::test]
async fn test_listing_source_picks_newest_and_sweeps() {
    let root = TempDir::new().unwrap();
    let mut config = UpdaterConfig::default();
    config.source.kind = SourceKind::Listing;
    config.source.url = Some(LISTING_URL.to_string());
    let ctx = RunContext::resolve(&config, root.path()).unwrap();

    let page = r#"
        <ul>
          <li><a href="arena-0.9.1.zip">0.9.1</a></li>
          <li><a href="arena-0.10.0.zip">0.10.0</a></li>
          <li><a href="arena-0.10.0.zip.sha256">checksum</a></li>
          <li><a href="../">parent</a></li>
        </ul>"#;
    let backend = MockBackend::new()
        .with_text(LISTING_URL, page)
        .with_unknown_length(
            "https://cdn.example.com/arena/releases/arena-0.10.0.zip",
            plugin_archive(),
        );
    std::fs::create_dir_all(&ctx.download_dir).unwrap();
    std::fs::write(ctx.download_dir.join("arena-0.9.1.zip"), "old").unwrap();
    std::fs::write(ctx.download_dir.join("notes.txt"), "keep").unwrap();

    let report = UpdatePipeline::new(&ctx, &backend).run(&RecordingObserver::new()).await;

    assert!(report.is_success(), "{:?}", report.error());
    assert_eq!(report.version_label().as_deref(), Some("0.10.0"));
    assert_eq!(report.swept, 1);
    assert!(ctx.download_dir.join("arena-0.10.0.zip").is_file());
    assert!(!ctx.download_dir.join("arena-0.9.1.zip").exists());
    assert!(ctx.download_dir.join("notes.txt").exists());
}
