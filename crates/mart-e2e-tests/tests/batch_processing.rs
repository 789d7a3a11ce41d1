use mart_e2e_tests::{
    MISSING_PATH, Script, ScriptedProcessor, VALID_URL, create_test_config, init_tracing,
    setup_test_environment,
};
use mart_lib::app::{AppLogic, BatchObserver, BatchSummary};
use mart_lib::config::DispatcherConfig;
use mart_lib::dispatch::{BatchItem, DispatchEvent, FailureReason, TaskDispatcher};
use mart_lib::logging::LogSink;
use mart_lib::params::ItemParameters;
use mart_lib::processor::ArticleProcessor;
use mart_lib::queue::EntryStatus;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;
use tracing::Level;

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl BatchObserver for Recorder {
    fn on_item_success(&mut self, index: usize, _output_path: &Path) {
        self.events.push(format!("ok:{index}"));
    }

    fn on_item_fail(&mut self, index: usize, _output_path: Option<&Path>, _reason: &FailureReason) {
        self.events.push(format!("fail:{index}"));
    }

    fn on_batch_done(&mut self) {
        self.events.push("done".to_string());
    }
}

/// Reads events until the batch closes.
fn collect_batch(rx: &mut tokio::sync::mpsc::UnboundedReceiver<DispatchEvent>) -> Vec<DispatchEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.blocking_recv() {
        let done = matches!(event, DispatchEvent::BatchDone { .. });
        events.push(event);
        if done {
            break;
        }
    }
    events
}

#[test]
fn test_three_items_with_one_raising_resolve_exactly_once() {
    init_tracing();

    let processor: Arc<dyn ArticleProcessor> = Arc::new(
        ScriptedProcessor::new()
            .with("a", Script::Produce(PathBuf::from("/out/a.md")))
            .with("b", Script::Panic)
            .with("c", Script::Produce(PathBuf::from("/out/c.md"))),
    );
    let (tx, mut rx) = unbounded_channel();
    let mut dispatcher = TaskDispatcher::new(
        &DispatcherConfig { workers: Some(3) },
        processor,
        tx,
        LogSink::capture_only(Level::DEBUG),
    )
    .expect("dispatcher should start");

    let batch = ["a", "b", "c"]
        .iter()
        .enumerate()
        .map(|(i, s)| BatchItem::new(*s, i, ItemParameters::default()))
        .collect();
    assert!(dispatcher.submit_batch(batch).is_some());

    let events = collect_batch(&mut rx);

    assert_eq!(events.len(), 4, "three outcomes and one completion: {events:?}");
    assert!(matches!(events.last(), Some(DispatchEvent::BatchDone { .. })));

    let mut succeeded: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            DispatchEvent::ItemSucceeded { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    succeeded.sort();
    assert_eq!(succeeded, vec![0, 2]);

    let failed: Vec<&FailureReason> = events
        .iter()
        .filter_map(|e| match e {
            DispatchEvent::ItemFailed { index: 1, reason, .. } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(matches!(failed[0], FailureReason::Panicked(_)));

    assert!(!dispatcher.is_running());
    assert!(rx.try_recv().is_err(), "no events after BatchDone");
}

#[test]
fn test_link_file_scenario_runs_invalid_entries_to_failure() {
    init_tracing();

    let temp_dir = setup_test_environment().expect("Failed to setup test environment");
    let article = temp_dir.path().join("local.md");

    let processor = Arc::new(
        ScriptedProcessor::new()
            .with(VALID_URL, Script::Produce(PathBuf::from("/out/a.md")))
            .with(
                &article.to_string_lossy(),
                Script::Produce(temp_dir.path().join("out").join("local.md")),
            ),
    );
    let config = create_test_config(&temp_dir.path().join("out"));
    let mut app = AppLogic::new(&config, processor.clone(), LogSink::capture_only(Level::INFO))
        .expect("app should start");

    let load = app
        .load_links(&temp_dir.path().join("links.txt"))
        .expect("link list should load");
    assert_eq!(load.added(), 3);
    assert_eq!(load.invalid_rows, vec![1]);
    assert_eq!(app.queue().get(1).map(|e| e.source()), Some(MISSING_PATH));

    let mut recorder = Recorder::default();
    assert!(app.start());
    let summary = app.wait_for_batch(&mut recorder);

    assert_eq!(summary, BatchSummary { succeeded: 2, failed: 1 });
    assert_eq!(recorder.events.last().map(String::as_str), Some("done"));
    assert!(recorder.events.contains(&"fail:1".to_string()));
    assert_eq!(app.status_of(0), Some(EntryStatus::Succeeded));
    assert_eq!(app.status_of(1), Some(EntryStatus::Failed));
    assert_eq!(app.status_of(2), Some(EntryStatus::Succeeded));
    assert_eq!(processor.requests().len(), 3);
}

#[test]
fn test_configured_defaults_reach_the_processor() {
    let temp_dir = setup_test_environment().expect("Failed to setup test environment");
    let processor = Arc::new(ScriptedProcessor::new().with(VALID_URL, Script::NoOutput));
    let config = create_test_config(&temp_dir.path().join("out"));
    let mut app = AppLogic::new(&config, processor.clone(), LogSink::capture_only(Level::INFO))
        .expect("app should start");

    app.add_link(VALID_URL).expect("queue is idle");
    app.start();
    let summary = app.wait_for_batch(&mut ());

    assert_eq!(summary.failed, 1);
    let requests = processor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].downloading_timeout, Some(Duration::from_secs(30)));
    assert_eq!(requests[0].skip_list, vec!["tracker.gif"]);
    assert_eq!(requests[0].output_path, temp_dir.path().join("out"));
    assert!(!app.queue().get(0).map(|e| e.params.downloaded()).unwrap_or(true));
}

#[test]
fn test_stop_resolves_every_item_and_allows_a_new_run() {
    init_tracing();

    let slow = Script::Slow(Duration::from_millis(100), PathBuf::from("/out/x.md"));
    let mut scripted = ScriptedProcessor::new();
    let sources: Vec<String> = (0..6).map(|i| format!("https://s.example/{i}.md")).collect();
    for source in &sources {
        scripted = scripted.with(source, slow.clone());
    }
    let mut config = create_test_config(Path::new("/out"));
    config.dispatcher.workers = Some(1);
    let mut app = AppLogic::new(&config, Arc::new(scripted), LogSink::capture_only(Level::INFO))
        .expect("app should start");
    for source in &sources {
        app.add_link(source.clone()).expect("queue is idle");
    }

    let mut recorder = Recorder::default();
    assert!(app.start());
    app.stop();
    let summary = app.wait_for_batch(&mut recorder);

    assert_eq!(summary.total(), 6);
    assert!(summary.failed >= 4, "pending items are cancelled: {summary:?}");
    assert_eq!(recorder.events.iter().filter(|e| *e == "done").count(), 1);
    assert!(!app.is_running());

    assert!(app.start(), "a stopped run can be restarted");
    let summary = app.wait_for_batch(&mut ());
    assert_eq!(summary, BatchSummary { succeeded: 6, failed: 0 });
}
