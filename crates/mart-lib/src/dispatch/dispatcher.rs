use super::types::{BatchItem, DispatchEvent, FailureReason};
use crate::config::DispatcherConfig;
use crate::error::MartError;
use crate::logging::LogSink;
use crate::processor::{ArticleProcessor, ProcessRequest};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;

const TASK_PENDING: u8 = 0;
const TASK_RUNNING: u8 = 1;
const TASK_CANCELLED: u8 = 2;
const TASK_FINISHED: u8 = 3;

struct TaskHandle {
    identifier: String,
    index: usize,
    state: Arc<AtomicU8>,
}

struct InFlight {
    batch: u64,
    remaining: usize,
}

/// Counts unresolved tasks of the current batch.
struct BatchTracker {
    in_flight: Mutex<InFlight>,
    idle: Condvar,
}

impl BatchTracker {
    fn new() -> Self {
        Self {
            in_flight: Mutex::new(InFlight {
                batch: 0,
                remaining: 0,
            }),
            idle: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InFlight> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remaining(&self) -> usize {
        self.lock().remaining
    }

    /// Opens a new batch of `size` tasks, or returns `None` if one is open.
    fn begin(&self, size: usize) -> Option<u64> {
        let mut in_flight = self.lock();
        if in_flight.remaining > 0 {
            return None;
        }
        in_flight.batch += 1;
        in_flight.remaining = size;
        Some(in_flight.batch)
    }

    /// Resolves one task. The last one closes the batch.
    fn finish(&self, events: &UnboundedSender<DispatchEvent>) {
        let mut in_flight = self.lock();
        in_flight.remaining = in_flight.remaining.saturating_sub(1);
        if in_flight.remaining == 0 {
            send_event(
                events,
                DispatchEvent::BatchDone {
                    batch: in_flight.batch,
                },
            );
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self) {
        let in_flight = self.lock();
        let _in_flight = self
            .idle
            .wait_while(in_flight, |s| s.remaining > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

struct TaskShared {
    processor: Arc<dyn ArticleProcessor>,
    events: UnboundedSender<DispatchEvent>,
    tracker: BatchTracker,
}

impl TaskShared {
    fn run_task(&self, item: BatchItem, state: &AtomicU8) {
        if state
            .compare_exchange(
                TASK_PENDING,
                TASK_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            // Already reported by request_stop.
            return;
        }

        let event = match execute(self.processor.as_ref(), &item) {
            Ok(output_path) => DispatchEvent::ItemSucceeded {
                index: item.index,
                output_path,
            },
            Err(reason) => {
                tracing::warn!("Processing \"{}\" failed: {}", item.identifier, reason);
                DispatchEvent::ItemFailed {
                    index: item.index,
                    output_path: None,
                    reason,
                }
            }
        };

        state.store(TASK_FINISHED, Ordering::Release);
        send_event(&self.events, event);
        self.tracker.finish(&self.events);
    }
}

fn execute(processor: &dyn ArticleProcessor, item: &BatchItem) -> Result<PathBuf, FailureReason> {
    tracing::debug!("Starting worker for \"{}\"", item.identifier);
    let request = ProcessRequest::new(&item.identifier, &item.parameters);

    tracing::info!("Processing \"{}\"", item.identifier);
    match catch_unwind(AssertUnwindSafe(|| processor.process(&request))) {
        Ok(Ok(Some(output_path))) if !output_path.as_os_str().is_empty() => {
            tracing::info!("Processing \"{}\" completed", item.identifier);
            Ok(output_path)
        }
        Ok(Ok(_)) => Err(FailureReason::NoOutput),
        Ok(Err(e)) => Err(FailureReason::Processor(e.to_string())),
        Err(payload) => Err(FailureReason::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn send_event(events: &UnboundedSender<DispatchEvent>, event: DispatchEvent) {
    if events.send(event).is_err() {
        tracing::trace!("Event receiver dropped; discarding event");
    }
}

/// Runs batches of conversion jobs on a fixed-size worker pool.
///
/// Every submitted item resolves to exactly one `ItemSucceeded` or
/// `ItemFailed` event, and each batch ends with a single `BatchDone`.
/// Events go to the channel given at construction; nothing else is
/// touched from worker threads.
pub struct TaskDispatcher {
    pool: rayon::ThreadPool,
    shared: Arc<TaskShared>,
    tasks: Vec<TaskHandle>,
    log: LogSink,
    worker_count: usize,
}

impl TaskDispatcher {
    pub fn new(
        config: &DispatcherConfig,
        processor: Arc<dyn ArticleProcessor>,
        events: UnboundedSender<DispatchEvent>,
        log: LogSink,
    ) -> Result<Self, MartError> {
        let worker_count = config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("mart-worker-{i}"))
            .build()
            .map_err(|e| MartError::WorkerPool {
                reason: e.to_string(),
            })?;

        log.in_scope(|| tracing::debug!("Worker pool started with {} threads", worker_count));

        Ok(Self {
            pool,
            shared: Arc::new(TaskShared {
                processor,
                events,
                tracker: BatchTracker::new(),
            }),
            tasks: Vec::new(),
            log,
            worker_count,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// True while any task of the current batch is pending or executing.
    pub fn is_running(&self) -> bool {
        self.shared.tracker.remaining() > 0
    }

    /// Starts one task per item and returns the batch id carried by its
    /// `BatchDone`. Ignored (returns `None`) while a batch is still running.
    pub fn submit_batch(&mut self, items: Vec<BatchItem>) -> Option<u64> {
        let Some(batch) = self.shared.tracker.begin(items.len()) else {
            self.log
                .in_scope(|| tracing::debug!("Batch submitted while running; ignored"));
            return None;
        };

        self.tasks.clear();
        if items.is_empty() {
            send_event(&self.shared.events, DispatchEvent::BatchDone { batch });
            return Some(batch);
        }

        for item in items {
            self.log
                .in_scope(|| tracing::debug!("Adding worker for \"{}\"", item.identifier));

            let state = Arc::new(AtomicU8::new(TASK_PENDING));
            self.tasks.push(TaskHandle {
                identifier: item.identifier.clone(),
                index: item.index,
                state: state.clone(),
            });

            let shared = self.shared.clone();
            let dispatch = self.log.dispatch().clone();
            self.pool.spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || shared.run_task(item, &state));
            });
        }
        Some(batch)
    }

    /// Cancels tasks that have not started and blocks until the running ones
    /// resolve. Running processor calls are not interrupted.
    pub fn request_stop(&self) {
        for task in &self.tasks {
            if task
                .state
                .compare_exchange(
                    TASK_PENDING,
                    TASK_CANCELLED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                self.log
                    .in_scope(|| tracing::debug!("Cancelled worker for \"{}\"", task.identifier));
                send_event(
                    &self.shared.events,
                    DispatchEvent::ItemFailed {
                        index: task.index,
                        output_path: None,
                        reason: FailureReason::Cancelled,
                    },
                );
                self.shared.tracker.finish(&self.shared.events);
            }
        }

        self.shared.tracker.wait_idle();
    }
}

impl Drop for TaskDispatcher {
    fn drop(&mut self) {
        self.request_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ItemParameters;
    use crate::processor::ProcessorError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
    use tracing::Level;

    type ProcessResult = Result<Option<PathBuf>, ProcessorError>;

    fn dispatcher_with(
        workers: usize,
        processor: Arc<dyn ArticleProcessor>,
    ) -> (TaskDispatcher, UnboundedReceiver<DispatchEvent>) {
        let (tx, rx) = unbounded_channel();
        let config = DispatcherConfig {
            workers: Some(workers),
        };
        let dispatcher =
            TaskDispatcher::new(&config, processor, tx, LogSink::capture_only(Level::DEBUG))
                .unwrap();
        (dispatcher, rx)
    }

    fn batch(sources: &[&str]) -> Vec<BatchItem> {
        sources
            .iter()
            .enumerate()
            .map(|(i, s)| BatchItem::new(*s, i, ItemParameters::default()))
            .collect()
    }

    fn collect_until_done(rx: &mut UnboundedReceiver<DispatchEvent>) -> Vec<DispatchEvent> {
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

    fn count_outcomes(events: &[DispatchEvent]) -> (usize, usize, usize) {
        events.iter().fold((0, 0, 0), |(ok, failed, done), e| match e {
            DispatchEvent::ItemSucceeded { .. } => (ok + 1, failed, done),
            DispatchEvent::ItemFailed { .. } => (ok, failed + 1, done),
            DispatchEvent::BatchDone { .. } => (ok, failed, done + 1),
        })
    }

    /// Blocks every call until `open` is called.
    #[derive(Default)]
    struct Gate {
        open: Mutex<bool>,
        opened: Condvar,
        started: AtomicUsize,
    }

    impl Gate {
        fn wait(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let open = self.open.lock().unwrap();
            let _open = self.opened.wait_while(open, |o| !*o).unwrap();
        }

        fn open(&self) {
            *self.open.lock().unwrap() = true;
            self.opened.notify_all();
        }

        fn wait_started(&self, n: usize) {
            while self.started.load(Ordering::SeqCst) < n {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
    }

    #[test]
    fn test_every_item_reports_and_batch_done_fires_once_last() {
        let processor: Arc<dyn ArticleProcessor> = Arc::new(|req: &ProcessRequest| -> ProcessResult {
            Ok(Some(PathBuf::from(format!("/out/{}.md", req.article_file_path_or_url))))
        });
        let (mut dispatcher, mut rx) = dispatcher_with(3, processor);

        assert_eq!(dispatcher.submit_batch(batch(&["a", "b", "c", "d", "e"])), Some(1));
        let events = collect_until_done(&mut rx);

        assert_eq!(count_outcomes(&events), (5, 0, 1));
        assert!(matches!(events.last(), Some(DispatchEvent::BatchDone { batch: 1 })));
        assert!(!dispatcher.is_running());

        let mut indexes: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                DispatchEvent::ItemSucceeded { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        indexes.sort();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_failing_processor_still_yields_one_outcome_per_item() {
        let processor: Arc<dyn ArticleProcessor> = Arc::new(|req: &ProcessRequest| -> ProcessResult {
            match req.article_file_path_or_url.as_str() {
                "raises" => Err(ProcessorError::Other("boom".to_string())),
                "empty" => Ok(None),
                source => Ok(Some(PathBuf::from(source))),
            }
        });
        let (mut dispatcher, mut rx) = dispatcher_with(2, processor);

        dispatcher.submit_batch(batch(&["ok.md", "raises", "empty"]));
        let events = collect_until_done(&mut rx);

        assert_eq!(count_outcomes(&events), (1, 2, 1));
        assert!(events.contains(&DispatchEvent::ItemFailed {
            index: 1,
            output_path: None,
            reason: FailureReason::Processor("boom".to_string()),
        }));
        assert!(events.contains(&DispatchEvent::ItemFailed {
            index: 2,
            output_path: None,
            reason: FailureReason::NoOutput,
        }));
    }

    #[test]
    fn test_panicking_processor_is_reported_as_failure() {
        let processor: Arc<dyn ArticleProcessor> = Arc::new(|req: &ProcessRequest| -> ProcessResult {
            if req.article_file_path_or_url == "explodes" {
                panic!("processor exploded");
            }
            Ok(Some(PathBuf::from("/out/x.md")))
        });
        let (mut dispatcher, mut rx) = dispatcher_with(2, processor);

        dispatcher.submit_batch(batch(&["fine", "explodes", "fine-too"]));
        let events = collect_until_done(&mut rx);

        assert_eq!(count_outcomes(&events), (2, 1, 1));
        assert!(events.contains(&DispatchEvent::ItemFailed {
            index: 1,
            output_path: None,
            reason: FailureReason::Panicked("processor exploded".to_string()),
        }));
    }

    #[test]
    fn test_empty_batch_completes_immediately() {
        let processor: Arc<dyn ArticleProcessor> =
            Arc::new(|_: &ProcessRequest| -> ProcessResult { Ok(None) });
        let (mut dispatcher, mut rx) = dispatcher_with(1, processor);

        assert_eq!(dispatcher.submit_batch(Vec::new()), Some(1));
        assert!(!dispatcher.is_running());
        assert_eq!(rx.blocking_recv(), Some(DispatchEvent::BatchDone { batch: 1 }));
    }

    #[test]
    fn test_submit_while_running_is_ignored() {
        let gate = Arc::new(Gate::default());
        let processor_gate = gate.clone();
        let processor: Arc<dyn ArticleProcessor> = Arc::new(move |_: &ProcessRequest| -> ProcessResult {
            processor_gate.wait();
            Ok(Some(PathBuf::from("/out/x.md")))
        });
        let (mut dispatcher, mut rx) = dispatcher_with(2, processor);

        assert!(dispatcher.submit_batch(batch(&["a", "b"])).is_some());
        assert!(dispatcher.is_running());
        assert!(dispatcher.submit_batch(batch(&["c", "d", "e"])).is_none());

        gate.open();
        let events = collect_until_done(&mut rx);

        assert_eq!(count_outcomes(&events), (2, 0, 1));
        assert!(rx.try_recv().is_err());
        assert_eq!(gate.started.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_request_stop_cancels_pending_and_waits_for_running() {
        let gate = Arc::new(Gate::default());
        let processor_gate = gate.clone();
        let processor: Arc<dyn ArticleProcessor> = Arc::new(move |_: &ProcessRequest| -> ProcessResult {
            processor_gate.wait();
            Ok(Some(PathBuf::from("/out/x.md")))
        });
        let (mut dispatcher, mut rx) = dispatcher_with(1, processor);

        dispatcher.submit_batch(batch(&["a", "b", "c"]));
        gate.wait_started(1);

        let opener = gate.clone();
        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            opener.open();
        });
        dispatcher.request_stop();
        releaser.join().unwrap();

        assert!(!dispatcher.is_running());
        let events = collect_until_done(&mut rx);
        assert_eq!(count_outcomes(&events), (1, 2, 1));
        let cancelled = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    DispatchEvent::ItemFailed {
                        reason: FailureReason::Cancelled,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(cancelled, 2);
        assert!(matches!(events.last(), Some(DispatchEvent::BatchDone { .. })));
    }

    #[test]
    fn test_dispatcher_accepts_new_batch_after_previous_finishes() {
        let processor: Arc<dyn ArticleProcessor> =
            Arc::new(|_: &ProcessRequest| -> ProcessResult { Ok(Some(PathBuf::from("/o.md"))) });
        let (mut dispatcher, mut rx) = dispatcher_with(2, processor);

        dispatcher.submit_batch(batch(&["a"]));
        collect_until_done(&mut rx);
        assert_eq!(dispatcher.submit_batch(batch(&["b", "c"])), Some(2));
        let events = collect_until_done(&mut rx);

        assert_eq!(count_outcomes(&events), (2, 0, 1));
        assert!(matches!(events.last(), Some(DispatchEvent::BatchDone { batch: 2 })));
    }
}
