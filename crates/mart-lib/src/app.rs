//! Orchestration of the queue and the dispatcher.
//!
//! `AppLogic` is the single consumer of dispatcher events. All queue state
//! (statuses, completion fields) changes here, on the thread that owns the
//! `AppLogic`, before the presentation layer is notified.

use crate::config::Config;
use crate::dispatch::{DispatchEvent, FailureReason, TaskDispatcher};
use crate::error::MartError;
use crate::logging::LogSink;
use crate::params::{FieldEdit, MergedView, apply_field_to_selection, merge_for_display};
use crate::processor::ArticleProcessor;
use crate::queue::{EntryStatus, LinkListLoad, LinkQueue};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Presentation-side callbacks, invoked on the orchestrating thread.
pub trait BatchObserver {
    fn on_item_success(&mut self, _index: usize, _output_path: &Path) {}

    fn on_item_fail(&mut self, _index: usize, _output_path: Option<&Path>, _reason: &FailureReason) {}

    fn on_batch_done(&mut self) {}
}

impl BatchObserver for () {}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

pub struct AppLogic {
    queue: LinkQueue,
    dispatcher: TaskDispatcher,
    events: UnboundedReceiver<DispatchEvent>,
    log: LogSink,
    summary: BatchSummary,
    /// Submitted batch whose `BatchDone` has not been applied yet.
    pending_batch: Option<u64>,
}

impl AppLogic {
    pub fn new(
        config: &Config,
        processor: Arc<dyn ArticleProcessor>,
        log: LogSink,
    ) -> Result<Self, MartError> {
        let (tx, events) = unbounded_channel();
        let dispatcher = TaskDispatcher::new(&config.dispatcher, processor, tx, log.clone())?;
        log.in_scope(|| tracing::info!("Program started"));

        Ok(Self {
            queue: LinkQueue::new(config.defaults.clone()),
            dispatcher,
            events,
            log,
            summary: BatchSummary::default(),
            pending_batch: None,
        })
    }

    pub fn queue(&self) -> &LinkQueue {
        &self.queue
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    /// True from `start` until the batch's `BatchDone` has been handled,
    /// so rows keep the indexes their queued outcomes refer to.
    pub fn is_running(&self) -> bool {
        self.pending_batch.is_some() || self.dispatcher.is_running()
    }

    fn ensure_idle(&self) -> Result<(), MartError> {
        if self.is_running() {
            return Err(MartError::RunInProgress);
        }
        Ok(())
    }

    pub fn add_link(&mut self, source: impl Into<String>) -> Result<usize, MartError> {
        self.ensure_idle()?;
        let source = source.into();
        Ok(self.log.in_scope(|| self.queue.add_link(source)))
    }

    pub fn add_empty(&mut self) -> Result<usize, MartError> {
        self.ensure_idle()?;
        Ok(self.queue.add_empty())
    }

    pub fn set_source(&mut self, row: usize, source: impl Into<String>) -> Result<(), MartError> {
        self.ensure_idle()?;
        self.queue.set_source(row, source)
    }

    pub fn remove_rows(&mut self, rows: &[usize]) -> Result<usize, MartError> {
        self.ensure_idle()?;
        Ok(self.queue.remove_rows(rows))
    }

    pub fn clear(&mut self) -> Result<(), MartError> {
        self.ensure_idle()?;
        self.queue.clear();
        Ok(())
    }

    pub fn load_links(&mut self, path: &Path) -> Result<LinkListLoad, MartError> {
        self.ensure_idle()?;
        let queue = &mut self.queue;
        let load = self.log.in_scope(|| queue.load_link_list(path))?;
        self.log.in_scope(|| {
            tracing::info!(
                "Loaded {} links from {} ({} invalid)",
                load.added(),
                path.display(),
                load.invalid_rows.len()
            )
        });
        Ok(load)
    }

    /// Merged parameters of the selected rows.
    pub fn merged_view(&self, rows: &[usize]) -> Result<Option<MergedView>, MartError> {
        Ok(merge_for_display(self.queue.params(rows)?))
    }

    /// Writes one edit to every selected row. Running tasks keep the
    /// parameters they were submitted with.
    pub fn apply_edit(&mut self, rows: &[usize], edit: &FieldEdit) -> Result<usize, MartError> {
        let selection = self.queue.params_mut(rows)?;
        Ok(self
            .log
            .in_scope(|| apply_field_to_selection(edit, selection)))
    }

    pub fn read_output_document(&self, row: usize) -> Result<String, MartError> {
        self.queue.read_output_document(row)
    }

    /// Submits every queued row. Returns `false` if a run is already active.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.log.in_scope(|| tracing::info!("Work started..."));
        self.summary = BatchSummary::default();
        let batch = self.queue.snapshot_batch();
        self.pending_batch = self.dispatcher.submit_batch(batch);
        self.pending_batch.is_some()
    }

    /// Cancels rows that have not started and waits for the running ones.
    /// Their outcomes are applied on the next drain.
    pub fn stop(&mut self) {
        self.log.in_scope(|| tracing::info!("User stopped work..."));
        self.dispatcher.request_stop();
    }

    /// Start when idle, stop when running.
    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop();
            false
        } else {
            self.start()
        }
    }

    /// Handles every event already queued without blocking. Returns how many
    /// events were handled.
    pub fn pump_events(&mut self, observer: &mut dyn BatchObserver) -> usize {
        let mut handled = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.handle_event(event, observer);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Blocks until the current batch reports completion. Returns at once
    /// when no batch is pending.
    ///
    /// Must not be called from within an async runtime.
    pub fn wait_for_batch(&mut self, observer: &mut dyn BatchObserver) -> BatchSummary {
        while self.pending_batch.is_some() {
            match self.events.blocking_recv() {
                Some(event) => self.handle_event(event, observer),
                None => break,
            }
        }
        self.summary
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    fn handle_event(&mut self, event: DispatchEvent, observer: &mut dyn BatchObserver) {
        match event {
            DispatchEvent::ItemSucceeded { index, output_path } => {
                self.summary.succeeded += 1;
                match self.queue.get_mut(index) {
                    Some(entry) => entry.mark_succeeded(output_path.clone()),
                    None => self.log.in_scope(|| {
                        tracing::warn!("Result for unknown queue row {}", index)
                    }),
                }
                observer.on_item_success(index, &output_path);
            }
            DispatchEvent::ItemFailed {
                index,
                output_path,
                reason,
            } => {
                self.summary.failed += 1;
                if let Some(entry) = self.queue.get_mut(index) {
                    entry.mark_failed();
                }
                observer.on_item_fail(index, output_path.as_deref(), &reason);
            }
            DispatchEvent::BatchDone { batch } => {
                if self.pending_batch == Some(batch) {
                    self.pending_batch = None;
                }
                self.log.in_scope(|| {
                    tracing::info!(
                        "Work completed... (batch {}: {} succeeded, {} failed)",
                        batch,
                        self.summary.succeeded,
                        self.summary.failed
                    )
                });
                observer.on_batch_done();
            }
        }
    }

    pub fn status_of(&self, row: usize) -> Option<EntryStatus> {
        self.queue.get(row).map(|e| e.status())
    }
}
