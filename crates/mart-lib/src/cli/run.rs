use crate::app::{AppLogic, BatchObserver, BatchSummary};
use crate::cli::params::RunParams;
use crate::dispatch::FailureReason;
use crate::error::MartError;
use crate::logging::LogSink;
use crate::processor::{ArticleProcessor, PassthroughProcessor};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub row: usize,
    pub source: String,
    pub output_path: Option<PathBuf>,
    pub failure: Option<FailureReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub summary: BatchSummary,
    pub items: Vec<ItemReport>,
}

/// Prints one line per outcome unless the report is wanted as JSON.
struct ReportingObserver {
    sources: Vec<String>,
    items: Vec<ItemReport>,
    quiet: bool,
}

impl ReportingObserver {
    fn source(&self, index: usize) -> String {
        self.sources.get(index).cloned().unwrap_or_default()
    }
}

impl BatchObserver for ReportingObserver {
    fn on_item_success(&mut self, index: usize, output_path: &Path) {
        let source = self.source(index);
        if !self.quiet {
            println!("ok    {} -> {}", source, output_path.display());
        }
        self.items.push(ItemReport {
            row: index,
            source,
            output_path: Some(output_path.to_path_buf()),
            failure: None,
        });
    }

    fn on_item_fail(&mut self, index: usize, output_path: Option<&Path>, reason: &FailureReason) {
        let source = self.source(index);
        if !self.quiet {
            println!("FAIL  {source}: {reason}");
        }
        self.items.push(ItemReport {
            row: index,
            source,
            output_path: output_path.map(Path::to_path_buf),
            failure: Some(reason.clone()),
        });
    }
}

/// Runs the queue through the built-in Markdown processor.
pub fn run_queue(params: RunParams, log: LogSink) -> Result<BatchSummary, MartError> {
    run_queue_with(params, Arc::new(PassthroughProcessor::new()), log).map(|r| r.summary)
}

pub fn run_queue_with(
    params: RunParams,
    processor: Arc<dyn ArticleProcessor>,
    log: LogSink,
) -> Result<RunReport, MartError> {
    let mut app = AppLogic::new(&params.app_config, processor, log.clone())?;

    for path in &params.link_files {
        let load = app.load_links(path)?;
        if let Some(err) = load.aggregated_error() {
            log.in_scope(|| tracing::error!("{}", err));
        }
    }
    for link in &params.links {
        app.add_link(link.clone())?;
    }

    let invalid_rows = app.queue().invalid_rows();
    if params.skip_invalid && !invalid_rows.is_empty() {
        let removed = app.remove_rows(&invalid_rows)?;
        log.in_scope(|| tracing::warn!("Skipping {} invalid entries", removed));
    }

    if app.queue().is_empty() {
        log.in_scope(|| tracing::warn!("Nothing to process"));
        return Ok(RunReport {
            summary: BatchSummary::default(),
            items: Vec::new(),
        });
    }

    let mut observer = ReportingObserver {
        sources: app
            .queue()
            .entries()
            .iter()
            .map(|e| e.source().to_string())
            .collect(),
        items: Vec::new(),
        quiet: params.json,
    };

    app.start();
    let summary = app.wait_for_batch(&mut observer);

    let mut items = observer.items;
    items.sort_by_key(|item| item.row);
    let report = RunReport { summary, items };

    if params.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if summary.failed > 0 {
        return Err(MartError::ItemsFailed {
            failed: summary.failed,
            total: summary.total(),
        });
    }
    Ok(report)
}
