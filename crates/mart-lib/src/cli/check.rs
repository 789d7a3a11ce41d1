use crate::cli::params::CheckParams;
use crate::config::ItemDefaults;
use crate::error::MartError;
use crate::logging::LogSink;
use crate::queue::LinkQueue;
use crate::utils::is_url;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Url,
    File,
    Invalid,
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckedEntry {
    pub row: usize,
    pub source: String,
    pub kind: SourceKind,
}

/// Loads every link into a scratch queue and reports how each one was
/// classified. Nothing is processed.
pub fn run_check(params: CheckParams, log: LogSink) -> Result<Vec<CheckedEntry>, MartError> {
    let mut queue = LinkQueue::new(ItemDefaults::default());

    for path in &params.link_files {
        let load = log.in_scope(|| queue.load_link_list(path))?;
        if let Some(err) = load.aggregated_error() {
            log.in_scope(|| tracing::error!("{}", err));
        }
    }
    for link in &params.links {
        log.in_scope(|| queue.add_link(link.clone()));
    }

    let entries: Vec<CheckedEntry> = queue
        .entries()
        .iter()
        .enumerate()
        .map(|(row, entry)| CheckedEntry {
            row,
            source: entry.source().to_string(),
            kind: if !entry.is_valid() {
                SourceKind::Invalid
            } else if is_url(entry.source()) {
                SourceKind::Url
            } else {
                SourceKind::File
            },
        })
        .collect();

    if params.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            let kind = match entry.kind {
                SourceKind::Url => "url",
                SourceKind::File => "file",
                SourceKind::Invalid => "INVALID",
            };
            println!("{:>4}  {:<7} {}", entry.row, kind, entry.source);
        }
    }

    let invalid = entries
        .iter()
        .filter(|e| e.kind == SourceKind::Invalid)
        .count();
    log.in_scope(|| {
        tracing::info!("{} entries checked, {} invalid", entries.len(), invalid)
    });
    Ok(entries)
}
