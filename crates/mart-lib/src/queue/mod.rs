mod link_list;

pub use link_list::{LineDecodeError, LinkListLines, LinkListLoad, read_link_list};

use crate::config::ItemDefaults;
use crate::dispatch::BatchItem;
use crate::error::MartError;
use crate::params::ItemParameters;
use crate::utils::is_valid_source;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

/// One row of the queue.
#[derive(Clone, Debug)]
pub struct QueueEntry {
    source: String,
    valid: bool,
    status: EntryStatus,
    pub params: ItemParameters,
}

impl QueueEntry {
    fn new(source: String, params: ItemParameters) -> Self {
        let valid = is_valid_source(&source);
        Self {
            source,
            valid,
            status: EntryStatus::Pending,
            params,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// False when the source is neither a URL nor an existing file. Invalid
    /// entries are kept and still submitted.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub(crate) fn mark_succeeded(&mut self, output_path: PathBuf) {
        self.params.mark_downloaded(output_path);
        self.status = EntryStatus::Succeeded;
    }

    pub(crate) fn mark_failed(&mut self) {
        self.status = EntryStatus::Failed;
    }
}

/// Ordered list of queued sources.
#[derive(Clone, Debug, Default)]
pub struct LinkQueue {
    entries: Vec<QueueEntry>,
    defaults: ItemDefaults,
}

impl LinkQueue {
    pub fn new(defaults: ItemDefaults) -> Self {
        Self {
            entries: Vec::new(),
            defaults,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn get(&self, row: usize) -> Option<&QueueEntry> {
        self.entries.get(row)
    }

    pub fn add_link(&mut self, source: impl Into<String>) -> usize {
        let entry = QueueEntry::new(source.into(), ItemParameters::from_defaults(&self.defaults));
        if !entry.valid {
            tracing::warn!("\"{}\" is neither a URL nor an existing file", entry.source);
        }
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Appends an entry with no source yet.
    pub fn add_empty(&mut self) -> usize {
        self.entries.push(QueueEntry::new(
            String::new(),
            ItemParameters::from_defaults(&self.defaults),
        ));
        self.entries.len() - 1
    }

    /// Replaces a row's source and revalidates it. Parameters are kept.
    pub fn set_source(&mut self, row: usize, source: impl Into<String>) -> Result<(), MartError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(row)
            .ok_or(MartError::RowOutOfRange { row, len })?;
        entry.source = source.into();
        entry.valid = is_valid_source(&entry.source);
        entry.status = EntryStatus::Pending;
        Ok(())
    }

    /// Removes the given rows; unknown rows are ignored. Returns how many
    /// were removed.
    pub fn remove_rows(&mut self, rows: &[usize]) -> usize {
        let before = self.entries.len();
        let mut row = 0;
        self.entries.retain(|_| {
            let keep = !rows.contains(&row);
            row += 1;
            keep
        });
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn invalid_rows(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.valid)
            .map(|(row, _)| row)
            .collect()
    }

    fn check_rows(&self, rows: &[usize]) -> Result<(), MartError> {
        let len = self.entries.len();
        match rows.iter().find(|row| **row >= len) {
            Some(row) => Err(MartError::RowOutOfRange { row: *row, len }),
            None => Ok(()),
        }
    }

    /// Parameters of the selected rows, in queue order.
    pub fn params(&self, rows: &[usize]) -> Result<Vec<&ItemParameters>, MartError> {
        self.check_rows(rows)?;
        Ok(self
            .entries
            .iter()
            .enumerate()
            .filter(|(row, _)| rows.contains(row))
            .map(|(_, e)| &e.params)
            .collect())
    }

    pub fn params_mut(&mut self, rows: &[usize]) -> Result<Vec<&mut ItemParameters>, MartError> {
        self.check_rows(rows)?;
        Ok(self
            .entries
            .iter_mut()
            .enumerate()
            .filter(|(row, _)| rows.contains(row))
            .map(|(_, e)| &mut e.params)
            .collect())
    }

    /// Loads a link-list file and appends its links.
    pub fn load_link_list(&mut self, path: &Path) -> Result<LinkListLoad, MartError> {
        let lines = read_link_list(path)?;

        let start = self.entries.len();
        for link in lines.links {
            self.add_link(link);
        }
        let added_rows = start..self.entries.len();
        let invalid_rows = added_rows
            .clone()
            .filter(|row| !self.entries[*row].valid)
            .collect();

        Ok(LinkListLoad {
            path: path.to_path_buf(),
            added_rows,
            invalid_rows,
            decode_errors: lines.decode_errors,
        })
    }

    /// Snapshots every row for submission and resets their status.
    pub(crate) fn snapshot_batch(&mut self) -> Vec<BatchItem> {
        self.entries
            .iter_mut()
            .enumerate()
            .map(|(row, entry)| {
                entry.status = EntryStatus::Pending;
                BatchItem::new(entry.source.clone(), row, entry.params.clone())
            })
            .collect()
    }

    pub fn get_mut(&mut self, row: usize) -> Option<&mut QueueEntry> {
        self.entries.get_mut(row)
    }

    /// Text of the document produced for a downloaded row.
    pub fn read_output_document(&self, row: usize) -> Result<String, MartError> {
        let entry = self.entries.get(row).ok_or(MartError::RowOutOfRange {
            row,
            len: self.entries.len(),
        })?;
        let path = entry
            .params
            .output_file_path()
            .ok_or(MartError::NoOutputDocument { row })?;
        Ok(std::fs::read_to_string(path)?)
    }
}
