use crate::error::MartError;
use itertools::Itertools;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineDecodeError {
    /// 1-based.
    pub line: usize,
    pub reason: String,
}

/// Lines read from a link-list file.
#[derive(Debug, Default)]
pub struct LinkListLines {
    pub links: Vec<String>,
    pub decode_errors: Vec<LineDecodeError>,
}

/// Outcome of loading a link-list file into the queue.
#[derive(Clone, Debug)]
pub struct LinkListLoad {
    pub path: PathBuf,
    /// Queue rows the file's links landed in.
    pub added_rows: Range<usize>,
    /// Rows holding neither a URL nor an existing file.
    pub invalid_rows: Vec<usize>,
    pub decode_errors: Vec<LineDecodeError>,
}

impl LinkListLoad {
    pub fn added(&self) -> usize {
        self.added_rows.len()
    }

    /// One error describing every line that could not be decoded.
    pub fn aggregated_error(&self) -> Option<MartError> {
        if self.decode_errors.is_empty() {
            return None;
        }
        Some(MartError::LinkListDecode {
            path: self.path.clone(),
            details: self
                .decode_errors
                .iter()
                .map(|e| format!("line {}: {}", e.line, e.reason))
                .join("\n"),
        })
    }
}

/// Reads one path-or-URL per line. Trailing whitespace is dropped, blank
/// lines are skipped, and lines that are not valid UTF-8 are collected as
/// errors without stopping the read.
pub fn read_link_list(path: &Path) -> Result<LinkListLines, MartError> {
    let content = std::fs::read(path).map_err(|e| MartError::LinkListRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut lines = LinkListLines::default();
    for (n, raw) in content.split(|b| *b == b'\n').enumerate() {
        match std::str::from_utf8(raw) {
            Ok(line) => {
                let line = line.trim_end();
                if !line.is_empty() {
                    lines.links.push(line.to_string());
                }
            }
            Err(e) => lines.decode_errors.push(LineDecodeError {
                line: n + 1,
                reason: e.to_string(),
            }),
        }
    }

    tracing::debug!(
        "Read {} links and {} undecodable lines from {}",
        lines.links.len(),
        lines.decode_errors.len(),
        path.display()
    );
    Ok(lines)
}
