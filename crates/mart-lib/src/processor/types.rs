use crate::params::{DeduplicationType, InputFormat, ItemParameters, OutputFormat};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Failed to read source {source_path}: {reason}")]
    SourceRead { source_path: String, reason: String },

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Output format \"{format}\" is not supported by this processor")]
    UnsupportedFormat { format: OutputFormat },

    #[error("{0}")]
    Other(String),
}

/// Everything the processor needs to convert one source.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessRequest {
    pub article_file_path_or_url: String,
    pub skip_list: Vec<String>,
    pub downloading_timeout: Option<Duration>,
    pub output_format: OutputFormat,
    pub output_path: PathBuf,
    pub remove_source: bool,
    pub images_public_path: String,
    pub input_formats: Vec<InputFormat>,
    pub skip_all_incorrect: bool,
    pub download_incorrect_mime: bool,
    pub deduplication_type: DeduplicationType,
    pub images_dirname: String,
    pub save_hierarchy: bool,
}

impl ProcessRequest {
    pub fn new(source: &str, item: &ItemParameters) -> Self {
        Self {
            article_file_path_or_url: source.to_string(),
            skip_list: item.skip_list.clone(),
            downloading_timeout: item.downloading_timeout.map(Duration::from_secs),
            output_format: item.output_format,
            output_path: PathBuf::from(&item.output_path),
            remove_source: item.remove_source,
            images_public_path: item.images_public_path.clone(),
            // Every known reader stays enabled; the per-item selection is advisory.
            input_formats: InputFormat::ALL.to_vec(),
            skip_all_incorrect: item.skip_all_incorrect,
            download_incorrect_mime: item.download_incorrect_mime,
            deduplication_type: item.deduplication_type,
            images_dirname: item.images_dir_name.clone(),
            save_hierarchy: item.save_hierarchy,
        }
    }
}
