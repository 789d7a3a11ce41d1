use crate::params::{DeduplicationType, InputFormat, OutputFormat};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defaults: ItemDefaults,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

/// Parameters given to every newly queued item.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ItemDefaults {
    pub skip_list: Vec<String>,
    /// Seconds; a negative value (the historical `-1`) disables the timeout.
    pub downloading_timeout: Option<i64>,
    pub output_format: OutputFormat,
    pub input_format: InputFormat,
    pub deduplication_type: DeduplicationType,
    /// Falls back to the current directory.
    pub output_path: Option<String>,
    pub images_public_path: String,
    pub images_dir_name: String,
    pub remove_source: bool,
    pub save_hierarchy: bool,
    pub download_incorrect_mime: bool,
    pub skip_all_incorrect: bool,
}

impl ItemDefaults {
    pub fn downloading_timeout(&self) -> Option<u64> {
        self.downloading_timeout
            .and_then(|secs| u64::try_from(secs).ok())
    }
}

impl Default for ItemDefaults {
    fn default() -> Self {
        Self {
            skip_list: Vec::new(),
            downloading_timeout: None,
            output_format: OutputFormat::default(),
            input_format: InputFormat::default(),
            deduplication_type: DeduplicationType::default(),
            output_path: None,
            images_public_path: String::new(),
            images_dir_name: crate::params::ItemParameters::DEFAULT_IMAGES_DIR_NAME.to_string(),
            remove_source: false,
            save_hierarchy: false,
            download_incorrect_mime: false,
            skip_all_incorrect: false,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DispatcherConfig {
    /// Worker threads; defaults to the CPU count plus one.
    pub workers: Option<usize>,
}

impl DispatcherConfig {
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| num_cpus::get() + 1)
    }
}
