use super::formats::{DeduplicationType, InputFormat, OutputFormat};
use crate::config::ItemDefaults;
use std::path::{Path, PathBuf};

/// Conversion settings of one queued item, plus the result of its last run.
#[derive(Clone, Debug)]
pub struct ItemParameters {
    pub skip_list: Vec<String>,
    /// Seconds; `None` means the processor may wait forever.
    pub downloading_timeout: Option<u64>,
    pub output_format: OutputFormat,
    pub input_format: InputFormat,
    pub deduplication_type: DeduplicationType,
    pub output_path: String,
    pub images_public_path: String,
    pub images_dir_name: String,

    pub remove_source: bool,
    pub save_hierarchy: bool,
    pub download_incorrect_mime: bool,
    pub skip_all_incorrect: bool,

    // Written together, only through `mark_downloaded`.
    pub(crate) downloaded: bool,
    pub(crate) output_file_path: Option<PathBuf>,
}

impl ItemParameters {
    pub const DEFAULT_IMAGES_DIR_NAME: &'static str = "images";

    pub fn from_defaults(defaults: &ItemDefaults) -> Self {
        Self {
            skip_list: defaults.skip_list.clone(),
            downloading_timeout: defaults.downloading_timeout(),
            output_format: defaults.output_format,
            input_format: defaults.input_format,
            deduplication_type: defaults.deduplication_type,
            output_path: defaults
                .output_path
                .clone()
                .unwrap_or_else(current_dir_string),
            images_public_path: defaults.images_public_path.clone(),
            images_dir_name: defaults.images_dir_name.clone(),
            remove_source: defaults.remove_source,
            save_hierarchy: defaults.save_hierarchy,
            download_incorrect_mime: defaults.download_incorrect_mime,
            skip_all_incorrect: defaults.skip_all_incorrect,
            downloaded: false,
            output_file_path: None,
        }
    }

    pub fn downloaded(&self) -> bool {
        self.downloaded
    }

    pub fn output_file_path(&self) -> Option<&Path> {
        self.output_file_path.as_deref()
    }

    /// Records a successful run. Once set, the item stays downloaded.
    pub fn mark_downloaded(&mut self, output_file_path: PathBuf) {
        self.downloaded = true;
        self.output_file_path = Some(output_file_path);
    }
}

impl Default for ItemParameters {
    fn default() -> Self {
        Self::from_defaults(&ItemDefaults::default())
    }
}

fn current_dir_string() -> String {
    std::env::current_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| ".".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let p = ItemParameters::default();

        assert!(!p.downloaded());
        assert!(p.output_file_path().is_none());
        assert!(p.skip_list.is_empty());
        assert_eq!(p.downloading_timeout, None);
        assert_eq!(p.output_format, OutputFormat::Md);
        assert_eq!(p.deduplication_type, DeduplicationType::Disabled);
        assert_eq!(p.images_dir_name, "images");
        assert!(p.images_public_path.is_empty());
        assert!(!p.output_path.is_empty());
        assert!(!p.remove_source && !p.save_hierarchy);
        assert!(!p.download_incorrect_mime && !p.skip_all_incorrect);
    }

    #[test]
    fn test_mark_downloaded_sets_both_result_fields() {
        let mut p = ItemParameters::default();
        p.mark_downloaded(PathBuf::from("/out/article.md"));

        assert!(p.downloaded());
        assert_eq!(p.output_file_path(), Some(Path::new("/out/article.md")));

        p.mark_downloaded(PathBuf::from("/out/second.md"));
        assert!(p.downloaded());
        assert_eq!(p.output_file_path(), Some(Path::new("/out/second.md")));
    }

    #[test]
    fn test_from_defaults_uses_configured_values() {
        let defaults = ItemDefaults {
            output_path: Some("/articles".to_string()),
            downloading_timeout: Some(30),
            output_format: OutputFormat::Html,
            skip_list: vec!["ads".to_string()],
            remove_source: true,
            ..ItemDefaults::default()
        };
        let p = ItemParameters::from_defaults(&defaults);

        assert_eq!(p.output_path, "/articles");
        assert_eq!(p.downloading_timeout, Some(30));
        assert_eq!(p.output_format, OutputFormat::Html);
        assert_eq!(p.skip_list, vec!["ads".to_string()]);
        assert!(p.remove_source);
    }
}
