//! Multi-selection view over several items' parameters.
//!
//! When more than one queue entry is selected, the editor shows one merged
//! set of values: fields on which the selection agrees carry the shared value,
//! fields on which it disagrees are [`FieldValue::Mixed`]. Edits made on the
//! merged view are written back to every selected item with
//! [`apply_field_to_selection`].

use super::formats::{DeduplicationType, InputFormat, OutputFormat};
use super::item::ItemParameters;

/// A field of the merged view.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue<T> {
    Concrete(T),
    Mixed,
}

impl<T: PartialEq> FieldValue<T> {
    fn fold(&mut self, value: &T) {
        if let FieldValue::Concrete(current) = self
            && current != value
        {
            *self = FieldValue::Mixed;
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, FieldValue::Mixed)
    }

    pub fn concrete(&self) -> Option<&T> {
        match self {
            FieldValue::Concrete(v) => Some(v),
            FieldValue::Mixed => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MergedView {
    /// Union of every selected item's skip list, in first-seen order.
    pub skip_list: Vec<String>,
    /// The selected skip lists were not all identical; shown muted.
    pub skip_list_is_mixed: bool,
    pub downloading_timeout: FieldValue<Option<u64>>,
    pub output_format: FieldValue<OutputFormat>,
    pub input_format: FieldValue<InputFormat>,
    pub deduplication_type: FieldValue<DeduplicationType>,
    pub output_path: FieldValue<String>,
    pub images_public_path: FieldValue<String>,
    pub images_dir_name: FieldValue<String>,
    pub remove_source: FieldValue<bool>,
    pub save_hierarchy: FieldValue<bool>,
    pub download_incorrect_mime: FieldValue<bool>,
    pub skip_all_incorrect: FieldValue<bool>,
}

impl MergedView {
    fn seed(first: &ItemParameters) -> Self {
        let sorted = sorted_skip_list(first);
        let mut skip_list = Vec::with_capacity(sorted.len());
        extend_unique(&mut skip_list, &sorted);
        // A list holding duplicates does not survive the set conversion.
        let skip_list_is_mixed = skip_list != sorted;

        Self {
            skip_list,
            skip_list_is_mixed,
            downloading_timeout: FieldValue::Concrete(first.downloading_timeout),
            output_format: FieldValue::Concrete(first.output_format),
            input_format: FieldValue::Concrete(first.input_format),
            deduplication_type: FieldValue::Concrete(first.deduplication_type),
            output_path: FieldValue::Concrete(first.output_path.clone()),
            images_public_path: FieldValue::Concrete(first.images_public_path.clone()),
            images_dir_name: FieldValue::Concrete(first.images_dir_name.clone()),
            remove_source: FieldValue::Concrete(first.remove_source),
            save_hierarchy: FieldValue::Concrete(first.save_hierarchy),
            download_incorrect_mime: FieldValue::Concrete(first.download_incorrect_mime),
            skip_all_incorrect: FieldValue::Concrete(first.skip_all_incorrect),
        }
    }

    fn fold(&mut self, item: &ItemParameters) {
        self.downloading_timeout.fold(&item.downloading_timeout);
        self.output_format.fold(&item.output_format);
        self.input_format.fold(&item.input_format);
        self.deduplication_type.fold(&item.deduplication_type);
        self.output_path.fold(&item.output_path);
        self.images_public_path.fold(&item.images_public_path);
        self.images_dir_name.fold(&item.images_dir_name);
        self.remove_source.fold(&item.remove_source);
        self.save_hierarchy.fold(&item.save_hierarchy);
        self.download_incorrect_mime.fold(&item.download_incorrect_mime);
        self.skip_all_incorrect.fold(&item.skip_all_incorrect);

        let sorted = sorted_skip_list(item);
        if self.skip_list != sorted {
            extend_unique(&mut self.skip_list, &sorted);
            self.skip_list_is_mixed = true;
        }
    }

    /// Skip list as editor text, one fragment per line.
    pub fn skip_list_text(&self) -> String {
        self.skip_list.join("\n")
    }
}

/// Builds the merged view of a selection. Returns `None` for an empty one.
///
/// The skip list is always presented sorted and without duplicates, so even
/// a single item's view can differ from its stored list in order. Every
/// scalar field of a single item comes back unchanged.
pub fn merge_for_display<'a, I>(items: I) -> Option<MergedView>
where
    I: IntoIterator<Item = &'a ItemParameters>,
{
    let mut items = items.into_iter();
    let mut view = MergedView::seed(items.next()?);
    for item in items {
        view.fold(item);
    }
    Some(view)
}

/// One edit made on the merged view.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldEdit {
    SkipList(Vec<String>),
    DownloadingTimeout(Option<u64>),
    OutputFormat(OutputFormat),
    InputFormat(InputFormat),
    DeduplicationType(DeduplicationType),
    OutputPath(String),
    ImagesPublicPath(String),
    ImagesDirName(String),
    RemoveSource(bool),
    SaveHierarchy(bool),
    DownloadIncorrectMime(bool),
    SkipAllIncorrect(bool),
}

impl FieldEdit {
    /// Skip list edited as free text: fragments are separated by whitespace.
    pub fn skip_list_from_text(text: &str) -> Self {
        FieldEdit::SkipList(text.split_whitespace().map(str::to_string).collect())
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            FieldEdit::SkipList(_) => "skip_list",
            FieldEdit::DownloadingTimeout(_) => "downloading_timeout",
            FieldEdit::OutputFormat(_) => "output_format",
            FieldEdit::InputFormat(_) => "input_format",
            FieldEdit::DeduplicationType(_) => "deduplication_type",
            FieldEdit::OutputPath(_) => "output_path",
            FieldEdit::ImagesPublicPath(_) => "images_public_path",
            FieldEdit::ImagesDirName(_) => "images_dir_name",
            FieldEdit::RemoveSource(_) => "remove_source",
            FieldEdit::SaveHierarchy(_) => "save_hierarchy",
            FieldEdit::DownloadIncorrectMime(_) => "download_incorrect_mime",
            FieldEdit::SkipAllIncorrect(_) => "skip_all_incorrect",
        }
    }

    fn apply(&self, item: &mut ItemParameters) {
        match self {
            FieldEdit::SkipList(v) => item.skip_list = v.clone(),
            FieldEdit::DownloadingTimeout(v) => item.downloading_timeout = *v,
            FieldEdit::OutputFormat(v) => item.output_format = *v,
            FieldEdit::InputFormat(v) => item.input_format = *v,
            FieldEdit::DeduplicationType(v) => item.deduplication_type = *v,
            FieldEdit::OutputPath(v) => item.output_path = v.clone(),
            FieldEdit::ImagesPublicPath(v) => item.images_public_path = v.clone(),
            FieldEdit::ImagesDirName(v) => item.images_dir_name = v.clone(),
            FieldEdit::RemoveSource(v) => item.remove_source = *v,
            FieldEdit::SaveHierarchy(v) => item.save_hierarchy = *v,
            FieldEdit::DownloadIncorrectMime(v) => item.download_incorrect_mime = *v,
            FieldEdit::SkipAllIncorrect(v) => item.skip_all_incorrect = *v,
        }
    }
}

/// Overwrites the edited field on every item. Returns how many were written.
pub fn apply_field_to_selection<'a, I>(edit: &FieldEdit, items: I) -> usize
where
    I: IntoIterator<Item = &'a mut ItemParameters>,
{
    let mut written = 0;
    for item in items {
        edit.apply(item);
        written += 1;
    }
    tracing::trace!(field = edit.field_name(), written, "Applied edit to selection");
    written
}

fn sorted_skip_list(item: &ItemParameters) -> Vec<String> {
    let mut sorted = item.skip_list.clone();
    sorted.sort();
    sorted
}

fn extend_unique(set: &mut Vec<String>, values: &[String]) {
    for v in values {
        if !set.contains(v) {
            set.push(v.clone());
        }
    }
}
