mod formats;
mod item;
mod merge;

pub use formats::{DeduplicationType, InputFormat, OutputFormat};
pub use item::ItemParameters;
pub use merge::{FieldEdit, FieldValue, MergedView, apply_field_to_selection, merge_for_display};
