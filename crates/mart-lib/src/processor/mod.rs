mod passthrough;
mod types;

pub use passthrough::PassthroughProcessor;
pub use types::{ProcessRequest, ProcessorError};

use std::path::PathBuf;

/// Converts one source into a document on disk.
///
/// Implementations are called from pool threads and block until the document
/// is written. `Ok(None)` means the processor finished without producing a
/// file, which the dispatcher reports as a failure.
pub trait ArticleProcessor: Send + Sync {
    fn process(&self, request: &ProcessRequest) -> Result<Option<PathBuf>, ProcessorError>;
}

impl<F> ArticleProcessor for F
where
    F: Fn(&ProcessRequest) -> Result<Option<PathBuf>, ProcessorError> + Send + Sync,
{
    fn process(&self, request: &ProcessRequest) -> Result<Option<PathBuf>, ProcessorError> {
        self(request)
    }
}
