use crate::params::ItemParameters;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// One unit of work: a source, the queue row it came from, and a snapshot of
/// its parameters taken at submit time.
#[derive(Clone, Debug)]
pub struct BatchItem {
    pub identifier: String,
    pub index: usize,
    pub parameters: ItemParameters,
}

impl BatchItem {
    pub fn new(identifier: impl Into<String>, index: usize, parameters: ItemParameters) -> Self {
        Self {
            identifier: identifier.into(),
            index,
            parameters,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum FailureReason {
    /// The processor returned without producing a document.
    NoOutput,
    Processor(String),
    Panicked(String),
    /// Stopped before it started.
    Cancelled,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NoOutput => f.write_str("no document was produced"),
            FailureReason::Processor(reason) => write!(f, "processor error: {reason}"),
            FailureReason::Panicked(reason) => write!(f, "processor panicked: {reason}"),
            FailureReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Messages pushed by pool workers to the orchestrating thread.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchEvent {
    ItemSucceeded {
        index: usize,
        output_path: PathBuf,
    },
    ItemFailed {
        index: usize,
        output_path: Option<PathBuf>,
        reason: FailureReason,
    },
    /// Sent once per batch, after every item event of that batch.
    BatchDone { batch: u64 },
}
