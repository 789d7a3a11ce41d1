mod args;
mod check;
mod params;
mod resolved_command;
mod run;

pub use args::{Args, Command, ParameterOverrides, parse_args};
pub use check::{CheckedEntry, SourceKind, run_check};
pub use params::{CheckParams, RunParams};
pub use resolved_command::{ResolvedCommand, resolve_command};
pub use run::{ItemReport, RunReport, run_queue, run_queue_with};
