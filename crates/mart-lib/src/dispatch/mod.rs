mod dispatcher;
mod types;

pub use dispatcher::TaskDispatcher;
pub use types::{BatchItem, DispatchEvent, FailureReason};
