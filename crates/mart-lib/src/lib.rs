pub mod app;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod params;
pub mod processor;
pub mod queue;
pub mod utils;

pub use app::{AppLogic, BatchObserver, BatchSummary};
pub use config::Config;
pub use error::MartError;
