//! Batch downloader for whole-slide image files.
//!
//! Reads a newline-delimited URL list, skips every URL whose file is already
//! in the target directory and fetches the rest with a bounded pool of
//! workers through the best transport the host offers.

pub mod cancel;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod filter;
pub mod logging;
pub mod report;
pub mod storage;
pub mod task;
pub mod transport;
pub mod url_list;
pub mod url_model;

pub use cancel::CancelToken;
pub use driver::{Driver, RunConfig, RunEvent, RunOutcome, RunSummary};
pub use error::RunError;
