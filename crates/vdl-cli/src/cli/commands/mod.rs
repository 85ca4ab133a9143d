//! CLI command handlers, one per file.

mod batch;
mod config;
mod get;
mod run;

pub use batch::run_batch;
pub use config::run_show_config;
pub use get::run_get;
