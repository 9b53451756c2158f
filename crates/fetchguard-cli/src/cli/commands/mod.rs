//! CLI command handlers, one file per command.

mod aggregate;
mod api;
mod check;
mod fetch;
mod scrape;
mod stats;
mod summary;

pub use aggregate::run_aggregate;
pub use api::run_api;
pub use check::run_check;
pub use fetch::run_fetch;
pub use scrape::run_scrape;
pub use stats::run_stats;
pub use summary::run_summary;
