//! CLI command implementations.

mod config;
mod doctor;
mod ingest;
mod mcp;
mod preview;
mod search;
mod stats;

pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use mcp::run_mcp;
pub use preview::run_preview;
pub use search::run_search;
pub use stats::run_stats;
