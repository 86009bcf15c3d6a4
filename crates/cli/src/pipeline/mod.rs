//! Query session and statistics.

mod session;
mod stats;

pub use session::{apply_query_overrides, load_config, Session};
pub use stats::SessionStats;
