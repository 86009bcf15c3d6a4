//! Command implementations.

mod export;
mod groups;
mod info;
mod query;
mod serve;
mod validate;

pub use export::run_export;
pub use groups::run_groups;
pub use info::run_info;
pub use query::run_query;
pub use serve::run_serve;
pub use validate::run_validate;
