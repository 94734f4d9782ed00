//! CLI command handlers, one per file.

mod cat;
mod digest;
mod fetch;
mod stat;
mod sweep;

pub use cat::run_cat;
pub use digest::run_digest;
pub use fetch::run_fetch;
pub use stat::run_stat;
pub use sweep::run_sweep;
