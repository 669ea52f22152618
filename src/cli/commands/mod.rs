//! CLI command implementations

pub mod cache;
pub mod classify;
pub mod config;
pub mod rewrite;

pub use cache::execute as cache;
pub use classify::execute as classify;
pub use config::execute as config;
pub use rewrite::execute as rewrite;
