//! Command handlers.
//!
//! Handlers are thin: they take the composed [`CliContext`](crate::CliContext),
//! call into the server service or path helpers, and format the result for
//! the terminal.

pub mod clean_cache;
pub mod paths;
pub mod serve;
