//! CLI library components for data-tools.

pub mod logging;
pub mod output;
