//! Normalized records shared by all adapters.

pub mod ranking;
pub mod report;
