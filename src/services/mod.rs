//! Report location and orchestration.

pub mod locator;
pub mod orchestrator;
