//! Normalizes security-scanner report files into one vulnerability schema.
//!
//! Given a directory, the [`ReportOrchestrator`] locates candidate report
//! files, asks each registered adapter whether it owns them, gates parsing
//! on the producing tool's version, and returns a [`Report`] whose findings
//! share the four-level [`Ranking`] scale.

pub mod config;
pub mod errors;
pub mod models;
pub mod parsers;
pub mod services;

pub use errors::ReportError;
pub use models::ranking::Ranking;
pub use models::report::{HttpTransaction, Metadata, Report, Vulnerability};
pub use parsers::{Parser, ParserRegistry};
pub use services::orchestrator::{ParseOptions, ReportOrchestrator};
