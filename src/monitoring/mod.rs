//! Reporting Module
//!
//! Provides the logging capability passed into each staging component.
//!
//! # Components
//!
//! - [`Reporter`]: event sink trait
//! - [`LogReporter`]: forwards to the `log` facade
//! - [`RecordingReporter`]: in-memory trail for tests and audits

pub mod reporter;

pub use reporter::{LogReporter, RecordingReporter, ReportEntry, Reporter, Severity};
