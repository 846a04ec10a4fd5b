//! Service-loader ports

pub mod report;

pub use report::{write_resolved_report, MemoryReport, ReportSink, TextReport};
