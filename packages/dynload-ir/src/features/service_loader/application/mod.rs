//! Service-loader application layer: per-class resolution and batch runs

pub mod batch;
pub mod resolver;

pub use batch::{BatchAnalyzer, BatchReport, BatchSummary, SkippedClass};
pub use resolver::ServiceLoaderResolver;
