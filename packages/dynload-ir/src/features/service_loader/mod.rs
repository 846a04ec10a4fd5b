// Service-loader argument resolution
//
// - domain: abstract values, value holders, fact maps, load-call model
// - infrastructure: transfer function, IFDS problem, solver runs
// - application: resolution driver, batch runner
// - ports: report sinks

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{BatchAnalyzer, BatchReport, BatchSummary, ServiceLoaderResolver};
pub use domain::{
    AbstractValue, ClassAnalysis, Diagnostic, DynamicLoadCall, EntryMethodWithCall,
    ResolutionCounters, ValueHolder, ValueMap,
};
pub use ports::{write_resolved_report, MemoryReport, ReportSink, TextReport};
