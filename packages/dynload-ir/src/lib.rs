/*
 * dynload-ir - Dynamic-load argument resolution for JVM bytecode IR
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : IR models (signatures, statements, bodies, classes)
 * - features/    : program_view → dataflow → service_loader
 * - config/      : Presets, YAML, validation
 *
 * Resolves the class arguments of `ServiceLoader.load` call sites with an
 * interprocedural constant propagation, so a linker can keep exactly the
 * service implementations that are actually requested.
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Flow functions take the full edge context
#![allow(clippy::type_complexity)] // Cached per-class results
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

pub use config::{AnalysisConfig, Preset};
pub use errors::{DynloadError, Result};
pub use features::program_view::{ClassPool, ProgramProvider, ProgramView};
pub use features::service_loader::{
    AbstractValue, BatchAnalyzer, BatchReport, ClassAnalysis, Diagnostic, DynamicLoadCall,
    EntryMethodWithCall, MemoryReport, ReportSink, ServiceLoaderResolver, TextReport,
};
