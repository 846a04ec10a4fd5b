//! Batch analysis over a class set
//!
//! Classes are independent, so they can be analyzed on a rayon pool.
//! Results are collected in input order; diagnostics reach the sink in
//! that order no matter how the work was scheduled.

use serde::Serialize;
use std::time::Instant;

use super::resolver::ServiceLoaderResolver;
use crate::config::AnalysisConfig;
use crate::errors::Result;
use crate::features::program_view::ProgramProvider;
use crate::features::service_loader::domain::{ClassAnalysis, ResolutionCounters};
use crate::features::service_loader::ports::ReportSink;
use crate::shared::models::ClassType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub counters: ResolutionCounters,
    pub classes_analyzed: usize,
    pub classes_skipped: usize,
    pub elapsed_ms: u64,
}

/// A class the batch could not load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedClass {
    pub class: ClassType,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// One entry per analyzed class, in input order
    pub analyses: Vec<ClassAnalysis>,
    pub skipped: Vec<SkippedClass>,
    pub summary: BatchSummary,
}

pub struct BatchAnalyzer<'p, P: ProgramProvider + ?Sized> {
    program: &'p P,
    resolver: ServiceLoaderResolver<'p, P>,
}

impl<'p, P: ProgramProvider + ?Sized> BatchAnalyzer<'p, P> {
    pub fn new(program: &'p P, config: AnalysisConfig) -> Self {
        Self {
            program,
            resolver: ServiceLoaderResolver::new(program, config),
        }
    }

    pub fn resolver(&self) -> &ServiceLoaderResolver<'p, P> {
        &self.resolver
    }

    /// Analyze every class of the program
    pub fn run_all(&self, sink: &mut dyn ReportSink) -> BatchReport {
        let classes = self.program.class_names();
        self.run(&classes, sink)
    }

    pub fn run(&self, classes: &[ClassType], sink: &mut dyn ReportSink) -> BatchReport {
        let start = Instant::now();
        tracing::info!(classes = classes.len(), "dynamic-load analysis started");

        let results = match self.analyze_parallel(classes) {
            Some(results) => results,
            None => classes
                .iter()
                .map(|class| self.resolver.analyze_class(class))
                .collect(),
        };

        let mut report = BatchReport::default();
        for (class, result) in classes.iter().zip(results) {
            match result {
                Ok(analysis) => {
                    for diagnostic in &analysis.diagnostics {
                        sink.report(diagnostic);
                    }
                    report.summary.counters += analysis.counters;
                    report.summary.classes_analyzed += 1;
                    report.analyses.push(analysis);
                }
                Err(e) => {
                    tracing::warn!(class = %class, error = %e, "class skipped");
                    report.summary.classes_skipped += 1;
                    report.skipped.push(SkippedClass {
                        class: class.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        if let Err(e) = sink.flush() {
            tracing::warn!(error = %e, "failed to flush report");
        }

        report.summary.elapsed_ms = start.elapsed().as_millis() as u64;
        let counters = &report.summary.counters;
        tracing::info!(
            literal = counters.literal,
            dataflow = counters.dataflow,
            unresolved = counters.unresolved,
            solver_failures = counters.solver_failures,
            analyzed = report.summary.classes_analyzed,
            skipped = report.summary.classes_skipped,
            elapsed_ms = report.summary.elapsed_ms,
            "dynamic-load analysis finished"
        );
        report
    }

    #[cfg(feature = "parallel")]
    fn analyze_parallel(&self, classes: &[ClassType]) -> Option<Vec<Result<ClassAnalysis>>> {
        use rayon::prelude::*;

        let config = self.resolver.config();
        if !config.parallel || classes.len() < 2 {
            return None;
        }
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_threads())
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!(error = %e, "thread pool unavailable, analyzing sequentially");
                return None;
            }
        };
        Some(pool.install(|| {
            classes
                .par_iter()
                .map(|class| self.resolver.analyze_class(class))
                .collect()
        }))
    }

    #[cfg(not(feature = "parallel"))]
    fn analyze_parallel(&self, _classes: &[ClassType]) -> Option<Vec<Result<ClassAnalysis>>> {
        None
    }
}
