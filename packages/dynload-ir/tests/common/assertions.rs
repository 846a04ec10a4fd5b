//! Assertions over class analyses

use dynload_ir::shared::models::MethodSignature;
use dynload_ir::{AbstractValue, ClassAnalysis, Diagnostic};

/// First-argument value of every resolved call under `method`
pub fn resolved_values(analysis: &ClassAnalysis, method: &MethodSignature) -> Vec<AbstractValue> {
    analysis
        .calls_for(method)
        .iter()
        .filter_map(|entry| entry.call.values().next().cloned())
        .collect()
}

/// Entry methods whose runs resolved the calls under `method`
pub fn entry_names(analysis: &ClassAnalysis, method: &MethodSignature) -> Vec<String> {
    analysis
        .calls_for(method)
        .iter()
        .map(|entry| entry.entry.name.to_string())
        .collect()
}

pub fn assert_resolves_to(analysis: &ClassAnalysis, method: &MethodSignature, classes: &[&str]) {
    let expected: Vec<AbstractValue> = classes.iter().map(AbstractValue::class).collect();
    assert_eq!(
        resolved_values(analysis, method),
        expected,
        "resolutions of {} in {}",
        method,
        analysis.class
    );
}

pub fn assert_unresolved(analysis: &ClassAnalysis) {
    assert!(
        analysis.is_empty(),
        "expected no resolutions in {}, got {:?}",
        analysis.class,
        analysis.resolutions
    );
    assert_eq!(analysis.counters.unresolved, 1);
}

pub fn unresolved_diagnostics(analysis: &ClassAnalysis) -> usize {
    analysis
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::Unresolved { .. }))
        .count()
}

pub fn solver_diagnostics(analysis: &ClassAnalysis) -> usize {
    analysis
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::SolverUnavailable { .. }))
        .count()
}
