//! Per-class analysis results

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use super::load_call::{DynamicLoadCall, EntryMethodWithCall};
use crate::shared::models::{ClassType, MethodSignature};

/// Something the report sink should hear about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No solver could be built for the call (scope resolution failed)
    SolverUnavailable {
        class: ClassType,
        call: DynamicLoadCall,
        reason: String,
    },
    /// Every resolution state came back without constants
    Unresolved {
        class: ClassType,
        call: DynamicLoadCall,
    },
}

impl Diagnostic {
    pub fn class(&self) -> &ClassType {
        match self {
            Diagnostic::SolverUnavailable { class, .. } | Diagnostic::Unresolved { class, .. } => {
                class
            }
        }
    }

    pub fn call(&self) -> &DynamicLoadCall {
        match self {
            Diagnostic::SolverUnavailable { call, .. } | Diagnostic::Unresolved { call, .. } => {
                call
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionCounters {
    /// Calls with a class literal at the call site
    pub literal: usize,
    /// Calls resolved by one of the dataflow states
    pub dataflow: usize,
    pub unresolved: usize,
    pub solver_failures: usize,
}

impl AddAssign for ResolutionCounters {
    fn add_assign(&mut self, other: Self) {
        self.literal += other.literal;
        self.dataflow += other.dataflow;
        self.unresolved += other.unresolved;
        self.solver_failures += other.solver_failures;
    }
}

/// Resolved calls of one enclosing method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResolution {
    pub method: MethodSignature,
    pub calls: Vec<EntryMethodWithCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAnalysis {
    pub class: ClassType,
    /// Enclosing methods in the order their first call was resolved
    pub resolutions: Vec<MethodResolution>,
    pub diagnostics: Vec<Diagnostic>,
    pub counters: ResolutionCounters,
}

impl ClassAnalysis {
    pub fn new(class: ClassType) -> Self {
        Self {
            class,
            resolutions: Vec::new(),
            diagnostics: Vec::new(),
            counters: ResolutionCounters::default(),
        }
    }

    /// Add a resolved call under `method`; false if an equal call is there
    pub fn record(&mut self, method: &MethodSignature, entry: EntryMethodWithCall) -> bool {
        let idx = match self.resolutions.iter().position(|r| &r.method == method) {
            Some(idx) => idx,
            None => {
                self.resolutions.push(MethodResolution {
                    method: method.clone(),
                    calls: Vec::new(),
                });
                self.resolutions.len() - 1
            }
        };
        let calls = &mut self.resolutions[idx].calls;
        if calls.contains(&entry) {
            return false;
        }
        calls.push(entry);
        true
    }

    pub fn calls_for(&self, method: &MethodSignature) -> &[EntryMethodWithCall] {
        self.resolutions
            .iter()
            .find(|r| &r.method == method)
            .map(|r| r.calls.as_slice())
            .unwrap_or(&[])
    }

    pub fn resolved_calls(&self) -> impl Iterator<Item = &EntryMethodWithCall> {
        self.resolutions.iter().flat_map(|r| r.calls.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.resolutions.is_empty()
    }
}
