//! Dynamic-load argument resolution
//!
//! Each call site escalates through increasingly expensive strategies:
//!
//! 1. class literal at the call site
//! 2. single-class run from the enclosing method, seeded with the
//!    constants the class's static initializer leaves in static fields
//! 3. runs from the callers of the enclosing method (class-local call
//!    graph), recursing while a caller's run stays inconclusive
//! 4. for inner classes: receivers built by the outer class's constructor
//!    calls seed `this` of the enclosing method. Runs when state 2 left
//!    unresolved facts at the site and state 3 added nothing; resolutions
//!    are attributed to the outer method that built the receiver
//! 5. unresolved, if no state found anything
//!
//! States 3 and 4 only run while state 2 is inconclusive.
//!
//! Failures never cross the per-call boundary. A run that cannot be built
//! becomes a `SolverUnavailable` diagnostic and the call escalates.

use rustc_hash::FxHashSet;
use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::errors::{DynloadError, Result};
use crate::features::dataflow::SolverLimits;
use crate::features::program_view::{
    CallGraphProvider, ClassCallGraph, ProgramProvider, ProgramView, ViewError, ViewResult,
};
use crate::features::service_loader::domain::{
    AbstractValue, ClassAnalysis, Diagnostic, DynamicLoadCall, EntryMethodWithCall,
    LoadCallMatcher, ValueMap,
};
use crate::features::service_loader::infrastructure::{opaque_invokes, CallOutcome, SolverRun};
use crate::shared::models::{ClassDef, ClassType, InvokeKind, MethodSignature, Stmt, StmtId};

/// Resolves the dynamic-load calls of one class at a time
pub struct ServiceLoaderResolver<'p, P: ProgramProvider + ?Sized> {
    program: &'p P,
    config: AnalysisConfig,
    matcher: LoadCallMatcher,
    limits: SolverLimits,
}

impl<'p, P: ProgramProvider + ?Sized> ServiceLoaderResolver<'p, P> {
    pub fn new(program: &'p P, config: AnalysisConfig) -> Self {
        let matcher = LoadCallMatcher::new(config.target.clone());
        let limits = SolverLimits::from(&config.solver);
        Self {
            program,
            config,
            matcher,
            limits,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Dynamic-load calls of a class, in method then statement order
    pub fn find_calls(&self, class: &ClassDef) -> Vec<DynamicLoadCall> {
        class
            .methods
            .iter()
            .filter_map(|m| m.body.as_ref().map(|b| self.matcher.scan(&m.signature, &b.stmts)))
            .flatten()
            .collect()
    }

    /// Resolve every dynamic-load call of `class`
    ///
    /// Errors only when the class itself cannot be loaded.
    pub fn analyze_class(&self, class: &ClassType) -> Result<ClassAnalysis> {
        let def = self.program.load_class(class).map_err(|e| match e {
            ViewError::ClassNotFound(name) => DynloadError::UnknownClass(name),
            ViewError::Malformed { class, message } => {
                DynloadError::parse_error(class.name(), message)
            }
            other => DynloadError::View(other),
        })?;
        let mut analysis = ClassAnalysis::new(class.clone());

        let calls = self.find_calls(&def);
        if calls.is_empty() {
            return Ok(analysis);
        }
        tracing::debug!(class = %class, calls = calls.len(), "resolving dynamic-load calls");

        let mut session = ClassSession::new(self, def);
        for call in &calls {
            session.resolve(call, &mut analysis);
        }
        Ok(analysis)
    }

    fn run(
        &self,
        view: Arc<ProgramView>,
        entry: &MethodSignature,
        seeds: ValueMap,
    ) -> ViewResult<SolverRun> {
        SolverRun::execute(view, entry, seeds, &self.config.target, self.limits)
    }

    fn run_for_call(
        &self,
        view: Arc<ProgramView>,
        entry: &MethodSignature,
        seeds: ValueMap,
        call: &DynamicLoadCall,
    ) -> ViewResult<CallOutcome> {
        Ok(self.run(view, entry, seeds)?.call_outcome(call))
    }

    /// Constant statics left by `clinit`; empty if no run can be built
    fn harvest(&self, view: Arc<ProgramView>, clinit: &MethodSignature) -> ValueMap {
        match self.run(view, clinit, ValueMap::new()) {
            Ok(run) => run.harvest_statics(clinit),
            Err(e) => {
                tracing::debug!(method = %clinit, error = %e, "static initializer not analyzable");
                ValueMap::new()
            }
        }
    }
}

/// Constructor receivers produced by the outer class, plus its statics
#[derive(Debug, Default)]
struct OuterContext {
    statics: ValueMap,
    /// Outer method that built the receiver, and the receiver
    receivers: Vec<(MethodSignature, AbstractValue)>,
}

/// Per-class caches shared by every call of the class
struct ClassSession<'r, 'p, P: ProgramProvider + ?Sized> {
    resolver: &'r ServiceLoaderResolver<'p, P>,
    class: Arc<ClassDef>,
    view: Option<ViewResult<Arc<ProgramView>>>,
    clinit_seeds: Option<ValueMap>,
    call_graph: Option<ViewResult<Arc<ClassCallGraph>>>,
    outer: Option<ViewResult<Arc<OuterContext>>>,
}

/// What the dataflow states found for one call
#[derive(Default)]
struct Findings {
    found: Vec<EntryMethodWithCall>,
    failure: Option<ViewError>,
}

impl Findings {
    fn add(&mut self, entry: &MethodSignature, calls: Vec<DynamicLoadCall>) {
        for call in calls {
            let resolved = EntryMethodWithCall::new(entry.clone(), call);
            if !self.found.contains(&resolved) {
                self.found.push(resolved);
            }
        }
    }

    fn fail(&mut self, error: ViewError) {
        tracing::debug!(error = %error, "solver unavailable");
        self.failure.get_or_insert(error);
    }
}

impl<'r, 'p, P: ProgramProvider + ?Sized> ClassSession<'r, 'p, P> {
    fn new(resolver: &'r ServiceLoaderResolver<'p, P>, class: Arc<ClassDef>) -> Self {
        Self {
            resolver,
            class,
            view: None,
            clinit_seeds: None,
            call_graph: None,
            outer: None,
        }
    }

    fn config(&self) -> &AnalysisConfig {
        &self.resolver.config
    }

    fn class_view(&mut self) -> ViewResult<Arc<ProgramView>> {
        let program = self.resolver.program;
        let class = &self.class.ty;
        self.view
            .get_or_insert_with(|| program.build_view(std::slice::from_ref(class)).map(Arc::new))
            .clone()
    }

    fn clinit_seeds(&mut self) -> ValueMap {
        if let Some(seeds) = &self.clinit_seeds {
            return seeds.clone();
        }
        let clinit = self
            .class
            .static_initializer()
            .filter(|m| m.is_concrete())
            .map(|m| m.signature.clone());
        let seeds = match (clinit, self.class_view()) {
            (Some(clinit), Ok(view)) => self.resolver.harvest(view, &clinit),
            _ => ValueMap::new(),
        };
        tracing::trace!(class = %self.class.ty, seeds = seeds.len(), "static initializer seeds");
        self.clinit_seeds = Some(seeds.clone());
        seeds
    }

    fn call_graph(&mut self) -> ViewResult<Arc<ClassCallGraph>> {
        if let Some(graph) = &self.call_graph {
            return graph.clone();
        }
        let graph = self.class_view().and_then(|view| {
            ClassCallGraph::build(&view, opaque_invokes(&self.resolver.config.target)).map(Arc::new)
        });
        self.call_graph = Some(graph.clone());
        graph
    }

    fn resolve(&mut self, call: &DynamicLoadCall, analysis: &mut ClassAnalysis) {
        let method = call.method().clone();

        if call.has_constant_arguments() {
            tracing::trace!(call = %call, "class literal argument");
            analysis.counters.literal += 1;
            analysis.record(&method, EntryMethodWithCall::new(method.clone(), call.clone()));
            return;
        }

        let mut findings = Findings::default();
        let seeds = self.clinit_seeds();
        let conclusive = self.resolve_in_method(call, &seeds, &mut findings);

        let mut from_callers = false;
        if !conclusive && self.config().caller_backtracking {
            from_callers = self.resolve_from_callers(call, &seeds, &mut findings);
        }
        // facts still unresolved at the site may come from the outer class
        if !conclusive && !from_callers && self.config().outer_class_threading {
            self.resolve_from_outer_class(call, &seeds, &mut findings);
        }

        if let Some(error) = findings.failure {
            analysis.counters.solver_failures += 1;
            analysis.diagnostics.push(Diagnostic::SolverUnavailable {
                class: self.class.ty.clone(),
                call: call.clone(),
                reason: error.to_string(),
            });
        }

        if findings.found.is_empty() {
            tracing::debug!(class = %self.class.ty, call = %call, "dynamic-load call unresolved");
            analysis.counters.unresolved += 1;
            if !analysis.diagnostics.iter().any(|d| d.call() == call) {
                analysis.diagnostics.push(Diagnostic::Unresolved {
                    class: self.class.ty.clone(),
                    call: call.clone(),
                });
            }
            return;
        }

        analysis.counters.dataflow += 1;
        for resolved in findings.found {
            analysis.record(&method, resolved);
        }
    }

    /// Run from the enclosing method; true if every fact resolves the call
    fn resolve_in_method(
        &mut self,
        call: &DynamicLoadCall,
        seeds: &ValueMap,
        findings: &mut Findings,
    ) -> bool {
        let method = call.method();
        let outcome = self
            .class_view()
            .and_then(|view| self.resolver.run_for_call(view, method, seeds.clone(), call));
        match outcome {
            Ok(outcome) => {
                let conclusive = outcome.is_conclusive();
                tracing::trace!(
                    call = %call,
                    resolved = outcome.resolved.len(),
                    facts = outcome.facts,
                    "enclosing-method run"
                );
                findings.add(method, outcome.resolved);
                conclusive
            }
            Err(e) => {
                findings.fail(e);
                false
            }
        }
    }

    /// Runs from the callers; true if they added any resolution
    fn resolve_from_callers(
        &mut self,
        call: &DynamicLoadCall,
        seeds: &ValueMap,
        findings: &mut Findings,
    ) -> bool {
        let (view, graph) = match self.class_view().and_then(|v| Ok((v, self.call_graph()?))) {
            Ok(pair) => pair,
            Err(e) => {
                findings.fail(e);
                return false;
            }
        };
        let before = findings.found.len();
        tracing::debug!(call = %call, "backtracking through callers");

        let mut search = CallerSearch {
            graph: &graph,
            max_depth: self.config().max_backtrack_depth,
            max_visited: self.config().max_visited_methods,
            visited: FxHashSet::default(),
            findings,
        };
        search.visited.insert(call.method().clone());
        let run = |entry: &MethodSignature| {
            self.resolver.run_for_call(view.clone(), entry, seeds.clone(), call)
        };
        search.walk(call.method(), 1, &run);
        search.findings.found.len() > before
    }

    fn outer_context(&mut self) -> ViewResult<Arc<OuterContext>> {
        if let Some(ctx) = &self.outer {
            return ctx.clone();
        }
        let ctx = self.build_outer_context().map(Arc::new);
        self.outer = Some(ctx.clone());
        ctx
    }

    fn build_outer_context(&self) -> ViewResult<OuterContext> {
        let Some(outer) = self.class.outer_class.clone() else {
            return Ok(OuterContext::default());
        };
        let program = self.resolver.program;
        if !program.contains(&outer) {
            return Ok(OuterContext::default());
        }
        let inner = &self.class.ty;
        let view = Arc::new(program.build_view(&[outer.clone(), inner.clone()])?);
        let Some(outer_def) = view.class(&outer) else {
            return Ok(OuterContext::default());
        };

        let statics = match outer_def.static_initializer().filter(|m| m.is_concrete()) {
            Some(clinit) => self.resolver.harvest(view.clone(), &clinit.signature),
            None => ValueMap::new(),
        };

        // (method, offset, receiver local) of every `new Inner(..)` in the outer class
        let mut sites = Vec::new();
        for method in &outer_def.methods {
            let Some(body) = &method.body else { continue };
            for (offset, stmt) in body.stmts.iter().enumerate() {
                if let Stmt::Invoke(invoke) = stmt {
                    if invoke.kind == InvokeKind::Special
                        && invoke.method.is_constructor()
                        && &invoke.method.class == inner
                    {
                        if let Some(base) = &invoke.base {
                            sites.push((method.signature.clone(), offset as u32, base.clone()));
                        }
                    }
                }
            }
        }

        let mut ctx = OuterContext {
            statics,
            receivers: Vec::new(),
        };
        let mut last_error = None;
        for (method, offset, base) in sites {
            let run = match self.resolver.run(view.clone(), &method, ctx.statics.clone()) {
                Ok(run) => run,
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            };
            for fact in run.facts_after(&StmtId::new(method.clone(), offset)) {
                let receiver = fact.get_local(&method, &base);
                if matches!(receiver, AbstractValue::ObjectRef { .. })
                    && !ctx.receivers.iter().any(|(_, known)| known == &receiver)
                {
                    ctx.receivers.push((method.clone(), receiver));
                }
            }
        }

        match last_error {
            Some(e) if ctx.receivers.is_empty() => Err(e),
            _ => Ok(ctx),
        }
    }

    fn resolve_from_outer_class(
        &mut self,
        call: &DynamicLoadCall,
        seeds: &ValueMap,
        findings: &mut Findings,
    ) {
        if !self.class.is_inner_class() {
            return;
        }
        let (view, ctx) = match self.class_view().and_then(|v| Ok((v, self.outer_context()?))) {
            Ok(pair) => pair,
            Err(e) => {
                findings.fail(e);
                return;
            }
        };
        if ctx.receivers.is_empty() {
            return;
        }
        tracing::debug!(
            call = %call,
            receivers = ctx.receivers.len(),
            "threading outer-class receivers"
        );

        let method = call.method();
        let this = self
            .class
            .method(method)
            .and_then(|m| m.body.as_ref())
            .and_then(|b| b.this_local())
            .cloned();

        for (constructed_in, receiver) in &ctx.receivers {
            let mut entry_seeds = ctx.statics.clone();
            entry_seeds.overlay(seeds);
            if let Some(this) = &this {
                entry_seeds.set_local(method, this, receiver.clone());
            }
            match self.resolver.run_for_call(view.clone(), method, entry_seeds, call) {
                Ok(outcome) => findings.add(constructed_in, outcome.resolved),
                Err(e) => findings.fail(e),
            }
        }
    }
}

/// Bounded walk up the class-local call graph
struct CallerSearch<'a> {
    graph: &'a ClassCallGraph,
    max_depth: usize,
    max_visited: usize,
    visited: FxHashSet<MethodSignature>,
    findings: &'a mut Findings,
}

impl CallerSearch<'_> {
    fn walk<F>(&mut self, target: &MethodSignature, depth: usize, run: &F)
    where
        F: Fn(&MethodSignature) -> ViewResult<CallOutcome>,
    {
        if depth > self.max_depth {
            return;
        }
        for caller in self.graph.callers_of(target) {
            if self.visited.len() >= self.max_visited {
                tracing::debug!(limit = self.max_visited, "visited-method limit reached");
                return;
            }
            if !self.visited.insert(caller.clone()) || caller.is_static_initializer() {
                continue;
            }
            match run(&caller) {
                Ok(outcome) => {
                    let conclusive = outcome.is_conclusive();
                    self.findings.add(&caller, outcome.resolved);
                    if !conclusive {
                        self.walk(&caller, depth + 1, run);
                    }
                }
                Err(e) => self.findings.fail(e),
            }
        }
    }
}
