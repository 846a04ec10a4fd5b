//! Interprocedural CFG over a program view
//!
//! Built from a set of entry methods: every in-view method reachable from
//! them through resolved call edges becomes part of the graph.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;

use super::view::ProgramView;
use crate::features::dataflow::InterproceduralCfg;
use crate::features::program_view::errors::{ViewError, ViewResult};
use crate::shared::models::{InvokeExpr, MethodSignature, StmtId};

pub struct Icfg {
    view: Arc<ProgramView>,
    methods: Vec<MethodSignature>,
    callees: FxHashMap<StmtId, Vec<MethodSignature>>,
    call_sites: FxHashSet<StmtId>,
}

impl Icfg {
    /// Build the graph reachable from `entries`
    ///
    /// Invokes for which `is_opaque` holds get no callees, so the solver
    /// handles them through call-to-return flow only.
    pub fn build<O>(
        view: Arc<ProgramView>,
        entries: &[MethodSignature],
        is_opaque: O,
    ) -> ViewResult<Self>
    where
        O: Fn(&InvokeExpr) -> bool,
    {
        let mut methods = Vec::new();
        let mut callees = FxHashMap::default();
        let mut call_sites = FxHashSet::default();
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();

        for entry in entries {
            if view.body(entry).is_none() {
                return Err(ViewError::MissingBody(entry.clone()));
            }
            if seen.insert(entry.clone()) {
                queue.push_back(entry.clone());
            }
        }

        while let Some(method) = queue.pop_front() {
            let Some(body) = view.body(&method) else {
                continue;
            };
            for (offset, stmt) in body.stmts.iter().enumerate() {
                let Some(invoke) = stmt.invoke_expr() else {
                    continue;
                };
                let site = StmtId::new(method.clone(), offset as u32);
                call_sites.insert(site.clone());
                if is_opaque(invoke) {
                    continue;
                }

                let targets: Vec<MethodSignature> = view
                    .resolve_invoke(invoke)?
                    .into_iter()
                    .filter(|target| view.body(target).is_some())
                    .collect();
                for target in &targets {
                    if seen.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                }
                if !targets.is_empty() {
                    callees.insert(site, targets);
                }
            }
            methods.push(method);
        }

        tracing::trace!(
            methods = methods.len(),
            call_edges = callees.len(),
            "ICFG built"
        );

        Ok(Self {
            view,
            methods,
            callees,
            call_sites,
        })
    }

    pub fn view(&self) -> &ProgramView {
        &self.view
    }

    /// Methods in the graph, in discovery order
    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn contains_method(&self, method: &MethodSignature) -> bool {
        self.methods.contains(method)
    }
}

impl InterproceduralCfg for Icfg {
    fn successors(&self, stmt: &StmtId) -> Vec<StmtId> {
        match self.view.body(&stmt.method) {
            Some(body) => body
                .successors(stmt.offset)
                .into_iter()
                .map(|offset| stmt.with_offset(offset))
                .collect(),
            None => Vec::new(),
        }
    }

    fn callees_of(&self, call_site: &StmtId) -> &[MethodSignature] {
        self.callees
            .get(call_site)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn callers_of(&self, method: &MethodSignature) -> Vec<StmtId> {
        let mut sites: Vec<StmtId> = self
            .callees
            .iter()
            .filter(|(_, targets)| targets.contains(method))
            .map(|(site, _)| site.clone())
            .collect();
        sites.sort();
        sites
    }

    fn start_points(&self, method: &MethodSignature) -> Vec<StmtId> {
        match self.view.body(method) {
            Some(body) if !body.is_empty() => vec![StmtId::new(method.clone(), 0)],
            _ => Vec::new(),
        }
    }

    fn is_exit(&self, stmt: &StmtId) -> bool {
        self.view
            .stmt(stmt)
            .map(|s| s.is_return())
            .unwrap_or(false)
    }

    fn is_call(&self, stmt: &StmtId) -> bool {
        self.call_sites.contains(stmt)
    }
}
