/*
 * Constant Propagation as an IFDS Problem
 *
 * Facts are whole `ValueMap`s. Flow functions:
 * - normal: statement transfer function
 * - call: static fields plus formals bound from actuals and receiver
 * - return: caller map, callee statics, receiver and mutable-argument
 *   write-back, result binding
 * - call-to-return: transfer function, only when no in-view callee returns
 *
 * A run is seeded at one entry method; per-run state (seeds, frame cache,
 * last map seen per method) lives in `RunContext`.
 */

use rustc_hash::FxHashMap;

use super::transfer::{RecognizedOp, StatementVisitor};
use crate::config::DynamicLoadTarget;
use crate::features::dataflow::{IFDSProblem, InterproceduralCfg};
use crate::features::program_view::{Icfg, ProgramView};
use crate::features::service_loader::domain::{
    AbstractValue, LoadCallMatcher, ValueHolder, ValueMap,
};
use crate::shared::models::{InvokeExpr, Local, MethodSignature, Place, Stmt, StmtId};

/// Locals bound by a method's identity statements
#[derive(Debug, Clone, Default)]
struct Frame {
    this: Option<Local>,
    params: Vec<Option<Local>>,
    /// Parameter locals the body assigns after binding
    rebound: Vec<bool>,
}

/// State of one solver run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    seeds: ValueMap,
    frames: FxHashMap<MethodSignature, Frame>,
    /// Last map produced inside each method
    known: FxHashMap<MethodSignature, ValueMap>,
}

impl RunContext {
    pub fn new(seeds: ValueMap) -> Self {
        Self {
            seeds,
            ..Self::default()
        }
    }

    pub fn seeds(&self) -> &ValueMap {
        &self.seeds
    }

    /// Last map produced inside `method`, if the run reached it
    pub fn known_facts(&self, method: &MethodSignature) -> Option<&ValueMap> {
        self.known.get(method)
    }

    fn remember(&mut self, method: &MethodSignature, map: &ValueMap) {
        self.known.insert(method.clone(), map.clone());
    }

    fn frame(&mut self, view: &ProgramView, method: &MethodSignature) -> Frame {
        self.frames
            .entry(method.clone())
            .or_insert_with(|| match view.body(method) {
                Some(body) => {
                    let params: Vec<Option<Local>> = (0..method.param_count())
                        .map(|i| body.parameter_local(i).cloned())
                        .collect();
                    let rebound = params
                        .iter()
                        .map(|param| param.as_ref().is_some_and(|p| assigns_local(&body.stmts, p)))
                        .collect();
                    Frame {
                        this: body.this_local().cloned(),
                        params,
                        rebound,
                    }
                }
                None => Frame::default(),
            })
            .clone()
    }
}

fn assigns_local(stmts: &[Stmt], local: &Local) -> bool {
    stmts
        .iter()
        .any(|stmt| matches!(stmt, Stmt::Assign { place: Place::Local(l), .. } if l == local))
}

/// Invokes the ICFG must not step into
///
/// Recognized library operations and the dynamic-load call itself are
/// handled by the transfer function.
pub fn opaque_invokes(target: &DynamicLoadTarget) -> impl Fn(&InvokeExpr) -> bool {
    let matcher = LoadCallMatcher::new(target.clone());
    move |invoke| RecognizedOp::classify(invoke).is_some() || matcher.matches(invoke)
}

pub struct ConstPropProblem<'a> {
    icfg: &'a Icfg,
    entry: MethodSignature,
    ctx: RunContext,
}

impl<'a> ConstPropProblem<'a> {
    pub fn new(icfg: &'a Icfg, entry: MethodSignature, seeds: ValueMap) -> Self {
        Self {
            icfg,
            entry,
            ctx: RunContext::new(seeds),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn into_context(self) -> RunContext {
        self.ctx
    }

    fn view(&self) -> &'a ProgramView {
        let icfg: &'a Icfg = self.icfg;
        icfg.view()
    }

    fn stmt(&self, id: &StmtId) -> Option<&'a Stmt> {
        self.view().stmt(id)
    }

    fn transfer(&mut self, id: &StmtId, fact: &ValueMap) -> ValueMap {
        let out = match self.stmt(id) {
            Some(stmt) => StatementVisitor::new(&id.method, self.view()).apply(fact, stmt),
            None => fact.clone(),
        };
        self.ctx.remember(&id.method, &out);
        out
    }

    /// Some in-view callee of `call_site` has a return statement
    fn has_returning_callee(&self, call_site: &StmtId) -> bool {
        let view = self.view();
        self.icfg.callees_of(call_site).iter().any(|callee| {
            view.body(callee)
                .is_some_and(|body| body.stmts.iter().any(Stmt::is_return))
        })
    }
}

impl IFDSProblem<ValueMap> for ConstPropProblem<'_> {
    fn initial_seeds(&mut self) -> Vec<(StmtId, ValueMap)> {
        self.icfg
            .start_points(&self.entry)
            .into_iter()
            .map(|start| (start, self.ctx.seeds.clone()))
            .collect()
    }

    fn normal_flow(&mut self, curr: &StmtId, _succ: &StmtId, fact: &ValueMap) -> Vec<ValueMap> {
        vec![self.transfer(curr, fact)]
    }

    fn call_flow(
        &mut self,
        call_site: &StmtId,
        callee: &MethodSignature,
        fact: &ValueMap,
    ) -> Vec<ValueMap> {
        let Some(invoke) = self.stmt(call_site).and_then(Stmt::invoke_expr) else {
            return Vec::new();
        };
        let view = self.view();
        let caller = StatementVisitor::new(&call_site.method, view);
        let frame = self.ctx.frame(view, callee);

        let mut out = fact.statics_only();
        for (arg, param) in invoke.args.iter().zip(&frame.params) {
            if let Some(param) = param {
                out.set_local(callee, param, caller.value_of(fact, arg));
            }
        }
        if let (Some(base), Some(this)) = (&invoke.base, &frame.this) {
            out.set_local(callee, this, fact.get_local(&call_site.method, base));
        }
        vec![out]
    }

    fn return_flow(
        &mut self,
        call_site: &StmtId,
        callee: &MethodSignature,
        exit: &StmtId,
        _return_site: &StmtId,
        caller_fact: &ValueMap,
        exit_fact: &ValueMap,
    ) -> Vec<ValueMap> {
        let Some(stmt) = self.stmt(call_site) else {
            return Vec::new();
        };
        let view = self.view();
        let frame = self.ctx.frame(view, callee);

        let mut out: ValueMap = caller_fact
            .iter()
            .filter(|(holder, _)| !holder.is_static_field())
            .map(|(h, v)| (h.clone(), v.clone()))
            .collect();
        for (field, value) in exit_fact.static_fields() {
            out.set(ValueHolder::static_field(field), value.clone());
        }

        if let (Some(base), Some(this)) = (
            stmt.invoke_expr().and_then(|i| i.base.as_ref()),
            &frame.this,
        ) {
            let receiver = exit_fact.get_local(callee, this);
            if matches!(receiver, AbstractValue::ObjectRef { .. }) {
                out.set_local(&call_site.method, base, receiver);
            }
        }

        // builders and objects the callee may have changed through a parameter
        if let Some(invoke) = stmt.invoke_expr() {
            let caller = StatementVisitor::new(&call_site.method, view);
            for (index, arg) in caller.mutable_arguments(caller_fact, invoke) {
                let Some(Some(param)) = frame.params.get(index) else {
                    continue;
                };
                let after = if frame.rebound.get(index).copied().unwrap_or(false) {
                    AbstractValue::Unknown
                } else {
                    exit_fact.get_local(callee, param)
                };
                out.set_local(&call_site.method, arg, after);
            }
        }

        if let Stmt::Assign { place, .. } = stmt {
            let returned = match self.stmt(exit) {
                Some(Stmt::Return(imm)) => {
                    StatementVisitor::new(callee, view).value_of(exit_fact, imm)
                }
                _ => AbstractValue::Unknown,
            };
            StatementVisitor::new(&call_site.method, view).write(&mut out, place, returned);
        }

        self.ctx.remember(&call_site.method, &out);
        vec![out]
    }

    fn call_to_return_flow(
        &mut self,
        call_site: &StmtId,
        _return_site: &StmtId,
        fact: &ValueMap,
    ) -> Vec<ValueMap> {
        if self.has_returning_callee(call_site) {
            return Vec::new();
        }
        vec![self.transfer(call_site, fact)]
    }
}
