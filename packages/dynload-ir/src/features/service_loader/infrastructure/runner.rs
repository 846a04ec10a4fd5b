//! One solver run: ICFG from a single entry, seeded, solved

use std::sync::Arc;

use super::problem::{opaque_invokes, ConstPropProblem, RunContext};
use crate::config::DynamicLoadTarget;
use crate::features::dataflow::{IFDSSolver, IFDSSolverResult, SolverLimits};
use crate::features::program_view::{Icfg, ProgramView, ViewResult};
use crate::features::service_loader::domain::{DynamicLoadCall, ValueHolder, ValueMap};
use crate::shared::models::{MethodSignature, StmtId};

/// Facts at a dynamic-load call site, read back as calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOutcome {
    /// Distinct resolved calls, in fact discovery order
    pub resolved: Vec<DynamicLoadCall>,
    /// Facts reaching the call site
    pub facts: usize,
    /// Facts under which a required argument stayed unknown
    pub unresolved_facts: usize,
}

impl CallOutcome {
    /// The site was reached and every fact there resolves the call
    pub fn is_conclusive(&self) -> bool {
        self.facts > 0 && self.unresolved_facts == 0
    }
}

pub struct SolverRun {
    icfg: Icfg,
    result: IFDSSolverResult<ValueMap>,
    context: RunContext,
}

impl SolverRun {
    pub fn execute(
        view: Arc<ProgramView>,
        entry: &MethodSignature,
        seeds: ValueMap,
        target: &DynamicLoadTarget,
        limits: SolverLimits,
    ) -> ViewResult<Self> {
        let icfg = Icfg::build(view, std::slice::from_ref(entry), opaque_invokes(target))?;
        let mut problem = ConstPropProblem::new(&icfg, entry.clone(), seeds);
        let result = IFDSSolver::with_limits(&mut problem, &icfg, limits).solve();
        let context = problem.into_context();

        tracing::debug!(
            entry = %entry,
            methods = icfg.methods().len(),
            path_edges = result.stats.num_path_edges,
            iterations = result.stats.num_iterations,
            truncated = result.stats.truncated,
            "solver run finished"
        );

        Ok(Self {
            icfg,
            result,
            context,
        })
    }

    pub fn icfg(&self) -> &Icfg {
        &self.icfg
    }

    pub fn result(&self) -> &IFDSSolverResult<ValueMap> {
        &self.result
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn facts_at(&self, stmt: &StmtId) -> &[ValueMap] {
        self.result.results_at(stmt)
    }

    /// Facts holding right after `stmt`
    pub fn facts_after(&self, stmt: &StmtId) -> Vec<ValueMap> {
        self.result.results_after(&self.icfg, stmt)
    }

    pub fn call_outcome(&self, call: &DynamicLoadCall) -> CallOutcome {
        let mut outcome = CallOutcome::default();
        for fact in self.facts_at(&call.site) {
            outcome.facts += 1;
            let candidate = call.with_values_from(fact);
            if !candidate.is_resolved() {
                outcome.unresolved_facts += 1;
            } else if !outcome.resolved.contains(&candidate) {
                outcome.resolved.push(candidate);
            }
        }
        outcome
    }

    /// Constant static fields at the returns of `method`
    ///
    /// The first value seen for a field wins. When no return was reached,
    /// falls back to the last map the run produced inside `method`.
    pub fn harvest_statics(&self, method: &MethodSignature) -> ValueMap {
        let mut seeds = ValueMap::new();
        let exits: Vec<StmtId> = self
            .icfg
            .view()
            .body(method)
            .map(|body| {
                body.exit_offsets()
                    .into_iter()
                    .map(|offset| StmtId::new(method.clone(), offset))
                    .collect()
            })
            .unwrap_or_default();

        let mut reached = false;
        for exit in &exits {
            for fact in self.facts_at(exit) {
                reached = true;
                keep_constant_statics(&mut seeds, fact);
            }
        }
        if !reached {
            if let Some(fact) = self.context.known_facts(method) {
                keep_constant_statics(&mut seeds, fact);
            }
        }
        seeds
    }
}

fn keep_constant_statics(seeds: &mut ValueMap, fact: &ValueMap) {
    let constants: ValueMap = fact
        .static_fields()
        .filter(|(_, value)| value.is_constant())
        .map(|(field, value)| (ValueHolder::static_field(field), value.clone()))
        .collect();
    seeds.fill_missing(&constants);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::service_loader::domain::AbstractValue;
    use crate::shared::models::{
        Body, ClassDef, ClassType, Constant, Expr, FieldSignature, Immediate, MethodDef, Place,
        Stmt, Type,
    };

    fn clinit() -> MethodSignature {
        MethodSignature::new("a.A", "<clinit>", vec![], Type::Void)
    }

    fn field(name: &str) -> FieldSignature {
        FieldSignature::new("a.A", name, Type::object("java.lang.Object"))
    }

    fn store(name: &str, value: Constant) -> Stmt {
        Stmt::Assign {
            place: Place::StaticField(field(name)),
            value: Expr::Immediate(Immediate::Constant(value)),
        }
    }

    fn view_with(stmts: Vec<Stmt>) -> Arc<ProgramView> {
        let mut class = ClassDef::new(ClassType::new("a.A"));
        class.methods = vec![MethodDef::new(clinit(), true, Some(Body::new(vec![], stmts)))];
        Arc::new(ProgramView::new(vec![Arc::new(class)]))
    }

    fn run(view: Arc<ProgramView>) -> SolverRun {
        SolverRun::execute(
            view,
            &clinit(),
            ValueMap::new(),
            &DynamicLoadTarget::default(),
            SolverLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_harvest_keeps_constants_only() {
        let run = run(view_with(vec![
            store("SVC", Constant::class("a/Impl")),
            store("NAME", Constant::string("a.Impl")),
            store("COUNT", Constant::Int(3)),
            Stmt::ReturnVoid,
        ]));
        let seeds = run.harvest_statics(&clinit());
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds.get_static(&field("SVC")), AbstractValue::class("a/Impl"));
        assert_eq!(seeds.get_static(&field("NAME")), AbstractValue::string("a.Impl"));
    }

    #[test]
    fn test_harvest_without_reachable_return_uses_last_map() {
        // loops forever after the store
        let run = run(view_with(vec![
            store("SVC", Constant::class("a/Impl")),
            Stmt::Goto { target: 1 },
            Stmt::ReturnVoid,
        ]));
        let seeds = run.harvest_statics(&clinit());
        assert_eq!(seeds.get_static(&field("SVC")), AbstractValue::class("a/Impl"));
    }
}
