/*
 * IFDS Tabulation Algorithm (Solver)
 *
 * Implements the worklist-based tabulation algorithm from:
 * Reps, Horwitz, Sagiv (1995): "Precise Interprocedural Dataflow Analysis via Graph Reachability"
 *
 * Algorithm Overview:
 * 1. Initialize worklist with seed facts
 * 2. Pop path edge (d1, n, d2) from worklist
 * 3. Call statement:
 *    - call flow into every callee entry, recording the incoming context
 *    - apply end summaries already known for (callee, d3)
 *    - call-to-return flow to every return site
 * 4. Exit statement:
 *    - record end summary (method, d1) -> (exit, d2)
 *    - return flow to every incoming context recorded so far
 * 5. Any other statement: normal flow to every successor
 * 6. Repeat until worklist empty (fixpoint) or a limit is hit
 *
 * Recording both incoming contexts and end summaries connects a callee exit
 * with its callers regardless of which of the two is discovered first.
 */

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::time::Instant;

use super::ifds_framework::{
    DataflowFact, EndSummary, IFDSProblem, IFDSStatistics, IncomingCall, InterproceduralCfg,
    PathEdge,
};
use crate::config::SolverConfig;
use crate::shared::models::{MethodSignature, StmtId};

/// Bounds for a single solver run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverLimits {
    pub max_iterations: usize,
    pub max_facts_per_stmt: usize,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self::from(&SolverConfig::default())
    }
}

impl From<&SolverConfig> for SolverLimits {
    fn from(config: &SolverConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            max_facts_per_stmt: config.max_facts_per_stmt,
        }
    }
}

/// IFDS Tabulation Solver
///
/// Usage:
/// ```text
/// let result = IFDSSolver::new(&mut problem, &icfg).solve();
/// let facts = result.results_at(&call_site);
/// ```
pub struct IFDSSolver<'a, F, P, G>
where
    F: DataflowFact,
    P: IFDSProblem<F>,
    G: InterproceduralCfg,
{
    problem: &'a mut P,
    icfg: &'a G,
    limits: SolverLimits,

    /// Every path edge seen so far
    path_edges: FxHashSet<PathEdge<F>>,

    /// Distinct facts per statement, in discovery order
    facts_at: FxHashMap<StmtId, Vec<F>>,
    fact_index: FxHashMap<StmtId, FxHashSet<F>>,

    /// (method, entry fact) -> exits reached
    end_summaries: FxHashMap<(MethodSignature, F), Vec<EndSummary<F>>>,

    /// (method, entry fact) -> caller contexts
    incoming: FxHashMap<(MethodSignature, F), Vec<IncomingCall<F>>>,

    worklist: VecDeque<PathEdge<F>>,
    stats: IFDSStatistics,
}

impl<'a, F, P, G> IFDSSolver<'a, F, P, G>
where
    F: DataflowFact,
    P: IFDSProblem<F>,
    G: InterproceduralCfg,
{
    pub fn new(problem: &'a mut P, icfg: &'a G) -> Self {
        Self::with_limits(problem, icfg, SolverLimits::default())
    }

    pub fn with_limits(problem: &'a mut P, icfg: &'a G, limits: SolverLimits) -> Self {
        Self {
            problem,
            icfg,
            limits,
            path_edges: FxHashSet::default(),
            facts_at: FxHashMap::default(),
            fact_index: FxHashMap::default(),
            end_summaries: FxHashMap::default(),
            incoming: FxHashMap::default(),
            worklist: VecDeque::new(),
            stats: IFDSStatistics::default(),
        }
    }

    /// Run to fixpoint or until a limit is hit
    pub fn solve(mut self) -> IFDSSolverResult<F> {
        let start_time = Instant::now();

        for (start, seed) in self.problem.initial_seeds() {
            self.propagate(PathEdge::new(seed.clone(), start, seed));
        }

        while let Some(edge) = self.worklist.pop_front() {
            if self.stats.num_iterations >= self.limits.max_iterations {
                self.stats.truncated = true;
                break;
            }
            self.stats.num_iterations += 1;
            self.process_path_edge(edge);
        }

        self.stats.num_path_edges = self.path_edges.len();
        self.stats.num_end_summaries = self.end_summaries.values().map(Vec::len).sum();
        self.stats.analysis_time_ms = start_time.elapsed().as_millis() as u64;

        if self.stats.truncated {
            tracing::debug!(
                iterations = self.stats.num_iterations,
                dropped = self.stats.num_dropped_facts,
                "IFDS run truncated"
            );
        }

        IFDSSolverResult {
            facts_at: self.facts_at,
            stats: self.stats,
        }
    }

    fn process_path_edge(&mut self, edge: PathEdge<F>) {
        let PathEdge {
            source_fact: d1,
            target_node: n,
            target_fact: d2,
        } = edge;

        if self.icfg.is_call(&n) {
            self.process_call(&d1, &n, &d2);
        } else if self.icfg.is_exit(&n) {
            self.process_exit(&d1, &n, &d2);
        } else {
            self.process_normal(&d1, &n, &d2);
        }
    }

    fn process_normal(&mut self, d1: &F, n: &StmtId, d2: &F) {
        for m in self.icfg.successors(n) {
            for d3 in self.problem.normal_flow(n, &m, d2) {
                self.propagate(PathEdge::new(d1.clone(), m.clone(), d3));
            }
        }
    }

    fn process_call(&mut self, d1: &F, call_site: &StmtId, d2: &F) {
        let return_sites = self.icfg.successors(call_site);
        let callees = self.icfg.callees_of(call_site).to_vec();

        for callee in &callees {
            for d3 in self.problem.call_flow(call_site, callee, d2) {
                for start in self.icfg.start_points(callee) {
                    self.propagate(PathEdge::new(d3.clone(), start, d3.clone()));
                }

                let key = (callee.clone(), d3);
                let context = IncomingCall {
                    call_site: call_site.clone(),
                    caller_source: d1.clone(),
                    caller_fact: d2.clone(),
                };
                let contexts = self.incoming.entry(key.clone()).or_default();
                if contexts.contains(&context) {
                    continue;
                }
                contexts.push(context);

                let summaries = self.end_summaries.get(&key).cloned().unwrap_or_default();
                for summary in summaries {
                    self.stats.num_summary_reuses += 1;
                    for return_site in &return_sites {
                        let facts = self.problem.return_flow(
                            call_site,
                            callee,
                            &summary.exit,
                            return_site,
                            d2,
                            &summary.exit_fact,
                        );
                        for d5 in facts {
                            self.propagate(PathEdge::new(d1.clone(), return_site.clone(), d5));
                        }
                    }
                }
            }
        }

        for return_site in &return_sites {
            for d3 in self.problem.call_to_return_flow(call_site, return_site, d2) {
                self.propagate(PathEdge::new(d1.clone(), return_site.clone(), d3));
            }
        }
    }

    fn process_exit(&mut self, d1: &F, exit: &StmtId, d2: &F) {
        let method = exit.method.clone();
        let key = (method.clone(), d1.clone());
        let summary = EndSummary {
            exit: exit.clone(),
            exit_fact: d2.clone(),
        };

        let summaries = self.end_summaries.entry(key.clone()).or_default();
        if summaries.contains(&summary) {
            return;
        }
        summaries.push(summary);

        let contexts = self.incoming.get(&key).cloned().unwrap_or_default();
        for context in contexts {
            for return_site in self.icfg.successors(&context.call_site) {
                let facts = self.problem.return_flow(
                    &context.call_site,
                    &method,
                    exit,
                    &return_site,
                    &context.caller_fact,
                    d2,
                );
                for d5 in facts {
                    self.propagate(PathEdge::new(
                        context.caller_source.clone(),
                        return_site.clone(),
                        d5,
                    ));
                }
            }
        }
    }

    /// Add path edge to worklist (if new and within the per-statement limit)
    fn propagate(&mut self, edge: PathEdge<F>) {
        if self.path_edges.contains(&edge) {
            return;
        }

        let known = self.fact_index.entry(edge.target_node.clone()).or_default();
        if !known.contains(&edge.target_fact) {
            if known.len() >= self.limits.max_facts_per_stmt {
                self.stats.num_dropped_facts += 1;
                self.stats.truncated = true;
                return;
            }
            known.insert(edge.target_fact.clone());
            self.facts_at
                .entry(edge.target_node.clone())
                .or_default()
                .push(edge.target_fact.clone());
        }

        self.path_edges.insert(edge.clone());
        self.worklist.push_back(edge);
    }
}

/// IFDS Solver Result
#[derive(Debug, Clone)]
pub struct IFDSSolverResult<F: DataflowFact> {
    facts_at: FxHashMap<StmtId, Vec<F>>,

    /// Statistics
    pub stats: IFDSStatistics,
}

impl<F: DataflowFact> IFDSSolverResult<F> {
    /// Facts holding before `stmt`, in discovery order
    pub fn results_at(&self, stmt: &StmtId) -> &[F] {
        self.facts_at.get(stmt).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Facts holding at the successors of `stmt`, deduplicated
    pub fn results_after<G: InterproceduralCfg>(&self, icfg: &G, stmt: &StmtId) -> Vec<F> {
        let mut seen = FxHashSet::default();
        let mut facts = Vec::new();
        for succ in icfg.successors(stmt) {
            for fact in self.results_at(&succ) {
                if seen.insert(fact.clone()) {
                    facts.push(fact.clone());
                }
            }
        }
        facts
    }

    pub fn is_reached(&self, stmt: &StmtId) -> bool {
        self.facts_at.contains_key(stmt)
    }

    pub fn statistics(&self) -> &IFDSStatistics {
        &self.stats
    }
}
