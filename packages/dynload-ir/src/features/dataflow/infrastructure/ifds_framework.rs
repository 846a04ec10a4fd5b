/*
 * IFDS Framework (Interprocedural Finite Distributive Subset Problems)
 *
 * Key Features:
 * - Problem definition with the four classic flow functions
 * - Interprocedural CFG abstraction over stable statement ids
 * - Path edges and end summaries for the tabulation solver
 *
 * Facts are arbitrary `Eq + Hash` values. Flow functions return the facts
 * holding after an edge for one incoming fact; a flow function that
 * returns nothing kills the fact on that edge.
 *
 * References:
 * - Reps, Horwitz, Sagiv (1995): "Precise Interprocedural Dataflow Analysis via Graph Reachability"
 * - Naeem, Lhoták, Rodriguez (2010): "Practical Extensions to the IFDS Algorithm"
 * - Bodden et al. (2012): "Inter-procedural Data-flow Analysis with IFDS/IDE and Soot"
 */

use std::fmt::Debug;
use std::hash::Hash;

use crate::shared::models::{MethodSignature, StmtId};

/// Dataflow fact (abstract domain element)
pub trait DataflowFact: Clone + Eq + Hash + Debug {
    /// Check if this is the ZERO fact (no information)
    fn is_zero(&self) -> bool;

    /// Create the ZERO fact
    fn zero() -> Self;
}

/// Interprocedural control flow graph consumed by the solver
pub trait InterproceduralCfg {
    /// Intraprocedural successors of a statement
    fn successors(&self, stmt: &StmtId) -> Vec<StmtId>;

    /// Methods stepped into at a call site; empty for opaque calls
    fn callees_of(&self, call_site: &StmtId) -> &[MethodSignature];

    /// Call sites in the graph that step into `method`
    fn callers_of(&self, method: &MethodSignature) -> Vec<StmtId>;

    /// Entry statements of a method
    fn start_points(&self, method: &MethodSignature) -> Vec<StmtId>;

    /// Whether the statement leaves its method normally
    fn is_exit(&self, stmt: &StmtId) -> bool;

    /// Whether the statement contains an invoke, stepped into or not
    fn is_call(&self, stmt: &StmtId) -> bool;
}

/// Path edge: (d1, n, d2)
///
/// Fact d2 holds at n when d1 held at the entry of n's method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathEdge<F: DataflowFact> {
    /// Source fact (at procedure entry)
    pub source_fact: F,

    /// Target statement
    pub target_node: StmtId,

    /// Target fact (at target_node)
    pub target_fact: F,
}

impl<F: DataflowFact> PathEdge<F> {
    pub fn new(source_fact: F, target_node: StmtId, target_fact: F) -> Self {
        Self {
            source_fact,
            target_node,
            target_fact,
        }
    }
}

/// End summary: entering a method with `entry_fact` reaches `exit` with `exit_fact`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndSummary<F: DataflowFact> {
    pub exit: StmtId,
    pub exit_fact: F,
}

/// Caller context recorded when a fact enters a callee
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncomingCall<F: DataflowFact> {
    pub call_site: StmtId,
    /// Source fact of the caller's path edge
    pub caller_source: F,
    /// Fact at the call site
    pub caller_fact: F,
}

/// IFDS problem definition
///
/// Flow functions take `&mut self` so a problem can accumulate per-run
/// state while the solver explores the graph.
pub trait IFDSProblem<F: DataflowFact> {
    /// Entry statements paired with their initial facts
    fn initial_seeds(&mut self) -> Vec<(StmtId, F)>;

    /// Intraprocedural edge `curr → succ`
    fn normal_flow(&mut self, curr: &StmtId, succ: &StmtId, fact: &F) -> Vec<F>;

    /// Call site into the entry of `callee`
    fn call_flow(&mut self, call_site: &StmtId, callee: &MethodSignature, fact: &F) -> Vec<F>;

    /// Exit of `callee` back to `return_site`
    ///
    /// `caller_fact` is the fact that held at the call site for the caller
    /// context being completed; `exit_fact` holds at `exit`.
    fn return_flow(
        &mut self,
        call_site: &StmtId,
        callee: &MethodSignature,
        exit: &StmtId,
        return_site: &StmtId,
        caller_fact: &F,
        exit_fact: &F,
    ) -> Vec<F>;

    /// Call site to return site, bypassing the callee
    fn call_to_return_flow(&mut self, call_site: &StmtId, return_site: &StmtId, fact: &F)
        -> Vec<F>;
}

/// IFDS analysis statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IFDSStatistics {
    /// Number of path edges computed
    pub num_path_edges: usize,

    /// Number of end summaries computed
    pub num_end_summaries: usize,

    /// Number of end summaries applied at a new call context
    pub num_summary_reuses: usize,

    /// Number of worklist iterations
    pub num_iterations: usize,

    /// Facts dropped because a statement reached its fact limit
    pub num_dropped_facts: usize,

    /// Run stopped early on a limit
    pub truncated: bool,

    /// Analysis time (milliseconds)
    pub analysis_time_ms: u64,
}
