//! IFDS framework and tabulation solver

pub mod ifds_framework;
pub mod ifds_solver;

pub use ifds_framework::{
    DataflowFact, EndSummary, IFDSProblem, IFDSStatistics, IncomingCall, InterproceduralCfg,
    PathEdge,
};
pub use ifds_solver::{IFDSSolver, IFDSSolverResult, SolverLimits};
