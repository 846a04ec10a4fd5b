//! Service-loader infrastructure: transfer function, IFDS problem, solver runs

pub mod problem;
pub mod runner;
pub mod transfer;

pub use problem::{opaque_invokes, ConstPropProblem, RunContext};
pub use runner::{CallOutcome, SolverRun};
pub use transfer::{InvokeEffect, RecognizedOp, StatementVisitor};
