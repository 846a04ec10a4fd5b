// Generic interprocedural dataflow solver
//
// Problem-agnostic: the constant propagation lives in `service_loader`,
// this module only knows facts, flow functions and the ICFG.

pub mod infrastructure;

pub use infrastructure::*;
