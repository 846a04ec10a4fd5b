// Program view: the boundary to class loading and call resolution
//
// - ports: ClassFrontend (bytes → IR), ProgramProvider (class set → views)
// - infrastructure: class pool, scoped views, ICFG, CHA call graph

pub mod errors;
pub mod infrastructure;
pub mod ports;

pub use errors::{ViewError, ViewResult};
pub use infrastructure::{
    CallGraphProvider, ClassCallGraph, ClassPool, Icfg, JsonFrontend, ProgramView,
};
pub use ports::{ClassFrontend, ProgramProvider};
