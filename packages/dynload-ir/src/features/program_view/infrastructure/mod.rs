//! Program view infrastructure

pub mod call_graph;
pub mod class_pool;
pub mod icfg;
pub mod view;

pub use call_graph::{CallGraphProvider, ClassCallGraph};
pub use class_pool::{ClassPool, JsonFrontend};
pub use icfg::Icfg;
pub use view::ProgramView;
