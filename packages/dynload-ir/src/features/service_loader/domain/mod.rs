//! Service-loader domain: value lattice, locations, facts, call model and results

pub mod analysis;
pub mod holder;
pub mod load_call;
pub mod value;
pub mod value_map;

pub use analysis::{ClassAnalysis, Diagnostic, MethodResolution, ResolutionCounters};
pub use holder::ValueHolder;
pub use load_call::{CallArgument, DynamicLoadCall, EntryMethodWithCall, LoadCallMatcher};
pub use value::{class_name, AbstractValue};
pub use value_map::ValueMap;
