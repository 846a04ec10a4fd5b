//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains (as needed):
//! - domain/     - Pure analysis logic
//! - ports/      - Interface definitions (traits)
//! - application/ - Use cases
//! - infrastructure/ - Implementations

pub mod dataflow;
pub mod program_view;
pub mod service_loader;
