//! Common test utilities for dynload-ir integration tests

#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
