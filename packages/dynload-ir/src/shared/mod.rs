//! Shared infrastructure used by every feature

pub mod constants;
pub mod models;
