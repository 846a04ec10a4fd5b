//! Analysis configuration
//!
//! Two levels of control:
//! - Preset (`fast`, `balanced`, `thorough`)
//! - Field overrides, in code through the builder methods or in a versioned YAML file
//!
//! ```rust,ignore
//! use dynload_ir::config::{AnalysisConfig, Preset};
//!
//! let config = AnalysisConfig::preset(Preset::Thorough).outer_class_threading(false);
//! let config = AnalysisConfig::from_yaml("dynload.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod preset;
pub mod validation;

pub use analysis_config::{AnalysisConfig, DynamicLoadTarget, SolverConfig, CONFIG_VERSION};
pub use error::{ConfigError, ConfigResult};
pub use preset::Preset;
pub use validation::Validatable;
