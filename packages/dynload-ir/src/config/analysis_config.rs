//! Analysis configuration
//!
//! `AnalysisConfig` bounds the resolution driver and the solver it runs.
//! Start from a preset, then override individual fields in code or YAML:
//!
//! ```yaml
//! version: 1
//! preset: thorough
//! overrides:
//!   outer_class_threading: false
//!   solver:
//!     max_iterations: 500000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::{check_range, Validatable};
use crate::shared::constants::{jvm, thread_pool};

/// Supported YAML schema version
pub const CONFIG_VERSION: u32 = 1;

/// Call shape the driver scans method bodies for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicLoadTarget {
    /// Declaring class of the loading method
    pub class: String,
    /// Method name
    pub method: String,
    /// Type of the first formal parameter
    pub first_param: String,
}

impl Default for DynamicLoadTarget {
    fn default() -> Self {
        Self {
            class: jvm::JAVA_UTIL_SERVICE_LOADER.to_string(),
            method: jvm::LOAD.to_string(),
            first_param: jvm::JAVA_LANG_CLASS.to_string(),
        }
    }
}

impl Validatable for DynamicLoadTarget {
    fn validate(&self) -> ConfigResult<()> {
        if self.class.is_empty() || self.method.is_empty() || self.first_param.is_empty() {
            return Err(ConfigError::Validation(
                "dynamic load target needs a class, a method and a first parameter type"
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "DynamicLoadTarget"
    }
}

/// Solver bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Worklist iterations per solver run (1..=10_000_000)
    pub max_iterations: usize,

    /// Distinct facts kept per statement (1..=100_000)
    pub max_facts_per_stmt: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl SolverConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                max_iterations: 10_000,
                max_facts_per_stmt: 64,
            },
            Preset::Balanced => Self {
                max_iterations: 200_000,
                max_facts_per_stmt: 512,
            },
            Preset::Thorough => Self {
                max_iterations: 2_000_000,
                max_facts_per_stmt: 4096,
            },
        }
    }
}

impl Validatable for SolverConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_range(
            "solver.max_iterations",
            self.max_iterations,
            1,
            10_000_000,
            "Solver iterations must be finite",
        )?;
        check_range(
            "solver.max_facts_per_stmt",
            self.max_facts_per_stmt,
            1,
            100_000,
            "Each statement needs room for at least one fact",
        )
    }

    fn config_name(&self) -> &'static str {
        "SolverConfig"
    }
}

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Caller chain depth explored by backtracking (1..=256)
    pub max_backtrack_depth: usize,

    /// Methods visited by one backtracking search (1..=100_000)
    pub max_visited_methods: usize,

    /// Retry unresolved calls from the callers of the enclosing method
    pub caller_backtracking: bool,

    /// Retry unresolved calls in inner classes from outer-class constructions
    pub outer_class_threading: bool,

    pub solver: SolverConfig,

    /// Analyze classes on the rayon pool
    pub parallel: bool,

    /// Worker threads, 0 = derive from the CPU count
    pub threads: usize,

    pub target: DynamicLoadTarget,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

impl AnalysisConfig {
    pub fn preset(preset: Preset) -> Self {
        let (max_backtrack_depth, max_visited_methods, full_escalation) = match preset {
            Preset::Fast => (1, 32, false),
            Preset::Balanced => (8, 512, true),
            Preset::Thorough => (32, 8192, true),
        };
        Self {
            max_backtrack_depth,
            max_visited_methods,
            caller_backtracking: full_escalation,
            outer_class_threading: full_escalation,
            solver: SolverConfig::from_preset(preset),
            parallel: cfg!(feature = "parallel"),
            threads: 0,
            target: DynamicLoadTarget::default(),
        }
    }

    /// Builder: set backtracking depth
    pub fn max_backtrack_depth(mut self, depth: usize) -> Self {
        self.max_backtrack_depth = depth;
        self
    }

    /// Builder: set visited-method bound
    pub fn max_visited_methods(mut self, count: usize) -> Self {
        self.max_visited_methods = count;
        self
    }

    /// Builder: toggle caller backtracking
    pub fn caller_backtracking(mut self, enabled: bool) -> Self {
        self.caller_backtracking = enabled;
        self
    }

    /// Builder: toggle outer-class threading
    pub fn outer_class_threading(mut self, enabled: bool) -> Self {
        self.outer_class_threading = enabled;
        self
    }

    /// Builder: toggle parallel batch analysis
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Builder: set solver bounds
    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Thread count for the batch pool
    pub fn effective_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        let cores = num_cpus::get() as f64 * thread_pool::CPU_UTILIZATION_PERCENT;
        (cores as usize).max(thread_pool::MIN_THREADS)
    }

    /// Load a versioned YAML file and validate the result
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;
        if file.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: file.version,
                supported: CONFIG_VERSION,
            });
        }

        let preset: Preset = file.preset.parse()?;
        let mut config = Self::preset(preset);
        if let Some(overrides) = file.overrides {
            overrides.apply(&mut config);
        }
        config.validate()?;
        Ok(config)
    }

    /// Serialize as a complete override set on top of the balanced preset
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: CONFIG_VERSION,
            preset: Preset::Balanced.to_string(),
            overrides: Some(AnalysisOverrides::from(self)),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    pub fn save_yaml(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

impl Validatable for AnalysisConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_range(
            "max_backtrack_depth",
            self.max_backtrack_depth,
            1,
            256,
            "Backtracking depth must be at least 1",
        )?;
        check_range(
            "max_visited_methods",
            self.max_visited_methods,
            1,
            100_000,
            "The visited-method bound guarantees termination on cyclic call graphs",
        )?;
        check_range("threads", self.threads, 0, 1024, "Use 0 for automatic sizing")?;
        self.solver.validate()?;
        self.target.validate()
    }

    fn config_name(&self) -> &'static str {
        "AnalysisConfig"
    }
}

/// YAML schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFileV1 {
    version: u32,

    #[serde(default = "default_preset_name")]
    preset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    overrides: Option<AnalysisOverrides>,
}

fn default_preset_name() -> String {
    Preset::default().to_string()
}

/// Field-level overrides; absent fields keep the preset value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalysisOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_backtrack_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_visited_methods: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caller_backtracking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outer_class_threading: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    solver: Option<SolverOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parallel: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threads: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<DynamicLoadTarget>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SolverOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_facts_per_stmt: Option<usize>,
}

impl AnalysisOverrides {
    fn apply(self, config: &mut AnalysisConfig) {
        if let Some(v) = self.max_backtrack_depth {
            config.max_backtrack_depth = v;
        }
        if let Some(v) = self.max_visited_methods {
            config.max_visited_methods = v;
        }
        if let Some(v) = self.caller_backtracking {
            config.caller_backtracking = v;
        }
        if let Some(v) = self.outer_class_threading {
            config.outer_class_threading = v;
        }
        if let Some(solver) = self.solver {
            if let Some(v) = solver.max_iterations {
                config.solver.max_iterations = v;
            }
            if let Some(v) = solver.max_facts_per_stmt {
                config.solver.max_facts_per_stmt = v;
            }
        }
        if let Some(v) = self.parallel {
            config.parallel = v;
        }
        if let Some(v) = self.threads {
            config.threads = v;
        }
        if let Some(v) = self.target {
            config.target = v;
        }
    }
}

impl From<&AnalysisConfig> for AnalysisOverrides {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            max_backtrack_depth: Some(config.max_backtrack_depth),
            max_visited_methods: Some(config.max_visited_methods),
            caller_backtracking: Some(config.caller_backtracking),
            outer_class_threading: Some(config.outer_class_threading),
            solver: Some(SolverOverrides {
                max_iterations: Some(config.solver.max_iterations),
                max_facts_per_stmt: Some(config.solver.max_facts_per_stmt),
            }),
            parallel: Some(config.parallel),
            threads: Some(config.threads),
            target: Some(config.target.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_presets_validate() {
        for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough] {
            assert!(AnalysisConfig::preset(preset).validate().is_ok(), "{}", preset);
        }
    }

    #[test]
    fn test_fast_preset_disables_escalation() {
        let config = AnalysisConfig::preset(Preset::Fast);
        assert!(!config.caller_backtracking);
        assert!(!config.outer_class_threading);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = AnalysisConfig::default().max_backtrack_depth(0);
        assert!(matches!(config.validate(), Err(ConfigError::Range { .. })));
    }

    #[test]
    fn test_yaml_overrides_apply_on_preset() {
        let yaml = r#"
version: 1
preset: thorough
overrides:
  outer_class_threading: false
  solver:
    max_iterations: 1234
"#;
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.outer_class_threading);
        assert!(config.caller_backtracking);
        assert_eq!(config.solver.max_iterations, 1234);
        assert_eq!(
            config.solver.max_facts_per_stmt,
            SolverConfig::from_preset(Preset::Thorough).max_facts_per_stmt
        );
        assert_eq!(config.max_backtrack_depth, 32);
    }

    #[test]
    fn test_yaml_rejects_unknown_field() {
        let yaml = "version: 1\noverrides:\n  max_depth: 3\n";
        assert!(matches!(
            AnalysisConfig::from_yaml_str(yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_yaml_rejects_future_version() {
        let yaml = "version: 2\n";
        assert!(matches!(
            AnalysisConfig::from_yaml_str(yaml),
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let config = AnalysisConfig::preset(Preset::Fast).parallel(false);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(config.to_yaml().unwrap().as_bytes()).unwrap();

        let loaded = AnalysisConfig::from_yaml(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_effective_threads_never_zero() {
        assert!(AnalysisConfig::default().effective_threads() >= 1);
        let pinned = AnalysisConfig {
            threads: 3,
            ..AnalysisConfig::default()
        };
        assert_eq!(pinned.effective_threads(), 3);
    }
}
