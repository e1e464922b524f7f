//! Upgrade plan loading and validation.
//!
//! A plan is a TOML file describing an owner, the modules to deploy (by name
//! and function signatures) and an ordered list of upgrade steps. Plans are
//! consumed by `diamond simulate`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::CutAction;
use crate::types::Address;

/// Top-level plan file.
#[derive(Debug, Deserialize)]
pub struct PlanConfig {
    /// Proxy construction settings.
    pub diamond: DiamondSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Modules to deploy before the steps run.
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,

    /// Upgrade steps, each one atomic transaction.
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// Proxy construction settings.
#[derive(Debug, Deserialize)]
pub struct DiamondSection {
    /// Initial owner.
    pub owner: Address,

    /// Run the standard initializer (ERC-165 registration) at construction.
    #[serde(default = "default_standard_init")]
    pub standard_init: bool,
}

/// Logging settings.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A module declared by name and signatures.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSpec {
    /// Unique module name, referenced by cuts.
    pub name: String,
    /// Canonical function signatures.
    pub functions: Vec<String>,
}

/// One transaction in a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct StepSpec {
    /// Free-form label for the report.
    #[serde(default)]
    pub label: Option<String>,

    /// Caller; defaults to the current owner.
    #[serde(default)]
    pub caller: Option<Address>,

    /// What the step does.
    #[serde(flatten)]
    pub kind: StepKind,
}

/// Step payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// Apply a cut batch.
    Cut {
        /// Cuts in order.
        cuts: Vec<CutSpec>,
        /// Optional init call.
        #[serde(default)]
        init: Option<InitSpec>,
    },
    /// Transfer ownership.
    TransferOwnership {
        /// New owner.
        new_owner: Address,
    },
    /// Call a function through the dynamic path.
    Call {
        /// Canonical signature of the function to call.
        function: String,
        /// JSON arguments; omitted for bare calls.
        #[serde(default)]
        args: Option<serde_json::Value>,
    },
}

/// One cut in a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CutSpec {
    /// `add`, `replace` or `remove`.
    pub action: CutAction,
    /// Module name; omitted for `remove`.
    #[serde(default)]
    pub module: Option<String>,
    /// Signatures to cut; defaults to every function of the module.
    #[serde(default)]
    pub functions: Option<Vec<String>>,
}

/// Init call in a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct InitSpec {
    /// Module name to call.
    pub module: String,
    /// Signature of the initializer function.
    pub function: String,
}

fn default_standard_init() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_owned()
}

/// Load a plan from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_plan(path: &Path) -> anyhow::Result<PlanConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read plan at {}: {e}", path.display()))?;
    parse_plan(&contents)
        .map_err(|e| anyhow::anyhow!("invalid plan at {}: {e}", path.display()))
}

/// Parse and validate a plan from TOML text.
///
/// # Errors
///
/// Returns an error on TOML syntax errors, duplicate module names, or cuts
/// naming undeclared modules.
pub fn parse_plan(contents: &str) -> anyhow::Result<PlanConfig> {
    let plan: PlanConfig = toml::from_str(contents)?;
    plan.validate()?;
    Ok(plan)
}

impl PlanConfig {
    /// Look up a declared module.
    pub fn module(&self, name: &str) -> Option<&ModuleSpec> {
        self.modules.iter().find(|m| m.name == name)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (i, module) in self.modules.iter().enumerate() {
            if self.modules.iter().skip(i.saturating_add(1)).any(|m| m.name == module.name) {
                anyhow::bail!("module {:?} declared twice", module.name);
            }
        }
        for (index, step) in self.steps.iter().enumerate() {
            let StepKind::Cut { cuts, init } = &step.kind else {
                continue;
            };
            for cut in cuts {
                if let Some(name) = &cut.module {
                    if self.module(name).is_none() {
                        anyhow::bail!("step {index} cuts undeclared module {name:?}");
                    }
                }
            }
            if let Some(init) = init {
                if self.module(&init.module).is_none() {
                    anyhow::bail!("step {index} initializes undeclared module {:?}", init.module);
                }
            }
        }
        Ok(())
    }
}

/// File name of the plan used when none is given on the command line.
pub const DEFAULT_PLAN_FILE: &str = "plan.toml";

/// Resolve the default plan path (`~/.diamond/plan.toml`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_plan_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join(DEFAULT_PLAN_FILE))
}

/// Resolve the default config directory (`~/.diamond/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".diamond"))
}
